use crate::drawable::{Drawable, Extension, Image};
use crate::page::PageLayout;
use crate::test_utils::{create_test_tree, TestHarness};
use crate::LayoutError;
use folio_render_core::{DrawCommand, GraphicsBackend, Mesh, StateChange};
use folio_style::{Attribute, Justification, LayoutState};
use folio_traits::{FixedAdvanceMetrics, ResourceState};
use folio_types::{Box3, Color, Point, Rect, ResourceUri, Size, TextureId};

/// Fill color bound at the moment of each submission.
fn fills_per_submit(commands: &[DrawCommand]) -> Vec<Color> {
    let mut current = None;
    let mut out = Vec::new();
    for command in commands {
        match command {
            DrawCommand::Bind(StateChange::Fill(c)) => current = Some(*c),
            DrawCommand::Submit { .. } => out.extend(current),
            DrawCommand::Bind(_) => {}
        }
    }
    out
}

fn submitted_bounds(commands: &[DrawCommand]) -> Vec<Box3> {
    commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Submit { bounds, .. } => Some(*bounds),
            DrawCommand::Bind(_) => None,
        })
        .collect()
}

#[derive(Debug)]
struct Broken;

impl Extension for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn bounds(&self, _state: &LayoutState) -> Result<Box3, LayoutError> {
        Ok(Box3::new(Point::ORIGIN, Point::flat(10.0, 10.0)))
    }

    fn draw(&self, _state: &LayoutState, _out: &mut Vec<Mesh>) -> Result<(), LayoutError> {
        Err(LayoutError::Extension {
            name: "broken".into(),
            message: "no geometry".into(),
        })
    }
}

#[derive(Debug)]
struct Triangle;

impl Extension for Triangle {
    fn name(&self) -> &str {
        "triangle"
    }

    fn bounds(&self, _state: &LayoutState) -> Result<Box3, LayoutError> {
        Ok(Box3::new(Point::ORIGIN, Point::flat(8.0, 8.0)))
    }

    fn draw(&self, _state: &LayoutState, out: &mut Vec<Mesh>) -> Result<(), LayoutError> {
        out.push(Mesh::fan(&[Point::ORIGIN, Point::flat(8.0, 0.0), Point::flat(0.0, 8.0)]));
        Ok(())
    }
}

/// Draws one good quad, then a mesh whose indices point past its vertices.
#[derive(Debug)]
struct HalfDrawn;

impl Extension for HalfDrawn {
    fn name(&self) -> &str {
        "half-drawn"
    }

    fn bounds(&self, _state: &LayoutState) -> Result<Box3, LayoutError> {
        Ok(Box3::new(Point::ORIGIN, Point::flat(100.0, 100.0)))
    }

    fn draw(&self, _state: &LayoutState, out: &mut Vec<Mesh>) -> Result<(), LayoutError> {
        out.push(Mesh::quad(Rect::new(0.0, 0.0, 100.0, 100.0), 0.0));
        out.push(Mesh {
            vertices: Vec::new(),
            indices: vec![0, 1, 2],
        });
        Ok(())
    }
}

#[test]
fn test_attributes_scope_to_enclosing_layout() {
    let red = Color::rgba(255, 0, 0, 1.0);
    let blue = Color::rgba(0, 0, 255, 1.0);
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(root, Drawable::rect(10.0, 10.0)).unwrap();
    tree.add(root, Drawable::Attribute(Attribute::FillColor { color: red })).unwrap();
    tree.add(root, Drawable::rect(10.0, 10.0)).unwrap();
    let inner = tree.add_layout(root).unwrap();
    tree.add(inner, Drawable::Attribute(Attribute::FillColor { color: blue })).unwrap();
    tree.add(inner, Drawable::rect(10.0, 10.0)).unwrap();
    tree.add(root, Drawable::rect(10.0, 10.0)).unwrap();

    let stats = tree.draw(&mut h.render()).unwrap();

    assert_eq!(stats.submitted, 4);
    assert_eq!(stats.faults, 0);
    assert_eq!(fills_per_submit(h.backend.commands()), vec![Color::BLACK, red, blue, red]);
}

#[test]
fn test_translate_moves_following_siblings() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(root, Drawable::Attribute(Attribute::Translate { x: 20.0, y: 5.0, z: 0.0 }))
        .unwrap();
    tree.add(root, Drawable::rect(10.0, 10.0)).unwrap();

    tree.draw(&mut h.render()).unwrap();

    let bounds = submitted_bounds(h.backend.commands());
    assert_eq!(bounds[0].lower, Point::flat(20.0, 5.0));
    assert_eq!(bounds[0].upper, Point::flat(30.0, 15.0));
}

#[test]
fn test_page_items_draw_at_justified_positions() {
    let mut h = TestHarness::with_metrics(FixedAdvanceMetrics::new(0.5, 1.25));
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(
        root,
        Drawable::Attribute(Attribute::JustifyX {
            justification: Justification::justified(),
        }),
    )
    .unwrap();
    let page = tree
        .add(root, Drawable::Page(PageLayout::new(Size::new(400.0, 1000.0))))
        .unwrap();
    for w in [120.0, 90.0, 95.0, 60.0] {
        tree.add(page, Drawable::rect(w, 10.0)).unwrap();
        tree.paginate_text(page, " ").unwrap();
    }

    let stats = tree.draw(&mut h.render()).unwrap();

    assert_eq!(stats.submitted, 4);
    let bounds = submitted_bounds(h.backend.commands());
    assert_eq!(bounds[0].lower.x, 0.0);
    assert_eq!(bounds[2].lower.x, 305.0);
    assert_eq!(bounds[2].upper.x, 400.0);
    assert!(bounds[3].lower.y > bounds[0].lower.y);
}

#[test]
fn test_failing_drawable_is_skipped() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(root, Drawable::rect(10.0, 10.0)).unwrap();
    tree.add(root, Drawable::Custom(Box::new(Broken))).unwrap();
    tree.add(root, Drawable::Custom(Box::new(Triangle))).unwrap();

    let stats = tree.draw(&mut h.render()).unwrap();

    assert_eq!(stats.faults, 1);
    assert_eq!(stats.submitted, 2);
    assert_eq!(h.backend.submitted_triangles(), 3);
}

#[test]
fn test_failing_drawable_leaves_no_partial_output() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(root, Drawable::Custom(Box::new(HalfDrawn))).unwrap();
    tree.add(root, Drawable::Attribute(Attribute::Translate { x: 500.0, y: 500.0, z: 0.0 }))
        .unwrap();
    let rect = tree.add(root, Drawable::rect(10.0, 10.0)).unwrap();

    let stats = tree.draw(&mut h.render()).unwrap();

    assert_eq!(stats.faults, 1);
    assert_eq!(stats.submitted, 1);
    let bounds = submitted_bounds(h.backend.commands());
    assert_eq!(bounds.len(), 1);
    assert_eq!(bounds[0].lower, Point::flat(500.0, 500.0));

    assert!(tree.pick_point(&mut h.render(), 50.0, 50.0, 1.0).unwrap().is_none());
    let far = tree.pick_point(&mut h.render(), 505.0, 505.0, 1.0).unwrap().unwrap();
    assert_eq!(far.drawable, rect);
}

#[test]
fn test_failing_drawable_leaves_no_identify_ids() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(root, Drawable::Custom(Box::new(Broken))).unwrap();
    let rect = tree.add(root, Drawable::rect(10.0, 10.0)).unwrap();

    let (map, hits) = tree.identify(&mut h.render(), Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();

    assert_eq!(map.len(), 1);
    assert_eq!(map.iter().next().unwrap().1.drawable, rect);
    assert_eq!(hits.len(), 1);
}

#[test]
fn test_identify_tags_every_leaf_without_visible_output() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(root, Drawable::rect(40.0, 20.0)).unwrap();
    tree.add(root, Drawable::Attribute(Attribute::Translate { x: 50.0, y: 0.0, z: 0.0 }))
        .unwrap();
    tree.add(root, Drawable::rect(40.0, 20.0)).unwrap();

    let (map, hits) = tree.identify(&mut h.render(), Rect::new(0.0, 0.0, 100.0, 20.0)).unwrap();

    assert_eq!(map.len(), 2);
    assert_eq!(hits.len(), 2);
    assert!(h.backend.commands().is_empty());
    assert!(!h.backend.mode().is_identify());
}

#[test]
fn test_pending_image_draws_placeholder() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(
        root,
        Drawable::Image(Image {
            uri: ResourceUri::from("photo.png"),
            size: Size::new(16.0, 9.0),
        }),
    )
    .unwrap();

    tree.draw(&mut h.render()).unwrap();

    assert_eq!(fills_per_submit(h.backend.commands()), vec![Color::gray(200)]);
    assert!(!h
        .backend
        .commands()
        .iter()
        .any(|c| matches!(c, DrawCommand::Bind(StateChange::Texture(Some(_))))));
}

#[test]
fn test_ready_image_binds_texture() {
    let mut h = TestHarness::new();
    h.textures.insert(
        "photo.png",
        ResourceState::Ready {
            texture: TextureId(7),
            size: Size::new(16.0, 9.0),
        },
    );
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(
        root,
        Drawable::Image(Image {
            uri: ResourceUri::from("photo.png"),
            size: Size::new(16.0, 9.0),
        }),
    )
    .unwrap();

    tree.draw(&mut h.render()).unwrap();

    assert!(h
        .backend
        .commands()
        .contains(&DrawCommand::Bind(StateChange::Texture(Some(TextureId(7))))));
    assert_eq!(fills_per_submit(h.backend.commands()), vec![Color::WHITE]);
}

#[test]
fn test_selection_pass_draws_highlight_and_corners() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    let selected = tree.add(root, Drawable::rect(30.0, 30.0)).unwrap();
    tree.add(root, Drawable::rect(30.0, 30.0)).unwrap();
    h.display.selection.insert(tree.key(selected).unwrap());

    let stats = tree.draw_selection(&mut h.render()).unwrap();

    assert_eq!(stats.submitted, 5);
    assert!(h
        .backend
        .commands()
        .contains(&DrawCommand::Bind(StateChange::Fill(Color::SELECTION))));
    let corners = submitted_bounds(h.backend.commands());
    // Highlight is inflated by 2 on every side; corner handles are 6 wide.
    assert_eq!(corners[1].lower.x, -2.0 - 3.0);
    assert_eq!(corners[3].upper.x, 32.0 + 3.0);
}

#[test]
fn test_selection_pass_is_empty_without_selection() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(root, Drawable::rect(30.0, 30.0)).unwrap();

    let stats = tree.draw_selection(&mut h.render()).unwrap();

    assert_eq!(stats.submitted, 0);
    assert!(h.backend.commands().is_empty());
}

#[test]
fn test_page_attributes_carry_onto_successor_pages() {
    let red = Color::rgba(255, 0, 0, 1.0);
    let mut h = TestHarness::with_metrics(FixedAdvanceMetrics::new(0.5, 1.25));
    let mut tree = create_test_tree();
    let root = tree.root();
    let page = tree
        .add(root, Drawable::Page(PageLayout::new(Size::new(100.0, 30.0))))
        .unwrap();
    tree.add(page, Drawable::Attribute(Attribute::FillColor { color: red })).unwrap();
    for _ in 0..6 {
        tree.add(page, Drawable::rect(80.0, 10.0)).unwrap();
        tree.paginate_text(page, " ").unwrap();
    }

    tree.draw(&mut h.render()).unwrap();

    assert!(tree.page_chain(page).len() > 1);
    let fills = fills_per_submit(h.backend.commands());
    assert_eq!(fills.len(), 6);
    assert!(fills.iter().all(|c| *c == red));
}
