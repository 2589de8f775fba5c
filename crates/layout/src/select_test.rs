use crate::drawable::{Drawable, Handle};
use crate::select::{Corner, Picker};
use crate::table::Table;
use crate::test_utils::{create_test_tree, TestHarness};
use crate::tree::{DrawableId, LayoutTree};
use folio_render_core::SelectionCategory;
use folio_style::Attribute;
use folio_types::{Color, Rect, Size};

/// Adds a layout that translates its content to `(x, y, z)`.
fn placed(tree: &mut LayoutTree, x: f32, y: f32, z: f32) -> DrawableId {
    let root = tree.root();
    let layout = tree.add_layout(root).unwrap();
    tree.add(layout, Drawable::Attribute(Attribute::Translate { x, y, z }))
        .unwrap();
    layout
}

#[test]
fn test_handle_wins_over_shape_it_sits_on() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let back = placed(&mut tree, 0.0, 0.0, 0.5);
    let square = tree.add(back, Drawable::rect(100.0, 100.0)).unwrap();
    let front = placed(&mut tree, 25.0, 25.0, 0.2);
    let handle = tree
        .add(
            front,
            Drawable::Handle(Handle {
                size: Size::new(50.0, 50.0),
                target: Some(square),
            }),
        )
        .unwrap();

    let picked = tree.pick_point(&mut h.render(), 50.0, 50.0, 1.0).unwrap().unwrap();

    assert_eq!(picked.drawable, handle);
    assert_eq!(picked.category, SelectionCategory::Handle);
    assert!((picked.depth - 0.2).abs() < 1e-6);

    let edge = tree.pick_point(&mut h.render(), 5.0, 5.0, 1.0).unwrap().unwrap();
    assert_eq!(edge.drawable, square);
}

#[test]
fn test_handle_wins_even_when_behind() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let back = placed(&mut tree, 0.0, 0.0, 0.9);
    let handle = tree
        .add(
            back,
            Drawable::Handle(Handle {
                size: Size::new(20.0, 20.0),
                target: None,
            }),
        )
        .unwrap();
    let front = placed(&mut tree, 0.0, 0.0, 0.1);
    tree.add(front, Drawable::rect(50.0, 50.0)).unwrap();

    let picked = tree.pick_point(&mut h.render(), 10.0, 10.0, 0.5).unwrap().unwrap();

    assert_eq!(picked.drawable, handle);
}

#[test]
fn test_nearest_shape_wins() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let near = placed(&mut tree, 0.0, 0.0, 0.1);
    let near_rect = tree.add(near, Drawable::rect(50.0, 50.0)).unwrap();
    let far = placed(&mut tree, 0.0, 0.0, 0.6);
    tree.add(far, Drawable::rect(50.0, 50.0)).unwrap();

    let picked = tree.pick_point(&mut h.render(), 20.0, 20.0, 1.0).unwrap().unwrap();

    assert_eq!(picked.drawable, near_rect);
    assert_eq!(picked.container, Some(near));
}

#[test]
fn test_miss_returns_nothing() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(root, Drawable::rect(10.0, 10.0)).unwrap();

    assert!(tree.pick_point(&mut h.render(), 300.0, 300.0, 1.0).unwrap().is_none());
}

#[test]
fn test_text_pick_resolves_character() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    let text = tree.add(root, Drawable::text("abc")).unwrap();

    // Glyphs are 6 wide at the default size.
    let picked = tree.pick_point(&mut h.render(), 8.0, 5.0, 0.5).unwrap().unwrap();

    assert_eq!(picked.drawable, text);
    assert_eq!(picked.category, SelectionCategory::Character);
    assert_eq!(picked.char_index, Some(1));
}

#[test]
fn test_text_pick_without_character_ids() {
    let mut h = TestHarness::new();
    let mut tree = LayoutTree::new(crate::config::LayoutConfig {
        identify_characters: false,
        ..Default::default()
    });
    let root = tree.root();
    let text = tree.add(root, Drawable::text("abc")).unwrap();

    let picked = tree.pick_point(&mut h.render(), 8.0, 5.0, 0.5).unwrap().unwrap();

    assert_eq!(picked.drawable, text);
    assert_eq!(picked.category, SelectionCategory::Plain);
    assert_eq!(picked.char_index, None);
}

#[test]
fn test_selected_drawable_gets_corner_handles() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    let rect = tree.add(root, Drawable::rect(40.0, 40.0)).unwrap();
    h.display.selection.insert(tree.key(rect).unwrap());

    // The highlight sits 2 units outside the bounds.
    let corner = tree.pick_point(&mut h.render(), -2.0, 42.0, 0.5).unwrap().unwrap();
    assert_eq!(corner.drawable, rect);
    assert_eq!(corner.category, SelectionCategory::Handle);
    assert_eq!(corner.corner, Some(Corner::BottomLeft));

    let inside = tree.pick_point(&mut h.render(), 20.0, 20.0, 0.5).unwrap().unwrap();
    assert_eq!(inside.category, SelectionCategory::Plain);
    assert_eq!(inside.corner, None);
}

#[test]
fn test_unselected_drawable_has_no_corner_handles() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.add(root, Drawable::rect(40.0, 40.0)).unwrap();

    assert!(tree.pick_point(&mut h.render(), -2.0, 42.0, 0.5).unwrap().is_none());
}

#[test]
fn test_rect_pick_lists_each_drawable_once() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    let a = tree.add(root, Drawable::rect(10.0, 10.0)).unwrap();
    let b_layout = placed(&mut tree, 20.0, 0.0, 0.0);
    let b = tree.add(b_layout, Drawable::text("xy")).unwrap();
    let c_layout = placed(&mut tree, 60.0, 0.0, 0.0);
    tree.add(c_layout, Drawable::rect(10.0, 10.0)).unwrap();

    let picked = tree.pick_rect(&mut h.render(), Rect::new(0.0, 0.0, 35.0, 10.0)).unwrap();

    let mut drawables: Vec<DrawableId> = picked.iter().map(|p| p.drawable).collect();
    drawables.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(drawables, expected);
}

#[test]
fn test_table_decorations_never_steal_cell_pick() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    let table = tree
        .add(root, Table::new(1, 1).with_fill(Color::WHITE).with_border(Color::BLACK, 1.0).into())
        .unwrap();
    let cell = tree.add_cell(table, Drawable::rect(30.0, 30.0)).unwrap();

    let picked = tree.pick_point(&mut h.render(), 15.0, 15.0, 0.5).unwrap().unwrap();
    assert_eq!(picked.drawable, cell);
    assert_ne!(picked.category, SelectionCategory::Container);

    let (map, hits) = tree.identify(&mut h.render(), Rect::centered(15.0, 15.0, 1.0, 1.0)).unwrap();
    let picker = Picker::new(&map);
    let candidates = picker.candidates(&hits);
    assert_eq!(candidates.len(), 1);
    assert_eq!(picker.container_of(&tree, &candidates[0]), Some(table));
}

#[test]
fn test_container_falls_back_to_enclosing_layout() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let group = placed(&mut tree, 0.0, 0.0, 0.0);
    let rect = tree.add(group, Drawable::rect(10.0, 10.0)).unwrap();

    let (map, hits) = tree.identify(&mut h.render(), Rect::centered(5.0, 5.0, 1.0, 1.0)).unwrap();
    let picker = Picker::new(&map);
    let mut result = picker.pick(&hits).unwrap();
    assert_eq!(result.drawable, rect);
    result.container = None;

    assert_eq!(picker.container_of(&tree, &result), Some(group));
}

#[test]
fn test_children_selected_looks_through_nesting() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    let outer = tree.add_layout(root).unwrap();
    let inner = tree.add_layout(outer).unwrap();
    let rect = tree.add(inner, Drawable::rect(5.0, 5.0)).unwrap();
    let other = tree.add(outer, Drawable::rect(5.0, 5.0)).unwrap();
    let sibling = tree.add_layout(root).unwrap();
    h.display.selection.insert(tree.key(rect).unwrap());
    h.display.selection.insert(tree.key(other).unwrap());

    assert_eq!(tree.children_selected(outer, &h.display).unwrap(), 2);
    assert_eq!(tree.children_selected(inner, &h.display).unwrap(), 1);
    assert_eq!(tree.children_selected(sibling, &h.display).unwrap(), 0);
    assert_eq!(tree.selected(rect, &h.display).unwrap(), 1);
    assert_eq!(tree.selected(inner, &h.display).unwrap(), 0);
}
