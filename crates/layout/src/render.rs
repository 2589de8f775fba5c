//! Draw, selection and identify traversals.
//!
//! All three passes walk the evaluated tree in document order with the same
//! running-state discipline: attributes mutate a copy of the state that is
//! dropped when the enclosing layout ends. Identify additionally tags every
//! leaf with a fresh selection id and never binds purely visual state.
//!
//! A drawable that fails to draw is logged and skipped together with its
//! subtree; ids handed out inside it are forgotten. Backend calls are staged
//! and only reach the backend once the pass is complete, so a drawable that
//! fails halfway leaves no output behind. Nothing a single drawable does can
//! abort a pass.

use crate::context::RenderContext;
use crate::drawable::{Drawable, Extension, Handle, Image};
use crate::measure;
use crate::page::PageLayout;
use crate::perf;
use crate::select::{Corner, IdentifyEntry, IdentifyMap, PickResult, Picker};
use crate::shape::Shape;
use crate::table::Table;
use crate::text::TextSpan;
use crate::tree::{DrawableId, LayoutTree};
use crate::LayoutError;
use folio_render_core::{HitRecord, Mesh, RenderMode, SelectionCategory, SelectionId, StateChange};
use folio_style::{LayoutState, PaintModel};
use folio_traits::ResourceState;
use folio_types::{Color, NodeKey, Point, Rect};

/// Placeholder color for pictures that are not decoded yet.
const PLACEHOLDER_GRAY: u8 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Visible output.
    Draw,
    /// Highlights and corner handles around selected drawables only.
    Selection,
    /// Id-tagged coverage for picking.
    Identify,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub visited: usize,
    pub submitted: usize,
    /// Drawables that failed and were skipped.
    pub faults: usize,
}

/// A backend call waiting for the pass to finish.
enum Staged {
    Bind(StateChange),
    Identity(SelectionId),
    Submit(Mesh),
}

struct Walker<'w, 'a> {
    tree: &'w LayoutTree,
    cx: &'w mut RenderContext<'a>,
    pass: Pass,
    map: IdentifyMap,
    /// Nearest enclosing layout or table.
    container: Option<DrawableId>,
    /// Table fills and borders are tagged as container hits.
    decorating: bool,
    bound: Option<PaintModel>,
    staged: Vec<Staged>,
    stats: RenderStats,
}

impl<'w, 'a> Walker<'w, 'a> {
    fn new(tree: &'w LayoutTree, cx: &'w mut RenderContext<'a>, pass: Pass) -> Self {
        Self {
            tree,
            cx,
            pass,
            map: IdentifyMap::new(),
            container: None,
            decorating: false,
            bound: None,
            staged: Vec::new(),
            stats: RenderStats::default(),
        }
    }

    fn run(mut self) -> (RenderStats, IdentifyMap) {
        let root = self.tree.root();
        self.visit(root, &LayoutState::default());
        self.flush();
        (self.stats, self.map)
    }

    fn flush(&mut self) {
        for staged in std::mem::take(&mut self.staged) {
            match staged {
                Staged::Bind(change) => self.cx.backend.bind(change),
                Staged::Identity(id) => self.cx.backend.set_identity(id),
                Staged::Submit(mesh) => match self.cx.backend.submit(&mesh) {
                    Ok(()) => self.stats.submitted += 1,
                    Err(e) => {
                        self.stats.faults += 1;
                        log::warn!("Backend refused a mesh in {:?} pass: {}", self.pass, e);
                    }
                },
            }
        }
    }

    fn visit(&mut self, id: DrawableId, state: &LayoutState) {
        let serial = self.map.next_serial();
        let staged = self.staged.len();
        let bound = self.bound;
        let started = perf::start();
        if let Err(e) = self.walk(id, state) {
            self.stats.faults += 1;
            self.map.forget_after(serial);
            self.staged.truncate(staged);
            self.bound = bound;
            log::warn!("Skipping {:?} in {:?} pass: {}", id, self.pass, e);
        }
        if let Some(t) = started {
            self.cx.env.profiler.record_visit(t.elapsed());
        }
    }

    fn walk(&mut self, id: DrawableId, state: &LayoutState) -> Result<(), LayoutError> {
        self.stats.visited += 1;
        let tree = self.tree;
        let key = tree.key(id)?;
        let drawable = tree.get(id)?;
        match drawable {
            Drawable::Layout(layout) => {
                let mut running = layout.enter(state);
                let outer = self.container.replace(id);
                for &child in &layout.children {
                    if let Ok(Drawable::Attribute(attr)) = tree.get(child) {
                        running.apply(attr);
                        continue;
                    }
                    self.visit(child, &running);
                }
                self.container = outer;
            }
            Drawable::Page(page) => self.page(page, state),
            Drawable::Table(table) => self.table(id, table, state),
            Drawable::Shape(shape) => self.shape(id, key, shape, state)?,
            Drawable::Text(span) => self.text(id, key, span, state)?,
            Drawable::Handle(handle) => self.handle(id, key, handle, state)?,
            Drawable::Image(image) => self.image(id, key, image, state)?,
            Drawable::Custom(ext) => self.custom(id, key, ext.as_ref(), state)?,
            Drawable::Attribute(_) | Drawable::Break(_) | Drawable::Flow(_) => {}
        }

        if self.pass != Pass::Draw && !self.decorating && drawable.is_visible_kind() {
            self.decorate(id, key, state)?;
        }
        Ok(())
    }

    fn entry(&self, id: DrawableId, key: NodeKey) -> IdentifyEntry {
        IdentifyEntry::new(id, key, self.container)
    }

    fn tag(&mut self, entry: IdentifyEntry, category: SelectionCategory) {
        if self.pass != Pass::Identify {
            return;
        }
        let category = if self.decorating {
            SelectionCategory::Container
        } else {
            category
        };
        let id = self.map.assign(entry, category);
        self.staged.push(Staged::Identity(id));
    }

    /// Forwards the paint fields that differ from what is bound.
    fn bind(&mut self, paint: &PaintModel) {
        let identify = self.pass == Pass::Identify;
        let previous = self.bound.as_ref().map(changes);
        for (i, change) in changes(paint).into_iter().enumerate() {
            if previous.as_ref().is_some_and(|p| p[i] == change) {
                continue;
            }
            if identify && change.is_visual() {
                continue;
            }
            self.staged.push(Staged::Bind(change));
        }
        self.bound = Some(*paint);
    }

    fn submit(&mut self, mesh: Mesh) -> Result<(), LayoutError> {
        if mesh.is_empty() {
            return Ok(());
        }
        mesh.validate()?;
        self.staged.push(Staged::Submit(mesh));
        Ok(())
    }

    fn shape(&mut self, id: DrawableId, key: NodeKey, shape: &Shape, state: &LayoutState) -> Result<(), LayoutError> {
        if self.pass == Pass::Selection {
            return Ok(());
        }
        let segments = self.tree.config().ellipse_segments;
        let profiler = self.cx.env.profiler;
        let paint = state.paint;
        self.tag(self.entry(id, key), SelectionCategory::Plain);

        if shape.is_closed() {
            if paint.fill.is_visible() {
                let mesh = self.cx.cache.meshes.get(shape, segments, None, profiler);
                self.bind(&paint);
                self.submit(mesh.map_vertices(|p| state.to_world(p)))?;
            }
            if paint.has_outline() {
                let mesh = self.cx.cache.meshes.get(shape, segments, Some(paint.line_width), profiler);
                self.bind(&PaintModel { fill: paint.line, ..paint });
                self.submit(mesh.map_vertices(|p| state.to_world(p)))?;
            }
        } else {
            let color = if paint.line.is_visible() { paint.line } else { paint.fill };
            let width = paint.line_width.max(1.0);
            let mesh = self.cx.cache.meshes.get(shape, segments, Some(width), profiler);
            self.bind(&PaintModel { fill: color, ..paint });
            self.submit(mesh.map_vertices(|p| state.to_world(p)))?;
        }
        Ok(())
    }

    fn text(&mut self, id: DrawableId, key: NodeKey, span: &TextSpan, state: &LayoutState) -> Result<(), LayoutError> {
        if self.pass == Pass::Selection {
            return Ok(());
        }
        let env = self.cx.env;
        let font = measure::display_font(state, &env);
        let glyphs = span.glyphs(&font, env.metrics, &mut self.cx.cache.glyphs, env.profiler)?;
        let ascent = env.metrics.ascent(&font);
        let descent = env.metrics.descent(&font);
        let leading = (font.line_height - (ascent + descent)) / 2.0;

        if self.pass == Pass::Identify {
            // Whitespace stays pickable so a click between words lands on
            // a character.
            let per_char = self.tree.config().identify_characters;
            if !per_char {
                self.tag(self.entry(id, key), SelectionCategory::Plain);
            }
            for &(index, _, x, advance) in &glyphs {
                if per_char {
                    let entry = IdentifyEntry {
                        char_index: Some(index),
                        ..self.entry(id, key)
                    };
                    self.tag(entry, SelectionCategory::Character);
                }
                let quad = Mesh::quad(Rect::new(x, 0.0, advance, font.line_height), 0.0);
                self.submit(quad.map_vertices(|p| state.to_world(p)))?;
            }
            return Ok(());
        }

        let mut mesh = Mesh::new();
        for &(_, ch, x, advance) in &glyphs {
            if ch.is_whitespace() {
                continue;
            }
            mesh.append(&Mesh::quad(Rect::new(x, leading, advance, ascent + descent), 0.0));
        }
        self.bind(&state.paint);
        self.submit(mesh.map_vertices(|p| state.to_world(p)))
    }

    fn handle(&mut self, id: DrawableId, key: NodeKey, handle: &Handle, state: &LayoutState) -> Result<(), LayoutError> {
        if self.pass == Pass::Selection {
            return Ok(());
        }
        self.tag(self.entry(id, key), SelectionCategory::Handle);
        let quad = Mesh::quad(Rect::new(0.0, 0.0, handle.size.width, handle.size.height), 0.0);
        self.bind(&state.paint);
        self.submit(quad.map_vertices(|p| state.to_world(p)))
    }

    fn image(&mut self, id: DrawableId, key: NodeKey, image: &Image, state: &LayoutState) -> Result<(), LayoutError> {
        if self.pass == Pass::Selection {
            return Ok(());
        }
        let paint = match self.cx.env.textures.texture(&image.uri) {
            ResourceState::Ready { texture, .. } => PaintModel {
                fill: Color::WHITE,
                texture: Some(texture),
                ..state.paint
            },
            other => {
                if let ResourceState::Failed(reason) = other {
                    log::debug!("Image '{}' failed to load: {}", image.uri, reason);
                }
                PaintModel {
                    fill: Color::gray(PLACEHOLDER_GRAY),
                    texture: None,
                    ..state.paint
                }
            }
        };
        self.tag(self.entry(id, key), SelectionCategory::Plain);
        let quad = Mesh::quad(Rect::new(0.0, 0.0, image.size.width, image.size.height), 0.0);
        self.bind(&paint);
        self.submit(quad.map_vertices(|p| state.to_world(p)))
    }

    fn custom(
        &mut self,
        id: DrawableId,
        key: NodeKey,
        ext: &dyn Extension,
        state: &LayoutState,
    ) -> Result<(), LayoutError> {
        if self.pass == Pass::Selection {
            return Ok(());
        }
        let mut meshes = Vec::new();
        ext.draw(state, &mut meshes)?;
        self.tag(self.entry(id, key), SelectionCategory::Plain);
        self.bind(&state.paint);
        for mesh in &meshes {
            self.submit(mesh.map_vertices(|p| state.to_world(p)))?;
        }
        Ok(())
    }

    /// Draws the laid-out lines of a page. Offers are positioned so their
    /// measured box starts at the line slot and their ascent meets the
    /// baseline.
    fn page(&mut self, page: &PageLayout, state: &LayoutState) {
        let tree = self.tree;
        let base = state.offset.add(page.origin);
        let mut running = page.entry_state(tree, state);
        for column in &page.laid_out {
            for line_place in &column.lines.places {
                let line = &line_place.item;
                let top = page.margins.top + line_place.position;
                for place in &line.items.places {
                    let item = &place.item;
                    if item.repeat {
                        continue;
                    }
                    if item.attribute {
                        if let Ok(Drawable::Attribute(attr)) = tree.get(item.id) {
                            running.apply(attr);
                        }
                        continue;
                    }
                    let mut item_state = running.clone();
                    item_state.offset = base.offset(
                        column.x + place.position - item.lower.x,
                        top + line.baseline - item.ascent - item.lower.y,
                        0.0,
                    );
                    self.visit(item.id, &item_state);
                }
            }
        }
    }

    fn table(&mut self, id: DrawableId, table: &Table, state: &LayoutState) {
        let outer = self.container.replace(id);
        let at = |rect: Rect| {
            let mut s = state.clone();
            s.offset = state.offset.offset(rect.x, rect.y, 0.0);
            s
        };

        self.decorating = true;
        for (i, &fill) in table.fills.iter().enumerate() {
            self.visit(fill, &at(table.cell_rect(i)));
        }
        self.decorating = false;

        for (i, &cell) in table.cells.iter().enumerate() {
            let mut cell_state = state.clone();
            cell_state.offset = state.offset.add(table.placement(i));
            self.visit(cell, &cell_state);
        }

        self.decorating = true;
        for (i, &border) in table.borders.iter().enumerate() {
            self.visit(border, &at(table.cell_rect(i)));
        }
        self.decorating = false;
        self.container = outer;
    }

    /// Highlight and corner handles around a selected drawable.
    fn decorate(&mut self, id: DrawableId, key: NodeKey, state: &LayoutState) -> Result<(), LayoutError> {
        if self.cx.display.selected(key) == 0 {
            return Ok(());
        }
        let bounds = measure::bounds(self.tree, id, state, &mut self.cx.measure());
        if bounds.is_empty() {
            return Ok(());
        }
        let config = self.tree.config();
        let (inset, handle, bias) = (config.highlight_inset, config.handle_size, config.handle_depth_bias);
        let rect = bounds.to_rect().inflate(inset, inset);
        let z = bounds.lower.z;

        if self.pass == Pass::Selection {
            let segments = config.ellipse_segments;
            let outline = Shape::rect(rect.width, rect.height);
            let profiler = self.cx.env.profiler;
            let ring = self.cx.cache.meshes.get(&outline, segments, Some(1.0), profiler);
            let paint = PaintModel {
                fill: Color::SELECTION,
                texture: None,
                ..PaintModel::default()
            };
            self.bind(&paint);
            self.submit(ring.map_vertices(|p| p.offset(rect.x, rect.y, z)))?;
        }
        for corner in Corner::ALL {
            let center = corner_of(&rect, corner);
            let quad = Mesh::quad(Rect::centered(center.x, center.y, handle, handle), z - bias);
            let entry = IdentifyEntry {
                corner: Some(corner),
                ..self.entry(id, key)
            };
            self.tag(entry, SelectionCategory::Handle);
            self.submit(quad)?;
        }
        Ok(())
    }
}

fn changes(paint: &PaintModel) -> [StateChange; 6] {
    [
        StateChange::Fill(paint.fill),
        StateChange::Line(paint.line),
        StateChange::LineWidth(paint.line_width),
        StateChange::Texture(paint.texture),
        StateChange::Shader(paint.shader),
        StateChange::Lighting(paint.lighting),
    ]
}

fn corner_of(rect: &Rect, corner: Corner) -> Point {
    match corner {
        Corner::TopLeft => Point::flat(rect.x, rect.y),
        Corner::TopRight => Point::flat(rect.right(), rect.y),
        Corner::BottomRight => Point::flat(rect.right(), rect.bottom()),
        Corner::BottomLeft => Point::flat(rect.x, rect.bottom()),
    }
}

impl LayoutTree {
    /// Evaluates the tree and draws it.
    pub fn draw(&mut self, cx: &mut RenderContext<'_>) -> Result<RenderStats, LayoutError> {
        self.prepare(cx)?;
        let started = perf::start();
        let (stats, _) = Walker::new(self, cx, Pass::Draw).run();
        perf::finish(cx.env.profiler, "draw", started);
        Ok(stats)
    }

    /// Evaluates the tree and draws highlight boxes and resize handles
    /// around everything the display reports selected.
    pub fn draw_selection(&mut self, cx: &mut RenderContext<'_>) -> Result<RenderStats, LayoutError> {
        self.prepare(cx)?;
        let (stats, _) = Walker::new(self, cx, Pass::Selection).run();
        Ok(stats)
    }

    /// Runs an identify pass over `region` and reads back what it touched.
    /// The ids are only meaningful together with the returned map.
    pub fn identify(
        &mut self,
        cx: &mut RenderContext<'_>,
        region: Rect,
    ) -> Result<(IdentifyMap, Vec<HitRecord>), LayoutError> {
        self.prepare(cx)?;
        let started = perf::start();
        cx.backend.set_mode(RenderMode::Identify(region))?;
        let (stats, map) = Walker::new(self, cx, Pass::Identify).run();
        let hits = cx.backend.read_hits();
        let restored = cx.backend.set_mode(RenderMode::Visible);
        let hits = hits?;
        restored?;
        perf::finish(cx.env.profiler, "identify", started);
        log::trace!("Identify over {:?}: {} ids, {} hits, {:?}", region, map.len(), hits.len(), stats);
        Ok((map, hits))
    }

    /// The drawable under a point, within `radius`.
    pub fn pick_point(
        &mut self,
        cx: &mut RenderContext<'_>,
        x: f32,
        y: f32,
        radius: f32,
    ) -> Result<Option<PickResult>, LayoutError> {
        let side = 2.0 * radius.max(0.5);
        let (map, hits) = self.identify(cx, Rect::centered(x, y, side, side))?;
        Ok(Picker::new(&map).pick(&hits))
    }

    /// Every drawable touching `rect`, nearest first.
    pub fn pick_rect(&mut self, cx: &mut RenderContext<'_>, rect: Rect) -> Result<Vec<PickResult>, LayoutError> {
        let (map, hits) = self.identify(cx, rect)?;
        Ok(Picker::new(&map).candidates(&hits))
    }

    fn prepare(&mut self, cx: &mut RenderContext<'_>) -> Result<(), LayoutError> {
        if cx.backend.mode().is_identify() {
            cx.backend.set_mode(RenderMode::Visible)?;
        }
        self.evaluate(&mut cx.measure())?;
        Ok(())
    }
}
