//! CPU reference backend.
//!
//! Visible passes are recorded as a command list so tests and the CLI can
//! inspect what was drawn. Identify passes rasterize submitted triangles into
//! a sample grid over the requested region and keep, per selection id, the
//! depth range it covered.

use crate::{GraphicsBackend, HitRecord, Mesh, RenderError, RenderMode, SelectionId, StateChange};
use folio_types::{Box3, Point, Rect};
use std::collections::HashMap;

/// Upper bound on samples per axis of the identify grid.
const MAX_SAMPLES_PER_AXIS: usize = 256;
const EDGE_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Bind(StateChange),
    Submit { triangles: usize, bounds: Box3 },
}

/// Off-screen id+depth target for one identify pass.
#[derive(Debug, Clone)]
pub struct HitBuffer {
    region: Rect,
    columns: usize,
    rows: usize,
    records: HashMap<SelectionId, HitRecord>,
}

impl HitBuffer {
    /// Builds a grid over `region` with samples roughly `step` apart.
    /// A degenerate region collapses to a single sample at its center.
    pub fn new(region: Rect, step: f32) -> Self {
        let step = if step > 0.0 { step } else { 1.0 };
        let axis = |extent: f32| -> usize {
            if extent <= 0.0 {
                1
            } else {
                ((extent / step).ceil() as usize).clamp(1, MAX_SAMPLES_PER_AXIS)
            }
        };
        Self {
            region,
            columns: axis(region.width),
            rows: axis(region.height),
            records: HashMap::new(),
        }
    }

    pub fn region(&self) -> Rect {
        self.region
    }

    fn sample(&self, col: usize, row: usize) -> (f32, f32) {
        let sx = self.region.x + self.region.width * (col as f32 + 0.5) / self.columns as f32;
        let sy = self.region.y + self.region.height * (row as f32 + 0.5) / self.rows as f32;
        (sx, sy)
    }

    /// Rasterizes one triangle for `id`. `order` is the submission sequence.
    pub fn rasterize(&mut self, id: SelectionId, tri: [Point; 3], order: u64) {
        let [a, b, c] = tri;
        let area = edge(a, b, c.x, c.y);
        if area.abs() <= f32::EPSILON {
            return;
        }
        let min_x = a.x.min(b.x).min(c.x);
        let max_x = a.x.max(b.x).max(c.x);
        let min_y = a.y.min(b.y).min(c.y);
        let max_y = a.y.max(b.y).max(c.y);
        let hull = Rect::new(min_x, min_y, max_x - min_x, max_y - min_y);
        if !hull.intersects(&self.region) {
            return;
        }

        for row in 0..self.rows {
            for col in 0..self.columns {
                let (sx, sy) = self.sample(col, row);
                if sx < min_x || sx > max_x || sy < min_y || sy > max_y {
                    continue;
                }
                let w0 = edge(b, c, sx, sy) / area;
                let w1 = edge(c, a, sx, sy) / area;
                let w2 = edge(a, b, sx, sy) / area;
                if w0 < -EDGE_EPSILON || w1 < -EDGE_EPSILON || w2 < -EDGE_EPSILON {
                    continue;
                }
                let depth = w0 * a.z + w1 * b.z + w2 * c.z;
                self.record(id, depth, order);
            }
        }
    }

    fn record(&mut self, id: SelectionId, depth: f32, order: u64) {
        let entry = self.records.entry(id).or_insert(HitRecord {
            id,
            min_depth: depth,
            max_depth: depth,
            order,
            samples: 0,
        });
        entry.samples += 1;
        if depth <= entry.min_depth {
            entry.min_depth = depth;
            entry.order = order;
        }
        entry.max_depth = entry.max_depth.max(depth);
    }

    /// Touched ids in submission order of their nearest sample.
    pub fn hits(&self) -> Vec<HitRecord> {
        let mut hits: Vec<HitRecord> = self.records.values().copied().collect();
        hits.sort_by_key(|h| (h.order, h.id));
        hits
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Twice the signed area of (a, b, p).
fn edge(a: Point, b: Point, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

#[derive(Debug)]
pub struct SoftwareBackend {
    mode: RenderMode,
    identity: SelectionId,
    sequence: u64,
    sample_step: f32,
    commands: Vec<DrawCommand>,
    hits: Option<HitBuffer>,
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SoftwareBackend {
    pub fn new(sample_step: f32) -> Self {
        Self {
            mode: RenderMode::Visible,
            identity: SelectionId::INVALID,
            sequence: 0,
            sample_step,
            commands: Vec::new(),
            hits: None,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn submitted_triangles(&self) -> usize {
        self.commands
            .iter()
            .map(|c| match c {
                DrawCommand::Submit { triangles, .. } => *triangles,
                DrawCommand::Bind(_) => 0,
            })
            .sum()
    }
}

impl GraphicsBackend for SoftwareBackend {
    fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Drops the previous frame's recorded commands.
    fn begin_frame(&mut self) {
        self.commands.clear();
    }

    fn set_mode(&mut self, mode: RenderMode) -> Result<(), RenderError> {
        match mode {
            RenderMode::Visible => {
                self.hits = None;
            }
            RenderMode::Identify(region) => {
                if self.mode.is_identify() {
                    return Err(RenderError::InvalidMode { expected: "visible" });
                }
                self.hits = Some(HitBuffer::new(region, self.sample_step));
                self.sequence = 0;
            }
        }
        self.identity = SelectionId::INVALID;
        self.mode = mode;
        Ok(())
    }

    fn bind(&mut self, change: StateChange) {
        if self.mode.is_identify() {
            log::trace!("Ignoring {:?} during identify", change);
            return;
        }
        self.commands.push(DrawCommand::Bind(change));
    }

    fn set_identity(&mut self, id: SelectionId) {
        self.identity = id;
    }

    fn submit(&mut self, mesh: &Mesh) -> Result<(), RenderError> {
        mesh.validate()?;
        match self.mode {
            RenderMode::Visible => {
                self.commands.push(DrawCommand::Submit {
                    triangles: mesh.triangle_count(),
                    bounds: mesh.bounds(),
                });
            }
            RenderMode::Identify(_) => {
                if !self.identity.is_valid() {
                    return Ok(());
                }
                self.sequence += 1;
                let (id, order) = (self.identity, self.sequence);
                if let Some(buffer) = self.hits.as_mut() {
                    for tri in mesh.triangles() {
                        buffer.rasterize(id, tri, order);
                    }
                }
            }
        }
        Ok(())
    }

    fn read_hits(&mut self) -> Result<Vec<HitRecord>, RenderError> {
        match &self.hits {
            Some(buffer) => Ok(buffer.hits()),
            None => Err(RenderError::InvalidMode { expected: "identify" }),
        }
    }
}
