use crate::RenderError;
use folio_style::Lighting;
use folio_types::{Box3, Color, Point, Rect, ShaderId, TextureId};
use std::fmt;

/// Indexed triangle list in world space. `z` of each vertex is its depth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two triangles covering `rect` at depth `z`.
    pub fn quad(rect: Rect, z: f32) -> Self {
        Self {
            vertices: vec![
                Point::new(rect.x, rect.y, z),
                Point::new(rect.right(), rect.y, z),
                Point::new(rect.right(), rect.bottom(), z),
                Point::new(rect.x, rect.bottom(), z),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// A convex polygon triangulated as a fan around its first vertex.
    pub fn fan(points: &[Point]) -> Self {
        let mut mesh = Mesh::new();
        if points.len() < 3 {
            return mesh;
        }
        mesh.vertices.extend_from_slice(points);
        for i in 1..(points.len() as u32 - 1) {
            mesh.indices.extend_from_slice(&[0, i, i + 1]);
        }
        mesh
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn append(&mut self, other: &Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Returns a copy with every vertex passed through `f`.
    pub fn map_vertices(&self, f: impl Fn(Point) -> Point) -> Mesh {
        Mesh {
            vertices: self.vertices.iter().map(|p| f(*p)).collect(),
            indices: self.indices.clone(),
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Point; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |t| {
            [
                self.vertices[t[0] as usize],
                self.vertices[t[1] as usize],
                self.vertices[t[2] as usize],
            ]
        })
    }

    pub fn bounds(&self) -> Box3 {
        let mut b = Box3::EMPTY;
        for p in &self.vertices {
            b.include(*p);
        }
        b
    }

    /// Checks that the index list forms whole triangles over existing vertices.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.indices.len() % 3 != 0 {
            return Err(RenderError::MalformedMesh(format!(
                "{} indices do not form whole triangles",
                self.indices.len()
            )));
        }
        let count = self.vertices.len() as u32;
        if let Some(bad) = self.indices.iter().find(|&&i| i >= count) {
            return Err(RenderError::MalformedMesh(format!(
                "index {} out of range for {} vertices",
                bad, count
            )));
        }
        Ok(())
    }
}

/// A request to change backend state before the next submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateChange {
    Fill(Color),
    Line(Color),
    LineWidth(f32),
    Texture(Option<TextureId>),
    Shader(Option<ShaderId>),
    Lighting(Lighting),
}

impl StateChange {
    /// Visual changes have no effect on coverage or depth.
    pub fn is_visual(&self) -> bool {
        !matches!(self, StateChange::LineWidth(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderMode {
    /// Ordinary on-screen output.
    Visible,
    /// Hit testing into an off-screen id+depth target covering `region`.
    Identify(Rect),
}

impl RenderMode {
    pub fn is_identify(&self) -> bool {
        matches!(self, RenderMode::Identify(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectionCategory {
    Plain,
    Handle,
    Character,
    Container,
}

impl SelectionCategory {
    const fn tag(self) -> u32 {
        match self {
            SelectionCategory::Plain => 0,
            SelectionCategory::Handle => 1,
            SelectionCategory::Character => 2,
            SelectionCategory::Container => 3,
        }
    }

    /// Rank used before depth when resolving a point pick. A handle always
    /// wins over the shape it manipulates.
    pub fn pick_priority(self) -> u8 {
        match self {
            SelectionCategory::Handle => 3,
            SelectionCategory::Character => 2,
            SelectionCategory::Plain => 1,
            SelectionCategory::Container => 0,
        }
    }
}

/// An id handed out during one identify pass.
///
/// The two top bits carry the [`SelectionCategory`], the rest a serial that
/// starts at 1 for every pass. Id 0 is never assigned.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionId(u32);

impl SelectionId {
    pub const INVALID: SelectionId = SelectionId(0);
    const TAG_SHIFT: u32 = 30;
    pub const MAX_SERIAL: u32 = (1 << Self::TAG_SHIFT) - 1;

    /// Builds an id from a serial in `1..=MAX_SERIAL`; anything else is invalid.
    pub fn new(serial: u32, category: SelectionCategory) -> SelectionId {
        if serial == 0 || serial > Self::MAX_SERIAL {
            return Self::INVALID;
        }
        SelectionId(serial | (category.tag() << Self::TAG_SHIFT))
    }

    pub fn from_raw(raw: u32) -> SelectionId {
        SelectionId(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn serial(self) -> u32 {
        self.0 & Self::MAX_SERIAL
    }

    pub fn category(self) -> SelectionCategory {
        match self.0 >> Self::TAG_SHIFT {
            0 => SelectionCategory::Plain,
            1 => SelectionCategory::Handle,
            2 => SelectionCategory::Character,
            _ => SelectionCategory::Container,
        }
    }

    pub fn is_valid(self) -> bool {
        self.serial() != 0
    }
}

impl fmt::Debug for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SelectionId({:?}#{})", self.category(), self.serial())
    }
}

/// One id touched inside the read-back region of an identify pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    pub id: SelectionId,
    pub min_depth: f32,
    pub max_depth: f32,
    /// Submission sequence number of the last submission that reached
    /// `min_depth`; later submissions win exact depth ties.
    pub order: u64,
    pub samples: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_ids_carry_category() {
        let id = SelectionId::new(42, SelectionCategory::Handle);
        assert_eq!(id.serial(), 42);
        assert_eq!(id.category(), SelectionCategory::Handle);
        assert!(id.is_valid());
    }

    #[test]
    fn serial_zero_is_invalid() {
        assert_eq!(SelectionId::new(0, SelectionCategory::Plain), SelectionId::INVALID);
        assert!(!SelectionId::new(0, SelectionCategory::Container).is_valid());
    }

    #[test]
    fn fan_triangulates_convex_polygon() {
        let pts = [
            Point::flat(0.0, 0.0),
            Point::flat(1.0, 0.0),
            Point::flat(1.0, 1.0),
            Point::flat(0.0, 1.0),
            Point::flat(-0.5, 0.5),
        ];
        let mesh = Mesh::fan(&pts);
        assert_eq!(mesh.triangle_count(), 3);
        assert!(mesh.validate().is_ok());
    }
}
