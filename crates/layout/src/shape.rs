//! Primitive shapes and their tessellation.

use folio_render_core::Mesh;
use folio_types::{Box3, Point, Size};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// A primitive in its own local frame, with the top-left corner at the
/// origin for the sized kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum Shape {
    Rectangle { size: Size },
    RoundedRectangle { size: Size, radius: f32 },
    Ellipse { size: Size },
    /// A convex polygon; concave outlines fill incorrectly.
    Polygon { points: Vec<Point> },
    Line { to: Point },
}

/// Hashable identity of a tessellation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeKey {
    kind: u8,
    values: Vec<u32>,
    segments: u32,
    stroke: Option<u32>,
}

impl Shape {
    pub fn rect(width: f32, height: f32) -> Self {
        Shape::Rectangle {
            size: Size::new(width, height),
        }
    }

    pub fn ellipse(width: f32, height: f32) -> Self {
        Shape::Ellipse {
            size: Size::new(width, height),
        }
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self, Shape::Line { .. })
    }

    pub fn local_bounds(&self) -> Box3 {
        match self {
            Shape::Rectangle { size }
            | Shape::RoundedRectangle { size, .. }
            | Shape::Ellipse { size } => Box3::new(Point::ORIGIN, Point::flat(size.width, size.height)),
            Shape::Polygon { points } => {
                let mut b = Box3::EMPTY;
                for p in points {
                    b.include(*p);
                }
                b
            }
            Shape::Line { to } => {
                let mut b = Box3::new(Point::ORIGIN, Point::ORIGIN);
                b.include(*to);
                b
            }
        }
    }

    /// Resizes the sized kinds in place. Polygons and lines are unchanged.
    pub fn set_size(&mut self, new_size: Size) {
        match self {
            Shape::Rectangle { size }
            | Shape::RoundedRectangle { size, .. }
            | Shape::Ellipse { size } => *size = new_size,
            Shape::Polygon { .. } | Shape::Line { .. } => {}
        }
    }

    /// The outline as a point loop (open for lines).
    pub fn outline(&self, segments: u32) -> Vec<Point> {
        let segments = segments.max(4);
        match self {
            Shape::Rectangle { size } => vec![
                Point::ORIGIN,
                Point::flat(size.width, 0.0),
                Point::flat(size.width, size.height),
                Point::flat(0.0, size.height),
            ],
            Shape::RoundedRectangle { size, radius } => {
                let r = radius.max(0.0).min(size.width / 2.0).min(size.height / 2.0);
                if r <= 0.0 {
                    return Shape::Rectangle { size: *size }.outline(segments);
                }
                let per_corner = (segments / 4).max(1);
                let corners = [
                    (size.width - r, r, -PI / 2.0),
                    (size.width - r, size.height - r, 0.0),
                    (r, size.height - r, PI / 2.0),
                    (r, r, PI),
                ];
                let mut pts = Vec::with_capacity(4 * (per_corner as usize + 1));
                for (cx, cy, start) in corners {
                    for i in 0..=per_corner {
                        let a = start + (PI / 2.0) * (i as f32 / per_corner as f32);
                        pts.push(Point::flat(cx + r * a.cos(), cy + r * a.sin()));
                    }
                }
                pts
            }
            Shape::Ellipse { size } => {
                let (rx, ry) = (size.width / 2.0, size.height / 2.0);
                (0..segments)
                    .map(|i| {
                        let a = 2.0 * PI * (i as f32 / segments as f32);
                        Point::flat(rx + rx * a.cos(), ry + ry * a.sin())
                    })
                    .collect()
            }
            Shape::Polygon { points } => points.clone(),
            Shape::Line { to } => vec![Point::ORIGIN, *to],
        }
    }

    pub fn fill_mesh(&self, segments: u32) -> Mesh {
        if !self.is_closed() {
            return Mesh::new();
        }
        Mesh::fan(&self.outline(segments))
    }

    /// Quads of `width` along every outline edge.
    pub fn stroke_mesh(&self, segments: u32, width: f32) -> Mesh {
        let pts = self.outline(segments);
        let mut mesh = Mesh::new();
        if pts.len() < 2 || width <= 0.0 {
            return mesh;
        }
        let edges = if self.is_closed() { pts.len() } else { pts.len() - 1 };
        for i in 0..edges {
            let p = pts[i];
            let q = pts[(i + 1) % pts.len()];
            let (dx, dy) = (q.x - p.x, q.y - p.y);
            let len = (dx * dx + dy * dy).sqrt();
            if len <= f32::EPSILON {
                continue;
            }
            let (nx, ny) = (-dy / len * width / 2.0, dx / len * width / 2.0);
            mesh.append(&Mesh::fan(&[
                p.offset(nx, ny, 0.0),
                q.offset(nx, ny, 0.0),
                q.offset(-nx, -ny, 0.0),
                p.offset(-nx, -ny, 0.0),
            ]));
        }
        mesh
    }

    pub fn cache_key(&self, segments: u32, stroke: Option<f32>) -> ShapeKey {
        let size_bits = |s: &Size| vec![s.width.to_bits(), s.height.to_bits()];
        let (kind, values) = match self {
            Shape::Rectangle { size } => (0, size_bits(size)),
            Shape::RoundedRectangle { size, radius } => {
                let mut v = size_bits(size);
                v.push(radius.to_bits());
                (1, v)
            }
            Shape::Ellipse { size } => (2, size_bits(size)),
            Shape::Polygon { points } => (
                3,
                points.iter().flat_map(|p| [p.x.to_bits(), p.y.to_bits()]).collect(),
            ),
            Shape::Line { to } => (4, vec![to.x.to_bits(), to.y.to_bits()]),
        };
        ShapeKey {
            kind,
            values,
            segments,
            stroke: stroke.map(f32::to_bits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_fills_with_two_triangles() {
        let mesh = Shape::rect(10.0, 5.0).fill_mesh(32);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.bounds().size(), Size::new(10.0, 5.0));
    }

    #[test]
    fn ellipse_uses_configured_segments() {
        let mesh = Shape::ellipse(10.0, 10.0).fill_mesh(16);
        assert_eq!(mesh.triangle_count(), 14);
    }

    #[test]
    fn lines_only_stroke() {
        let line = Shape::Line {
            to: Point::flat(10.0, 0.0),
        };
        assert!(line.fill_mesh(8).is_empty());
        let stroke = line.stroke_mesh(8, 2.0);
        assert_eq!(stroke.triangle_count(), 2);
        assert_eq!(stroke.bounds().height(), 2.0);
    }

    #[test]
    fn cache_keys_distinguish_geometry() {
        let a = Shape::rect(10.0, 5.0).cache_key(32, None);
        let b = Shape::rect(10.0, 6.0).cache_key(32, None);
        let c = Shape::rect(10.0, 5.0).cache_key(32, Some(1.0));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, Shape::rect(10.0, 5.0).cache_key(32, None));
    }
}
