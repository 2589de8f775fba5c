use serde::{Deserialize, Serialize};

/// A point in layout space. `z` doubles as depth once a vertex reaches the
/// backend: smaller values are nearer to the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn flat(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn offset(self, dx: f32, dy: f32, dz: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    pub fn add(self, other: Point) -> Self {
        self.offset(other.x, other.y, other.z)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }
}

/// An axis-aligned 2D rectangle with `y` growing downwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle of the given size centered on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Normalizes a rectangle given by two arbitrary corners (e.g. a marquee drag).
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::flat(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    pub fn inflate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x - dx,
            y: self.y - dy,
            width: self.width + 2.0 * dx,
            height: self.height + 2.0 * dy,
        }
    }
}

/// A 3D bounding box. The empty box has `lower > upper` so that a union with
/// any other box yields that box unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Box3 {
    pub lower: Point,
    pub upper: Point,
}

impl Default for Box3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Box3 {
    pub const EMPTY: Box3 = Box3 {
        lower: Point {
            x: f32::INFINITY,
            y: f32::INFINITY,
            z: f32::INFINITY,
        },
        upper: Point {
            x: f32::NEG_INFINITY,
            y: f32::NEG_INFINITY,
            z: f32::NEG_INFINITY,
        },
    };

    pub fn new(lower: Point, upper: Point) -> Self {
        Self { lower, upper }
    }

    pub fn from_rect(rect: Rect, z: f32) -> Self {
        Self {
            lower: Point::new(rect.x, rect.y, z),
            upper: Point::new(rect.right(), rect.bottom(), z),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lower.x > self.upper.x || self.lower.y > self.upper.y || self.lower.z > self.upper.z
    }

    pub fn width(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.upper.x - self.lower.x }
    }

    pub fn height(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.upper.y - self.lower.y }
    }

    pub fn depth(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.upper.z - self.lower.z }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn union(&self, other: &Box3) -> Box3 {
        Box3 {
            lower: Point::new(
                self.lower.x.min(other.lower.x),
                self.lower.y.min(other.lower.y),
                self.lower.z.min(other.lower.z),
            ),
            upper: Point::new(
                self.upper.x.max(other.upper.x),
                self.upper.y.max(other.upper.y),
                self.upper.z.max(other.upper.z),
            ),
        }
    }

    pub fn include(&mut self, p: Point) {
        *self = self.union(&Box3 { lower: p, upper: p });
    }

    pub fn offset(&self, by: Point) -> Box3 {
        if self.is_empty() {
            return *self;
        }
        Box3 {
            lower: self.lower.add(by),
            upper: self.upper.add(by),
        }
    }

    /// Grows the box on every side in x and y (used for reserved space).
    pub fn inflate(&self, dx: f32, dy: f32) -> Box3 {
        if self.is_empty() {
            return *self;
        }
        Box3 {
            lower: self.lower.offset(-dx, -dy, 0.0),
            upper: self.upper.offset(dx, dy, 0.0),
        }
    }

    pub fn to_rect(&self) -> Rect {
        if self.is_empty() {
            return Rect::default();
        }
        Rect::new(self.lower.x, self.lower.y, self.width(), self.height())
    }
}

/// A 2D affine transform with an independent depth offset and scale.
///
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`, `z' = z_scale*z + z_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
    pub z_scale: f32,
    pub z_offset: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
        z_scale: 1.0,
        z_offset: 0.0,
    };

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            e: x,
            f: y,
            z_offset: z,
            ..Self::IDENTITY
        }
    }

    pub fn scaling(sx: f32, sy: f32, sz: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            z_scale: sz,
            ..Self::IDENTITY
        }
    }

    /// Rotation around the z axis, in degrees.
    pub fn rotation(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self {
            a: c,
            b: s,
            c: -s,
            d: c,
            ..Self::IDENTITY
        }
    }

    /// Returns `self ∘ local`: the returned transform applies `local` first.
    pub fn then(&self, local: &Transform) -> Transform {
        Transform {
            a: self.a * local.a + self.c * local.b,
            b: self.b * local.a + self.d * local.b,
            c: self.a * local.c + self.c * local.d,
            d: self.b * local.c + self.d * local.d,
            e: self.a * local.e + self.c * local.f + self.e,
            f: self.b * local.e + self.d * local.f + self.f,
            z_scale: self.z_scale * local.z_scale,
            z_offset: self.z_scale * local.z_offset + self.z_offset,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
            z: self.z_scale * p.z + self.z_offset,
        }
    }

    /// Transforms the eight corners of a box and returns their bounding box.
    pub fn apply_box(&self, bx: &Box3) -> Box3 {
        if bx.is_empty() {
            return *bx;
        }
        let mut out = Box3::EMPTY;
        for &x in &[bx.lower.x, bx.upper.x] {
            for &y in &[bx.lower.y, bx.upper.y] {
                for &z in &[bx.lower.z, bx.upper.z] {
                    out.include(self.apply(Point::new(x, y, z)));
                }
            }
        }
        out
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_is_neutral_for_union() {
        let b = Box3::from_rect(Rect::new(1.0, 2.0, 3.0, 4.0), 0.0);
        assert_eq!(Box3::EMPTY.union(&b), b);
        assert_eq!(b.union(&Box3::EMPTY), b);
        assert_eq!(Box3::EMPTY.width(), 0.0);
    }

    #[test]
    fn transform_composition_applies_local_first() {
        let parent = Transform::translation(10.0, 0.0, 0.0);
        let local = Transform::scaling(2.0, 2.0, 1.0);
        let p = parent.then(&local).apply(Point::flat(1.0, 1.0));
        assert_eq!(p, Point::flat(12.0, 2.0));
    }

    #[test]
    fn rect_from_corners_normalizes() {
        let r = Rect::from_corners(Point::flat(10.0, 5.0), Point::flat(2.0, 9.0));
        assert_eq!(r, Rect::new(2.0, 5.0, 8.0, 4.0));
    }
}
