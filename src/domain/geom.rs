//! 2D vector and axis-aligned rectangle primitives.
//!
//! All simulation geometry is built from these two value types.
//! `Vec2` normalization is fallible: a vector whose components are both
//! within `ERROR_TOLERANCE` of zero has no meaningful direction, and
//! normalizing it is a reported error rather than silent garbage.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use thiserror::Error;

/// Magnitudes below this are treated as zero in direction computations.
pub const ERROR_TOLERANCE: f32 = 1e-9;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeomError {
    #[error("normalization of near-zero vector ({0}, {1})")]
    DegenerateVector(f32, f32),
}

// ══════════════════════════════════════════════════════════════
// Vec2
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    /// Straight up; the default surface normal.
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Vec2 {
        Vec2 { x, y }
    }

    pub fn mag(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn mag2(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// True when both components are within `ERROR_TOLERANCE` of zero.
    pub fn is_negligible(self) -> bool {
        self.x.abs() <= ERROR_TOLERANCE && self.y.abs() <= ERROR_TOLERANCE
    }

    /// Unit vector in the same direction.
    pub fn normalized(self) -> Result<Vec2, GeomError> {
        if self.is_negligible() {
            return Err(GeomError::DegenerateVector(self.x, self.y));
        }
        Ok(self / self.mag())
    }

    /// Component of `self` along `axis`. `axis` must already be a unit
    /// vector (surface normals and their tangents always are).
    pub fn project_onto(self, axis: Vec2) -> Vec2 {
        axis * axis.dot(self)
    }

    /// Rotation by `angle` radians, counter-clockwise.
    pub fn rotate(self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(cos * self.x - sin * self.y, sin * self.x + cos * self.y)
    }

    /// Rotation through 90 degrees, without trig functions.
    pub fn perpendicular(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn angle_in_degrees(self) -> f32 {
        self.angle().to_degrees()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Vec2) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, scalar: f32) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }
}

impl Mul<Vec2> for f32 {
    type Output = Vec2;
    fn mul(self, v: Vec2) -> Vec2 {
        v * self
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, scalar: f32) -> Vec2 {
        self * (1.0 / scalar)
    }
}

// ══════════════════════════════════════════════════════════════
// Rect
// ══════════════════════════════════════════════════════════════

/// An axis-aligned rectangle: left, bottom, width, height.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub l: f32,
    pub b: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(l: f32, b: f32, w: f32, h: f32) -> Rect {
        Rect { l, b, w, h }
    }

    pub fn from_center(c: Vec2, w: f32, h: f32) -> Rect {
        Rect::new(c.x - w * 0.5, c.y - h * 0.5, w, h)
    }

    pub fn from_corners(c1: Vec2, c2: Vec2) -> Rect {
        let (x1, x2) = if c1.x <= c2.x { (c1.x, c2.x) } else { (c2.x, c1.x) };
        let (y1, y2) = if c1.y <= c2.y { (c1.y, c2.y) } else { (c2.y, c1.y) };
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn r(&self) -> f32 {
        self.l + self.w
    }

    pub fn t(&self) -> f32 {
        self.b + self.h
    }

    pub fn bottom_left(&self) -> Vec2 {
        Vec2::new(self.l, self.b)
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.l, self.t())
    }

    pub fn top_right(&self) -> Vec2 {
        Vec2::new(self.r(), self.t())
    }

    pub fn bottom_right(&self) -> Vec2 {
        Vec2::new(self.r(), self.b)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.l + self.w * 0.5, self.b + self.h * 0.5)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.l && p.x < self.r() && p.y >= self.b && p.y < self.t()
    }

    /// Strict overlap test; rectangles that merely share an edge do not
    /// intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        other.r() > self.l && other.l < self.r() && other.t() > self.b && other.b < self.t()
    }

    /// The overlap rectangle, or None when the rects do not intersect.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let mut xs = [self.l, self.r(), other.l, other.r()];
        let mut ys = [self.b, self.t(), other.b, other.t()];
        xs.sort_by(f32::total_cmp);
        ys.sort_by(f32::total_cmp);
        Some(Rect::new(xs[1], ys[1], xs[2] - xs[1], ys[2] - ys[1]))
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
