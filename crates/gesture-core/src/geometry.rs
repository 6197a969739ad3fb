#![forbid(unsafe_code)]

//! Geometric value types used by the drag machinery.
//!
//! These are deliberately small: a 2-D vector, a 2-D affine matrix, an
//! invertible [`Transform`] pairing a matrix with its cached inverse, and an
//! axis-aligned [`Bounds2`] rectangle. They carry no scene knowledge.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// ---------------------------------------------------------------------------
// Vector2
// ---------------------------------------------------------------------------

/// A 2-D vector or point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True if both components are exactly zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// True if both components are finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: Vector2) -> f64 {
        (*self - other).magnitude()
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Vector2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

// ---------------------------------------------------------------------------
// Matrix3
// ---------------------------------------------------------------------------

/// A 2-D affine transform stored as the top two rows of a 3x3 matrix.
///
/// ```text
/// | m00 m01 m02 |
/// | m10 m11 m12 |
/// |  0   0   1  |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3 {
    pub m00: f64,
    pub m01: f64,
    pub m02: f64,
    pub m10: f64,
    pub m11: f64,
    pub m12: f64,
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix3 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        m00: 1.0,
        m01: 0.0,
        m02: 0.0,
        m10: 0.0,
        m11: 1.0,
        m12: 0.0,
    };

    /// Create a matrix from its six affine entries (row-major).
    #[must_use]
    pub const fn new(m00: f64, m01: f64, m02: f64, m10: f64, m11: f64, m12: f64) -> Self {
        Self {
            m00,
            m01,
            m02,
            m10,
            m11,
            m12,
        }
    }

    /// Pure translation.
    #[must_use]
    pub const fn translation(x: f64, y: f64) -> Self {
        Self::new(1.0, 0.0, x, 0.0, 1.0, y)
    }

    /// Uniform or non-uniform scale about the origin.
    #[must_use]
    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    /// Counter-clockwise rotation (radians) about the origin.
    #[must_use]
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, -sin, 0.0, sin, cos, 0.0)
    }

    /// The translation component.
    #[inline]
    #[must_use]
    pub const fn translation_vector(&self) -> Vector2 {
        Vector2::new(self.m02, self.m12)
    }

    /// Copy of this matrix with its translation replaced.
    #[must_use]
    pub const fn with_translation(mut self, translation: Vector2) -> Self {
        self.m02 = translation.x;
        self.m12 = translation.y;
        self
    }

    /// Matrix product `self * rhs` (rhs is applied first).
    #[must_use]
    pub fn multiply(&self, rhs: &Matrix3) -> Matrix3 {
        Matrix3 {
            m00: self.m00 * rhs.m00 + self.m01 * rhs.m10,
            m01: self.m00 * rhs.m01 + self.m01 * rhs.m11,
            m02: self.m00 * rhs.m02 + self.m01 * rhs.m12 + self.m02,
            m10: self.m10 * rhs.m00 + self.m11 * rhs.m10,
            m11: self.m10 * rhs.m01 + self.m11 * rhs.m11,
            m12: self.m10 * rhs.m02 + self.m11 * rhs.m12 + self.m12,
        }
    }

    /// Determinant of the linear part.
    #[inline]
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.m00 * self.m11 - self.m01 * self.m10
    }

    /// Inverse, or `None` if the matrix is singular or non-finite.
    #[must_use]
    pub fn inverted(&self) -> Option<Matrix3> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let m00 = self.m11 * inv;
        let m01 = -self.m01 * inv;
        let m10 = -self.m10 * inv;
        let m11 = self.m00 * inv;
        Some(Matrix3 {
            m00,
            m01,
            m02: -(m00 * self.m02 + m01 * self.m12),
            m10,
            m11,
            m12: -(m10 * self.m02 + m11 * self.m12),
        })
    }

    /// Apply to a point (includes translation).
    #[inline]
    #[must_use]
    pub fn transform_point(&self, p: Vector2) -> Vector2 {
        Vector2::new(
            self.m00 * p.x + self.m01 * p.y + self.m02,
            self.m10 * p.x + self.m11 * p.y + self.m12,
        )
    }

    /// Apply to a displacement (ignores translation).
    #[inline]
    #[must_use]
    pub fn transform_delta(&self, v: Vector2) -> Vector2 {
        Vector2::new(
            self.m00 * v.x + self.m01 * v.y,
            self.m10 * v.x + self.m11 * v.y,
        )
    }

    /// Component-wise comparison within `epsilon`.
    #[must_use]
    pub fn approx_eq(&self, other: &Matrix3, epsilon: f64) -> bool {
        (self.m00 - other.m00).abs() <= epsilon
            && (self.m01 - other.m01).abs() <= epsilon
            && (self.m02 - other.m02).abs() <= epsilon
            && (self.m10 - other.m10).abs() <= epsilon
            && (self.m11 - other.m11).abs() <= epsilon
            && (self.m12 - other.m12).abs() <= epsilon
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// An invertible affine transform with its inverse cached.
///
/// "Forward" maps the inner frame (e.g. model coordinates) to the outer
/// frame (e.g. view or global coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix3,
    inverse: Matrix3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        matrix: Matrix3::IDENTITY,
        inverse: Matrix3::IDENTITY,
    };

    /// Wrap a matrix, returning `None` when it cannot be inverted.
    #[must_use]
    pub fn new(matrix: Matrix3) -> Option<Self> {
        let inverse = matrix.inverted()?;
        Some(Self { matrix, inverse })
    }

    /// The forward matrix.
    #[inline]
    #[must_use]
    pub const fn matrix(&self) -> &Matrix3 {
        &self.matrix
    }

    /// The cached inverse matrix.
    #[inline]
    #[must_use]
    pub const fn inverse(&self) -> &Matrix3 {
        &self.inverse
    }

    /// Map a point from the inner frame to the outer frame.
    #[inline]
    #[must_use]
    pub fn transform_point(&self, p: Vector2) -> Vector2 {
        self.matrix.transform_point(p)
    }

    /// Map a point from the outer frame back to the inner frame.
    #[inline]
    #[must_use]
    pub fn inverse_point(&self, p: Vector2) -> Vector2 {
        self.inverse.transform_point(p)
    }

    /// Map a displacement from the inner frame to the outer frame.
    #[inline]
    #[must_use]
    pub fn transform_delta(&self, v: Vector2) -> Vector2 {
        self.matrix.transform_delta(v)
    }

    /// Map a displacement from the outer frame back to the inner frame,
    /// without applying the translation component.
    #[inline]
    #[must_use]
    pub fn inverse_delta(&self, v: Vector2) -> Vector2 {
        self.inverse.transform_delta(v)
    }

    /// Compose `self` after `inner` (inner is applied first).
    #[must_use]
    pub fn then(&self, inner: &Transform) -> Transform {
        Transform {
            matrix: self.matrix.multiply(&inner.matrix),
            inverse: inner.inverse.multiply(&self.inverse),
        }
    }
}

// ---------------------------------------------------------------------------
// Bounds2
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle with inclusive edges.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds2 {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds2 {
    /// Create bounds from min/max coordinates.
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create bounds from an origin and a size.
    #[must_use]
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Width (may be negative for inverted bounds).
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height (may be negative for inverted bounds).
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True if `min <= max` on both axes.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Check if a point is inside (edges inclusive).
    #[inline]
    #[must_use]
    pub fn contains_point(&self, p: Vector2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// The nearest point inside the bounds.
    ///
    /// Each axis is clamped independently, so an axis that is already in
    /// range is returned unchanged.
    #[must_use]
    pub fn closest_point_to(&self, p: Vector2) -> Vector2 {
        Vector2::new(
            p.x.max(self.min_x).min(self.max_x),
            p.y.max(self.min_y).min(self.max_y),
        )
    }
}
