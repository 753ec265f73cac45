// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inverse transforms mapping device pixels back into paint space.

use peniko::kurbo::Affine;

/// Offset applied before inversion, so that fixed-point sampling rounds pixel centers correctly.
const ROUNDING_DELTA: f64 = 1.0 / 65536.0;

/// Largest coefficient magnitude for which the 16.16 fixed-point paths stay exact.
const FAST_MATRIX_LIMIT: f64 = 1e4;

#[inline]
fn fuzzy_null(v: f64) -> bool {
    v.abs() <= 1e-12
}

/// Classification of a transform, ordered by generality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformKind {
    /// The identity.
    #[default]
    Identity,
    /// A pure translation.
    Translate,
    /// Axis-aligned scale and translation.
    Scale,
    /// Rotation with optional uniform scale.
    Rotate,
    /// A general affine transform.
    Shear,
    /// A perspective transform.
    Project,
}

/// A 3x3 matrix in row-vector convention.
///
/// A point maps as `x' = m11 x + m21 y + dx`, `y' = m12 x + m22 y + dy` and
/// `w = m13 x + m23 y + m33`, with `x'` and `y'` divided by `w` for perspective transforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    /// Horizontal scale.
    pub m11: f64,
    /// Vertical shear.
    pub m12: f64,
    /// Horizontal projection.
    pub m13: f64,
    /// Horizontal shear.
    pub m21: f64,
    /// Vertical scale.
    pub m22: f64,
    /// Vertical projection.
    pub m23: f64,
    /// Horizontal translation.
    pub dx: f64,
    /// Vertical translation.
    pub dy: f64,
    /// Projection divisor.
    pub m33: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine> for Matrix {
    fn from(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self {
            m11: a,
            m12: b,
            m21: c,
            m22: d,
            dx: e,
            dy: f,
            ..Self::IDENTITY
        }
    }
}

impl Matrix {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        m11: 1.0,
        m12: 0.0,
        m13: 0.0,
        m21: 0.0,
        m22: 1.0,
        m23: 0.0,
        dx: 0.0,
        dy: 0.0,
        m33: 1.0,
    };

    /// A translation.
    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self {
            dx,
            dy,
            ..Self::IDENTITY
        }
    }

    /// Whether the matrix has no perspective component.
    #[inline]
    pub fn is_affine(&self) -> bool {
        fuzzy_null(self.m13) && fuzzy_null(self.m23) && fuzzy_null(self.m33 - 1.0)
    }

    /// Classify the matrix.
    pub fn kind(&self) -> TransformKind {
        if !self.is_affine() {
            return TransformKind::Project;
        }
        if !fuzzy_null(self.m12) || !fuzzy_null(self.m21) {
            let dot = self.m11 * self.m21 + self.m12 * self.m22;
            return if fuzzy_null(dot) {
                TransformKind::Rotate
            } else {
                TransformKind::Shear
            };
        }
        if !fuzzy_null(self.m11 - 1.0) || !fuzzy_null(self.m22 - 1.0) {
            return TransformKind::Scale;
        }
        if !fuzzy_null(self.dx) || !fuzzy_null(self.dy) {
            return TransformKind::Translate;
        }
        TransformKind::Identity
    }

    /// The matrix applying `self` first and then `other`.
    #[must_use]
    pub fn then(&self, other: &Self) -> Self {
        let a = self;
        let b = other;
        Self {
            m11: a.m11 * b.m11 + a.m12 * b.m21 + a.m13 * b.dx,
            m12: a.m11 * b.m12 + a.m12 * b.m22 + a.m13 * b.dy,
            m13: a.m11 * b.m13 + a.m12 * b.m23 + a.m13 * b.m33,
            m21: a.m21 * b.m11 + a.m22 * b.m21 + a.m23 * b.dx,
            m22: a.m21 * b.m12 + a.m22 * b.m22 + a.m23 * b.dy,
            m23: a.m21 * b.m13 + a.m22 * b.m23 + a.m23 * b.m33,
            dx: a.dx * b.m11 + a.dy * b.m21 + a.m33 * b.dx,
            dy: a.dx * b.m12 + a.dy * b.m22 + a.m33 * b.dy,
            m33: a.dx * b.m13 + a.dy * b.m23 + a.m33 * b.m33,
        }
    }

    /// The determinant.
    pub fn determinant(&self) -> f64 {
        self.m11 * (self.m33 * self.m22 - self.dy * self.m23)
            - self.m21 * (self.m33 * self.m12 - self.dy * self.m13)
            + self.dx * (self.m23 * self.m12 - self.m22 * self.m13)
    }

    /// The inverse, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if fuzzy_null(det) || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        if self.is_affine() {
            return Some(Self {
                m11: self.m22 * inv,
                m12: -self.m12 * inv,
                m21: -self.m21 * inv,
                m22: self.m11 * inv,
                dx: (self.m21 * self.dy - self.m22 * self.dx) * inv,
                dy: (self.m12 * self.dx - self.m11 * self.dy) * inv,
                ..Self::IDENTITY
            });
        }
        Some(Self {
            m11: (self.m22 * self.m33 - self.m23 * self.dy) * inv,
            m12: (self.m13 * self.dy - self.m12 * self.m33) * inv,
            m13: (self.m12 * self.m23 - self.m13 * self.m22) * inv,
            m21: (self.m23 * self.dx - self.m21 * self.m33) * inv,
            m22: (self.m11 * self.m33 - self.m13 * self.dx) * inv,
            m23: (self.m13 * self.m21 - self.m11 * self.m23) * inv,
            dx: (self.m21 * self.dy - self.m22 * self.dx) * inv,
            dy: (self.m12 * self.dx - self.m11 * self.dy) * inv,
            m33: (self.m11 * self.m22 - self.m12 * self.m21) * inv,
        })
    }

    /// Map a point, dividing by the homogeneous weight.
    pub fn map(&self, x: f64, y: f64) -> (f64, f64) {
        let mx = self.m11 * x + self.m21 * y + self.dx;
        let my = self.m12 * x + self.m22 * y + self.dy;
        if self.is_affine() {
            return (mx, my);
        }
        let w = self.m13 * x + self.m23 * y + self.m33;
        let w = if w == 0.0 { f64::EPSILON } else { w };
        (mx / w, my / w)
    }
}

/// The device-to-paint mapping used by samplers.
///
/// Built from the paint-to-device matrix of a draw. The inverse is taken after a translation by
/// 1/65536 so that fixed-point back-projection of pixel centers rounds consistently.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpanTransform {
    /// The inverse matrix.
    pub inverse: Matrix,
    /// Classification of the inverse.
    pub kind: TransformKind,
    /// Whether the inverse is affine with coefficients small enough for 16.16 stepping.
    pub fast_matrix: bool,
}

impl Default for SpanTransform {
    fn default() -> Self {
        Self::new(&Matrix::IDENTITY)
    }
}

impl SpanTransform {
    /// Set up the sampling transform for a paint placed by `matrix`.
    ///
    /// A singular matrix yields the identity.
    pub fn new(matrix: &Matrix) -> Self {
        let delta = Matrix::translate(ROUNDING_DELTA, ROUNDING_DELTA);
        let inverse = delta.then(matrix).inverse().unwrap_or_else(|| {
            log::debug!("singular paint transform, sampling with the identity");
            Matrix::IDENTITY
        });
        let f1 = inverse.m11 * inverse.m11 + inverse.m21 * inverse.m21;
        let f2 = inverse.m12 * inverse.m12 + inverse.m22 * inverse.m22;
        let fast_matrix = inverse.is_affine()
            && f1 < FAST_MATRIX_LIMIT
            && f2 < FAST_MATRIX_LIMIT
            && f1 > ROUNDING_DELTA
            && f2 > ROUNDING_DELTA
            && inverse.dx.abs() < FAST_MATRIX_LIMIT
            && inverse.dy.abs() < FAST_MATRIX_LIMIT;
        Self {
            inverse,
            kind: inverse.kind(),
            fast_matrix,
        }
    }

    /// Set up the sampling transform from an affine paint transform.
    pub fn from_affine(affine: Affine) -> Self {
        Self::new(&Matrix::from(affine))
    }
}

#[cfg(test)]
mod tests {
    use super::{Matrix, SpanTransform, TransformKind};
    use peniko::kurbo::Affine;

    #[test]
    fn classification() {
        assert_eq!(Matrix::IDENTITY.kind(), TransformKind::Identity);
        assert_eq!(Matrix::translate(3.0, 0.0).kind(), TransformKind::Translate);
        assert_eq!(Matrix::from(Affine::scale(2.0)).kind(), TransformKind::Scale);
        assert_eq!(Matrix::from(Affine::rotate(0.5)).kind(), TransformKind::Rotate);
        assert_eq!(Matrix::from(Affine::skew(0.5, 0.0)).kind(), TransformKind::Shear);
        let project = Matrix {
            m13: 0.001,
            ..Matrix::IDENTITY
        };
        assert_eq!(project.kind(), TransformKind::Project);
    }

    #[test]
    fn inverse_round_trips() {
        let m = Matrix {
            m13: 0.002,
            m23: -0.001,
            ..Matrix::from(Affine::rotate(0.3).then_translate((5.0, -2.0).into()))
        };
        let inv = m.inverse().unwrap();
        let (x, y) = m.map(10.0, 20.0);
        let (bx, by) = inv.map(x, y);
        assert!((bx - 10.0).abs() < 1e-9 && (by - 20.0).abs() < 1e-9);
    }

    #[test]
    fn translation_includes_rounding_offset() {
        let t = SpanTransform::from_affine(Affine::translate((4.0, 2.0)));
        assert_eq!(t.kind, TransformKind::Translate);
        assert!(t.fast_matrix);
        assert!((t.inverse.dx + 4.0 + 1.0 / 65536.0).abs() < 1e-12);
        assert!((t.inverse.dy + 2.0 + 1.0 / 65536.0).abs() < 1e-12);
    }

    #[test]
    fn huge_scale_is_not_fast() {
        let t = SpanTransform::from_affine(Affine::scale(1e-3));
        assert!(!t.fast_matrix);
    }
}
