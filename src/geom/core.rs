use glam::Vec2;

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Scalar tolerance used by the 2D blend-space geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f32,
}

impl Tolerance {
    /// Default tolerance for barycentric inside tests (1e-4).
    pub const DEFAULT: Self = Self { eps: 1e-4 };

    /// Threshold on twice the triangle area below which a triangle counts as
    /// degenerate (1e-3).
    pub const DEGENERATE_AREA: Self = Self { eps: 1e-3 };

    /// Tolerance for zero-length segments and coincident samples (1e-6).
    pub const ZERO_LENGTH: Self = Self { eps: 1e-6 };

    #[must_use]
    pub const fn new(eps: f32) -> Self {
        Self { eps }
    }

    #[must_use]
    pub const fn eps_squared(self) -> f32 {
        self.eps * self.eps
    }

    #[must_use]
    pub fn approx_eq(self, a: f32, b: f32) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_point(self, a: Vec2, b: Vec2) -> bool {
        a.distance_squared(b) <= self.eps_squared()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Triangle predicates
// ─────────────────────────────────────────────────────────────────────────────

/// Twice the signed area of the triangle `(a, b, c)`.
///
/// Positive for counter-clockwise winding.
#[must_use]
pub fn orient2d(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Returns `true` when the triangle is too thin to interpolate across.
#[must_use]
pub fn is_degenerate_triangle(p0: Vec2, p1: Vec2, p2: Vec2) -> bool {
    orient2d(p0, p1, p2).abs() < Tolerance::DEGENERATE_AREA.eps
}

/// Barycentric weights of a point inside a triangle.
///
/// `u` belongs to `a`, `v` to `b` and `w` to `c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric {
    pub u: f32,
    pub v: f32,
    pub w: f32,
}

impl Barycentric {
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.u, self.v, self.w]
    }

    #[must_use]
    pub fn sum(self) -> f32 {
        self.u + self.v + self.w
    }
}

/// Tests whether `p` lies inside the triangle `(a, b, c)`.
///
/// The weights for `b` and `c` are solved with the dot-product form of the
/// barycentric system. Values that are negative by less than `epsilon` are
/// clamped to zero so that points on a shared edge are accepted by the first
/// triangle that tests them. Returns `None` for degenerate triangles and for
/// points outside.
#[must_use]
pub fn is_point_in_triangle(a: Vec2, b: Vec2, c: Vec2, p: Vec2, epsilon: f32) -> Option<Barycentric> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < f32::EPSILON {
        return None;
    }

    let mut v = (d11 * d20 - d01 * d21) / denom;
    let mut w = (d00 * d21 - d01 * d20) / denom;

    if v < 0.0 && v > -epsilon {
        v = 0.0;
    }
    if w < 0.0 && w > -epsilon {
        w = 0.0;
    }

    if v >= 0.0 && w >= 0.0 && v + w <= 1.0 + epsilon {
        let u = (1.0 - v - w).max(0.0);
        // Renormalize so that the clamped weights still sum to one.
        let total = u + v + w;
        Some(Barycentric {
            u: u / total,
            v: v / total,
            w: w / total,
        })
    } else {
        None
    }
}

/// Projects `pt` onto the segment `start..end`.
///
/// Returns the closest point and its parameter `u` in `[0, 1]`, where `u = 0`
/// is `start` and `u = 1` is `end`.
#[must_use]
pub fn closest_point_on_segment(start: Vec2, end: Vec2, pt: Vec2) -> (Vec2, f32) {
    let dir = end - start;
    let len_sq = dir.length_squared();
    if len_sq <= Tolerance::ZERO_LENGTH.eps_squared() {
        return (start, 0.0);
    }

    let u = ((pt - start).dot(dir) / len_sq).clamp(0.0, 1.0);
    (start + dir * u, u)
}

/// Axis-aligned bounds of a point set; `None` for an empty set.
#[must_use]
pub fn bounds(points: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
    )
}
