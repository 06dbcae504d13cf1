use glam::Vec2;
use serde::Serialize;

use super::core::is_degenerate_triangle;

/// Three indices into the (normalized) sample position array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    #[must_use]
    pub const fn new(a: usize, b: usize, c: usize) -> Self {
        Self { indices: [a, b, c] }
    }

    #[must_use]
    pub fn vertices(&self, points: &[Vec2]) -> [Vec2; 3] {
        self.indices.map(|i| points[i])
    }

    #[must_use]
    pub fn contains_index(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    #[must_use]
    pub fn has_unique_indices(&self) -> bool {
        let [a, b, c] = self.indices;
        a != b && b != c && a != c
    }
}

/// Something that can turn a 2D point set into triangles.
///
/// Implementations must tolerate empty input, fewer than three points and
/// collinear or duplicate points, returning an empty list where no triangle
/// can be formed.
pub trait Triangulator {
    fn triangulate(&self, points: &[Vec2]) -> Vec<Triangle>;
}

/// Delaunay triangulation backed by `delaunator`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelaunayTriangulator;

impl Triangulator for DelaunayTriangulator {
    fn triangulate(&self, points: &[Vec2]) -> Vec<Triangle> {
        if points.len() < 3 {
            return Vec::new();
        }

        let delaunator_points: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point {
                x: f64::from(p.x),
                y: f64::from(p.y),
            })
            .collect();

        let triangulation = delaunator::triangulate(&delaunator_points);

        triangulation
            .triangles
            .chunks_exact(3)
            .map(|tri| Triangle::new(tri[0], tri[1], tri[2]))
            .filter(Triangle::has_unique_indices)
            .collect()
    }
}

/// Summary of a triangulation pass.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TriangulationReport {
    pub input_point_count: usize,
    pub triangle_count: usize,
    pub degenerate_triangle_count: usize,
}

impl TriangulationReport {
    #[must_use]
    pub fn has_degenerate_triangles(&self) -> bool {
        self.degenerate_triangle_count > 0
    }
}

/// Runs `triangulator` and counts degenerate output triangles.
///
/// Degenerate triangles are kept; they can never contain a query point, so
/// the locator skips them naturally.
pub fn triangulate_with_report<T: Triangulator + ?Sized>(
    triangulator: &T,
    points: &[Vec2],
) -> (Vec<Triangle>, TriangulationReport) {
    let triangles = triangulator.triangulate(points);
    let degenerate_triangle_count = triangles
        .iter()
        .filter(|tri| {
            let [a, b, c] = tri.vertices(points);
            is_degenerate_triangle(a, b, c)
        })
        .count();

    let report = TriangulationReport {
        input_point_count: points.len(),
        triangle_count: triangles.len(),
        degenerate_triangle_count,
    };
    (triangles, report)
}
