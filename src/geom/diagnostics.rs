//! Diagnostics for blend-space geometry.
//!
//! Collected every time the sample geometry of a blend space is rebuilt.
//! The flags are meant for authoring tools: they never change runtime
//! behaviour, the locator degrades to edge or point resolution on its own.
//!
//! # Example
//!
//! ```ignore
//! let diagnostics = GeometryDiagnostics::from_geometry(&positions, &report, &outer_edges);
//! if diagnostics.has_overlapping_coordinates {
//!     for warning in &diagnostics.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//! }
//! ```

use glam::Vec2;
use serde::Serialize;

use super::core::Tolerance;
use super::edges::Edge;
use super::triangulation::TriangulationReport;

/// Geometry health of one blend-space rebuild.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct GeometryDiagnostics {
    /// Number of valid samples that took part in the build.
    pub sample_count: usize,

    /// Number of triangles produced (always 0 for 1D blend spaces).
    pub triangle_count: usize,

    /// Number of boundary edges (2D) or segments (1D).
    pub boundary_count: usize,

    /// At least one triangle is thinner than the degeneracy threshold, or
    /// three or more distinct samples produced no triangle at all.
    pub has_degenerate_triangles: bool,

    /// Two or more samples share (almost) the same coordinates.
    pub has_overlapping_coordinates: bool,

    /// Human-readable descriptions of the flags above.
    pub warnings: Vec<String>,
}

impl GeometryDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics of a 2D build.
    #[must_use]
    pub fn from_geometry(positions: &[Vec2], report: &TriangulationReport, outer_edges: &[Edge]) -> Self {
        let mut diagnostics = Self {
            sample_count: positions.len(),
            triangle_count: report.triangle_count,
            boundary_count: outer_edges.len(),
            ..Self::default()
        };

        let overlapping = count_overlapping(positions, Tolerance::ZERO_LENGTH);
        if overlapping > 0 {
            diagnostics.has_overlapping_coordinates = true;
            diagnostics.add_warning(format!("{overlapping} samples share coordinates"));
        }

        if report.has_degenerate_triangles() {
            diagnostics.has_degenerate_triangles = true;
            diagnostics.add_warning(format!(
                "{} degenerate triangles",
                report.degenerate_triangle_count
            ));
        }

        if report.triangle_count == 0 && positions.len() - overlapping >= 3 {
            diagnostics.has_degenerate_triangles = true;
            diagnostics.add_warning("samples are collinear, no triangles could be built");
        }

        diagnostics
    }

    /// Diagnostics of a 1D build from the sorted sample values.
    #[must_use]
    pub fn from_sorted_values(sorted: &[f32]) -> Self {
        let mut diagnostics = Self {
            sample_count: sorted.len(),
            boundary_count: sorted.len().saturating_sub(1),
            ..Self::default()
        };

        let overlapping = sorted
            .windows(2)
            .filter(|pair| Tolerance::ZERO_LENGTH.approx_eq(pair[0], pair[1]))
            .count();
        if overlapping > 0 {
            diagnostics.has_overlapping_coordinates = true;
            diagnostics.add_warning(format!("{overlapping} samples share coordinates"));
        }

        diagnostics
    }

    /// Returns `true` if no issue was detected.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.has_degenerate_triangles && !self.has_overlapping_coordinates && self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Number of points that coincide with an earlier point.
fn count_overlapping(points: &[Vec2], tol: Tolerance) -> usize {
    points
        .iter()
        .enumerate()
        .filter(|(i, p)| points[..*i].iter().any(|q| tol.approx_eq_point(**p, *q)))
        .count()
}
