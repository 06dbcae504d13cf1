mod core;
mod diagnostics;
mod edges;
mod normalize;
mod triangulation;

pub use core::{
    Barycentric, Tolerance, bounds, closest_point_on_segment, is_degenerate_triangle,
    is_point_in_triangle, orient2d,
};
pub use diagnostics::GeometryDiagnostics;
pub use edges::{Edge, EdgeError, is_single_closed_loop, outer_edges, try_outer_edges};
pub use normalize::Normalization;
pub use triangulation::{
    DelaunayTriangulator, Triangle, TriangulationReport, Triangulator, triangulate_with_report,
};
