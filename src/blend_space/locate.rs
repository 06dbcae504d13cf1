//! Turns a query position into a location in the sample geometry and the
//! blend weights that follow from it.
//!
//! All sample references in a [`CurrentLocation`] are indices into the
//! resolved motion list of the node instance. Weights always sum to one.

use glam::Vec2;
use serde::Serialize;

use crate::geom::{Edge, Tolerance, Triangle, closest_point_on_segment, is_point_in_triangle};

/// Where the query position currently lies.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CurrentLocation {
    /// No samples are available.
    #[default]
    None,
    /// Snapped to a single sample.
    Point { sample: usize },
    /// Between two neighbouring samples: 1D segments, or the collinear
    /// fallback chain of a 2D blend space. `u = 0` is the first sample.
    Segment {
        index: usize,
        samples: [usize; 2],
        u: f32,
    },
    /// Clamped onto an outer edge of a 2D triangulation.
    Edge {
        index: usize,
        samples: [usize; 2],
        u: f32,
    },
    /// Inside a triangle with barycentric weights per corner.
    Triangle {
        index: usize,
        samples: [usize; 3],
        weights: [f32; 3],
    },
}

/// Contribution of one motion to the blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlendInfo {
    pub motion_index: usize,
    pub weight: f32,
}

impl CurrentLocation {
    /// Non-zero weights per motion, sorted by motion index.
    #[must_use]
    pub fn blend_infos(&self) -> Vec<BlendInfo> {
        let mut infos: Vec<BlendInfo> = match *self {
            Self::None => Vec::new(),
            Self::Point { sample } => vec![BlendInfo {
                motion_index: sample,
                weight: 1.0,
            }],
            Self::Segment { samples, u, .. } | Self::Edge { samples, u, .. } => {
                let u = u.clamp(0.0, 1.0);
                vec![
                    BlendInfo {
                        motion_index: samples[0],
                        weight: 1.0 - u,
                    },
                    BlendInfo {
                        motion_index: samples[1],
                        weight: u,
                    },
                ]
            }
            Self::Triangle {
                samples, weights, ..
            } => samples
                .iter()
                .zip(weights)
                .map(|(&motion_index, weight)| BlendInfo {
                    motion_index,
                    weight,
                })
                .collect(),
        };

        infos.retain(|info| info.weight > 0.0);
        infos.sort_by_key(|info| info.motion_index);
        infos.dedup_by(|next, prev| {
            if next.motion_index == prev.motion_index {
                prev.weight += next.weight;
                true
            } else {
                false
            }
        });
        infos
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Locates `x` among the samples. `sorted` lists sample indices ordered by
/// their value in `values`. Queries outside the range snap to the nearest
/// end.
#[must_use]
pub fn locate_1d(sorted: &[usize], values: &[f32], x: f32) -> CurrentLocation {
    let value = |slot: usize| values[sorted[slot]];

    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return CurrentLocation::None;
    };
    if sorted.len() == 1 || x <= values[first] {
        return CurrentLocation::Point { sample: first };
    }
    if x >= values[last] {
        return CurrentLocation::Point { sample: last };
    }

    for index in 0..sorted.len() - 1 {
        let (lo, hi) = (value(index), value(index + 1));
        if x >= lo && x <= hi {
            let length = hi - lo;
            let u = if length > Tolerance::ZERO_LENGTH.eps {
                (x - lo) / length
            } else {
                0.0
            };
            return CurrentLocation::Segment {
                index,
                samples: [sorted[index], sorted[index + 1]],
                u,
            };
        }
    }

    CurrentLocation::Point { sample: last }
}

/// Geometry of a 2D blend space in normalized coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Geometry2D<'a> {
    pub points: &'a [Vec2],
    pub triangles: &'a [Triangle],
    pub outer_edges: &'a [Edge],
    /// Samples ordered along their principal axis; used when no triangles
    /// could be built.
    pub fallback_chain: &'a [usize],
}

/// Locates a normalized `query` in the 2D geometry.
///
/// Inside a triangle the barycentric weights are used. Outside, the query
/// is clamped onto the nearest outer edge; on equal distance the first edge
/// wins. Without triangles the fallback chain is searched the same way.
#[must_use]
pub fn locate_2d(geometry: &Geometry2D<'_>, query: Vec2) -> CurrentLocation {
    let points = geometry.points;
    if points.is_empty() {
        return CurrentLocation::None;
    }

    for (index, triangle) in geometry.triangles.iter().enumerate() {
        let [a, b, c] = triangle.vertices(points);
        if let Some(bary) = is_point_in_triangle(a, b, c, query, Tolerance::DEFAULT.eps) {
            return CurrentLocation::Triangle {
                index,
                samples: triangle.indices,
                weights: bary.to_array(),
            };
        }
    }

    if !geometry.outer_edges.is_empty() {
        let edges = geometry.outer_edges.iter().map(|edge| edge.indices());
        if let Some((index, samples, u)) = nearest_segment(points, edges, query) {
            return CurrentLocation::Edge { index, samples, u };
        }
    }

    let chain = geometry.fallback_chain;
    if chain.len() >= 2 {
        let segments = chain.windows(2).map(|pair| [pair[0], pair[1]]);
        if let Some((index, samples, u)) = nearest_segment(points, segments, query) {
            return CurrentLocation::Segment { index, samples, u };
        }
    }

    CurrentLocation::Point {
        sample: chain.first().copied().unwrap_or(0),
    }
}

fn nearest_segment(
    points: &[Vec2],
    segments: impl Iterator<Item = [usize; 2]>,
    query: Vec2,
) -> Option<(usize, [usize; 2], f32)> {
    let mut best: Option<(f32, usize, [usize; 2], f32)> = None;
    for (index, samples) in segments.enumerate() {
        let (closest, u) = closest_point_on_segment(points[samples[0]], points[samples[1]], query);
        let distance = closest.distance_squared(query);
        if best.is_none_or(|(best_distance, ..)| distance < best_distance) {
            best = Some((distance, index, samples, u));
        }
    }
    best.map(|(_, index, samples, u)| (index, samples, u))
}

/// Orders samples along the direction in which they spread the most.
#[must_use]
pub fn principal_axis_chain(points: &[Vec2]) -> Vec<usize> {
    let Some(&origin) = points.first() else {
        return Vec::new();
    };
    let far = points
        .iter()
        .copied()
        .max_by(|a, b| a.distance_squared(origin).total_cmp(&b.distance_squared(origin)))
        .unwrap_or(origin);
    let direction = far - origin;

    let mut chain: Vec<usize> = (0..points.len()).collect();
    chain.sort_by(|&a, &b| {
        let pa = (points[a] - origin).dot(direction);
        let pb = (points[b] - origin).dot(direction);
        pa.total_cmp(&pb).then(a.cmp(&b))
    });
    chain
}
