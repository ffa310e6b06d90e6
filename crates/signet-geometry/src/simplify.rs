// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stroke simplification: recursive Douglas–Peucker over normalized points.

use signet_core::types::Point;

/// Default tolerance in normalized units.  Fine pen detail survives while
/// colinear sampling jitter is removed.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Reduce `points` to the subsequence that stays within `tolerance` of the
/// original polyline.
///
/// The first and last points are always kept and the original order is
/// preserved.  Strokes of two points or fewer are returned unchanged.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    mark_kept(points, 0, points.len() - 1, tolerance, &mut keep);

    points
        .iter()
        .zip(keep)
        .filter_map(|(point, kept)| kept.then_some(*point))
        .collect()
}

/// Mark the points between `first` and `last` (exclusive) that must survive.
///
/// Splitting at the farthest point and recursing on both halves is the same
/// as concatenating the simplified halves while dropping the shared point.
fn mark_kept(points: &[Point], first: usize, last: usize, tolerance: f64, keep: &mut [bool]) {
    if last <= first + 1 {
        return;
    }

    let start = points[first];
    let end = points[last];

    let mut max_distance = 0.0;
    let mut split = first;
    for (offset, point) in points[first + 1..last].iter().enumerate() {
        let distance = perpendicular_distance(*point, start, end);
        if distance > max_distance {
            max_distance = distance;
            split = first + 1 + offset;
        }
    }

    if max_distance > tolerance {
        keep[split] = true;
        mark_kept(points, first, split, tolerance, keep);
        mark_kept(points, split, last, tolerance, keep);
    }
}

/// Distance from `point` to the infinite line through `start` and `end`.
///
/// A zero-length chord has no direction, so the plain Euclidean distance to
/// `start` is used instead.
fn perpendicular_distance(point: Point, start: Point, end: Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = dx.hypot(dy);

    if length == 0.0 {
        return (point.x - start.x).hypot(point.y - start.y);
    }

    (dy * point.x - dx * point.y + end.x * start.y - end.y * start.x).abs() / length
}
