// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canvas normalization: raw device-pixel samples to resolution-independent
// [0, 1] coordinates.

use signet_core::types::{MIN_POINTS_PER_STROKE, Point, SignatureData, Stroke};

/// Size of the capture surface at the time the strokes were drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Map one raw canvas point into normalized space, clamping each axis to
/// `[0, 1]`.  A zero-sized (or non-finite) axis maps to 0.
pub fn normalize_point(raw: Point, canvas: CanvasSize) -> Point {
    Point::new(axis(raw.x, canvas.width), axis(raw.y, canvas.height))
}

fn axis(value: f64, extent: f64) -> f64 {
    if !extent.is_finite() || extent <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / extent).clamp(0.0, 1.0)
}

/// Normalize a single stroke.
pub fn normalize_stroke(raw: &[Point], canvas: CanvasSize) -> Stroke {
    raw.iter().map(|p| normalize_point(*p, canvas)).collect()
}

/// Normalize every stroke and drop degenerate ones (fewer than two points),
/// matching the rule the path synthesizer applies.
pub fn normalize_strokes(raw: &[Stroke], canvas: CanvasSize) -> SignatureData {
    let strokes = raw
        .iter()
        .filter(|stroke| stroke.len() >= MIN_POINTS_PER_STROKE)
        .map(|stroke| normalize_stroke(stroke, canvas))
        .collect();
    SignatureData::new(strokes)
}
