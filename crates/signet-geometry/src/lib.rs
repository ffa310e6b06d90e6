// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// signet-geometry: Pure geometry for signature capture.
//
// Provides canvas normalization, Douglas–Peucker stroke simplification, and
// deterministic synthesis of a smoothed vector path in a fixed viewport.
// Everything here is allocation-only with no shared state.

pub mod normalize;
pub mod path;
pub mod simplify;

pub use normalize::{CanvasSize, normalize_point, normalize_stroke, normalize_strokes};
pub use path::{VIEWPORT_HEIGHT, VIEWPORT_WIDTH, synthesize};
pub use simplify::{DEFAULT_TOLERANCE, simplify};

use signet_core::types::{SignatureData, SignaturePath, Stroke};

/// Simplify every stroke with `tolerance`, then synthesize the path.
pub fn render(data: &SignatureData, tolerance: f64) -> SignaturePath {
    let simplified: Vec<Stroke> = data
        .strokes
        .iter()
        .map(|stroke| simplify(stroke, tolerance))
        .collect();
    synthesize(&simplified)
}
