// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Path synthesis: normalized strokes to a single SVG path-data string in
// the canonical 600×200 viewport.
//
// Smoothing rule: every interior sample is a quadratic control point and
// each curve ends on the midpoint between that sample and the next one.  The
// final curve ends on the true last sample.  Two-point strokes become a
// straight line.  Numbers carry exactly one fractional digit.
//
// The output is persisted as the legal record of what was signed, so it
// must be byte-identical for identical input on every platform.

use std::fmt::Write;

use signet_core::types::{Point, SignaturePath, Stroke};

/// Canonical viewport width.
pub const VIEWPORT_WIDTH: f64 = 600.0;
/// Canonical viewport height.
pub const VIEWPORT_HEIGHT: f64 = 200.0;

/// Convert strokes into one path.  Strokes shorter than two points add
/// nothing; strokes are joined in drawing order with no smoothing across
/// them.
pub fn synthesize(strokes: &[Stroke]) -> SignaturePath {
    let commands: Vec<String> = strokes
        .iter()
        .filter_map(|stroke| stroke_commands(stroke))
        .collect();
    SignaturePath::new(commands.join(" "))
}

/// Commands for one stroke, or `None` for a degenerate stroke.
fn stroke_commands(stroke: &[Point]) -> Option<String> {
    if stroke.len() < 2 {
        return None;
    }

    let scaled: Vec<Point> = stroke.iter().map(|p| scale(*p)).collect();
    let n = scaled.len();

    let mut out = String::new();
    push_command(&mut out, 'M', &[scaled[0]]);

    if n == 2 {
        push_command(&mut out, 'L', &[scaled[1]]);
        return Some(out);
    }

    for i in 1..n - 1 {
        push_command(&mut out, 'Q', &[scaled[i], midpoint(scaled[i], scaled[i + 1])]);
    }
    push_command(&mut out, 'Q', &[scaled[n - 2], scaled[n - 1]]);

    Some(out)
}

fn scale(p: Point) -> Point {
    Point::new(p.x * VIEWPORT_WIDTH, p.y * VIEWPORT_HEIGHT)
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

fn push_command(out: &mut String, command: char, points: &[Point]) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push(command);
    for p in points {
        // Writing into a String cannot fail.
        let _ = write!(out, " {} {}", fixed1(p.x), fixed1(p.y));
    }
}

/// One fractional digit, ties rounded away from zero.
///
/// Rounding is decided on the exact binary value.  `{:.1}` already rounds
/// that value correctly except on exact ties, where it picks the even digit.
/// A binary double lies exactly halfway between two tenths only when it is
/// an odd multiple of 0.25, so those alone are rounded away from zero by
/// hand.  Scaling by ten first would round twice: 1.45 is stored as
/// 1.44999999999999995559 and must render as "1.4".
fn fixed1(value: f64) -> String {
    let quarters = value * 4.0;
    let exact_tie = quarters.fract() == 0.0 && quarters % 2.0 != 0.0;

    let out = if exact_tie {
        // value * 10 is an exact half here, so `round` sees the true tie.
        let rounded = (value * 10.0).round() / 10.0;
        format!("{rounded:.1}")
    } else {
        format!("{value:.1}")
    };

    // Avoid "-0.0" for tiny negative inputs.
    if out == "-0.0" { "0.0".to_string() } else { out }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(coords: &[(f64, f64)]) -> Stroke {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn two_point_stroke_is_a_line() {
        let path = synthesize(&[stroke(&[(0.0, 0.0), (1.0, 1.0)])]);
        assert_eq!(path.as_str(), "M 0.0 0.0 L 600.0 200.0");
    }

    #[test]
    fn three_point_stroke_curves_through_midpoint() {
        let path = synthesize(&[stroke(&[(0.0, 0.0), (0.5, 0.5), (1.0, 0.0)])]);
        // Control (300,100) ending at midpoint (450,50), then the closing
        // curve from control (300,100) to the true last point.
        assert_eq!(
            path.as_str(),
            "M 0.0 0.0 Q 300.0 100.0 450.0 50.0 Q 300.0 100.0 600.0 0.0"
        );
    }

    #[test]
    fn four_point_stroke() {
        let path = synthesize(&[stroke(&[(0.0, 0.0), (0.1, 0.5), (0.2, 0.0), (0.3, 0.5)])]);
        assert_eq!(
            path.as_str(),
            "M 0.0 0.0 Q 60.0 100.0 90.0 50.0 Q 120.0 0.0 150.0 50.0 Q 120.0 0.0 180.0 100.0"
        );
    }

    #[test]
    fn degenerate_strokes_contribute_nothing() {
        assert!(synthesize(&[stroke(&[(0.5, 0.5)])]).is_empty());
        assert!(synthesize(&[stroke(&[]), stroke(&[(0.1, 0.1)])]).is_empty());
        assert!(synthesize(&[]).is_empty());

        let mixed = synthesize(&[stroke(&[(0.9, 0.9)]), stroke(&[(0.0, 0.0), (1.0, 1.0)])]);
        assert_eq!(mixed.as_str(), "M 0.0 0.0 L 600.0 200.0");
    }

    #[test]
    fn strokes_concatenate_in_order() {
        let path = synthesize(&[
            stroke(&[(0.0, 0.0), (1.0, 1.0)]),
            stroke(&[(0.0, 1.0), (1.0, 0.0)]),
        ]);
        assert_eq!(
            path.as_str(),
            "M 0.0 0.0 L 600.0 200.0 M 0.0 200.0 L 600.0 0.0"
        );
    }

    #[test]
    fn coordinates_have_one_fractional_digit() {
        let path = synthesize(&[stroke(&[(0.123456, 0.987654), (0.000001, 0.333333)])]);
        assert_eq!(path.as_str(), "M 74.1 197.5 L 0.0 66.7");
    }

    #[test]
    fn ties_round_away_from_zero() {
        assert_eq!(fixed1(0.25), "0.3");
        assert_eq!(fixed1(0.75), "0.8");
        assert_eq!(fixed1(2.0), "2.0");
        assert_eq!(fixed1(-0.01), "0.0");
        assert_eq!(fixed1(-0.25), "-0.3");
        assert_eq!(fixed1(-0.04), "0.0");
    }

    #[test]
    fn values_just_below_a_tie_round_down() {
        // Stored as 1.44999999999999995559 and 0.34999999999999997780.
        assert_eq!(fixed1(1.45), "1.4");
        assert_eq!(fixed1(0.35), "0.3");
        // Stored as 1.45000000000000017764: just above the tie.
        assert_eq!(fixed1(1.4500000000000002), "1.5");
    }

    #[test]
    fn scaled_coordinate_just_below_a_tie_rounds_down() {
        // 0.0017499999999999998 * 200 is the double nearest 0.35, which is
        // slightly below it.
        let path = synthesize(&[stroke(&[(0.0, 0.0), (0.0, 0.0017499999999999998)])]);
        assert_eq!(path.as_str(), "M 0.0 0.0 L 0.0 0.3");
    }

    #[test]
    fn synthesis_is_deterministic() {
        let strokes = vec![
            stroke(&[(0.1, 0.2), (0.15, 0.35), (0.3, 0.31), (0.42, 0.6)]),
            stroke(&[(0.5, 0.5), (0.7, 0.1)]),
        ];
        assert_eq!(synthesize(&strokes), synthesize(&strokes.clone()));
    }
}
