// SPDX: CC0-1.0

//! Grid spacing and axis label text.

use crate::Number;
use core::ops::Range;

/// Smallest "nice" step (1, 2 or 5 times a power of ten, in units) whose
/// on-screen spacing is at least `min_spacing` pixels.
///
/// Returns `None` when no finite step exists for the given scale.
pub fn grid_step(scale: Number, min_spacing: Number) -> Option<Number> {
    let raw = min_spacing.max(1.0) / scale;
    if !(raw.is_finite() && raw > 0.0) {
        return None;
    }
    let mag = (10.0 as Number).powf(raw.log10().floor());
    let norm = raw / mag;
    let nice = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    let step = nice * mag;
    (step.is_finite() && step > 0.0).then_some(step)
}

/// Multiples of `step` inside `range`, computed as `k * step` so long runs
/// do not accumulate rounding drift.
pub fn ticks(range: Range<Number>, step: Number) -> impl Iterator<Item = Number> {
    let (first, last) = if step.is_finite() && step > 0.0 && range.start <= range.end {
        ((range.start / step).ceil(), (range.end / step).floor())
    } else {
        (1.0, 0.0)
    };
    let count = if first.is_finite() && last.is_finite() && last >= first {
        (last - first) as usize + 1
    } else {
        0
    };
    (0..count).map(move |i| (first + i as Number) * step)
}

/// Digits past which `f64` formatting stops carrying information.
const MAX_DIGITS: i32 = 15;

fn decade(v: Number) -> Option<i32> {
    (v.is_finite() && v > 0.0).then(|| v.log10().floor() as i32)
}

/// Drop trailing mantissa zeros beyond the second fractional digit.
fn trim_mantissa(s: String) -> String {
    let Some((mantissa, exponent)) = s.split_once('e') else {
        return s;
    };
    let keep = mantissa.find('.').map_or(mantissa.len(), |dot| dot + 3);
    let trimmed = mantissa.trim_end_matches('0');
    format!("{}e{exponent}", &mantissa[..trimmed.len().max(keep)])
}

/// Format a standalone number, such as the scale readout.
///
/// Tiny and huge magnitudes switch to exponential notation with two
/// fractional digits; otherwise precision drops as the magnitude grows and
/// trailing zeros are removed.
pub fn format_number(value: Number) -> String {
    format_with(value, None)
}

/// Format a tick value whose neighbours are `step` away.
///
/// Same rules as [`format_number`], but never fewer digits than the step
/// needs, so adjacent ticks never print the same text.
pub fn format_label(value: Number, step: Number) -> String {
    format_with(value, decade(step))
}

fn format_with(value: Number, step_decade: Option<i32>) -> String {
    let mag = value.abs();
    if (mag < 1e-4 && value != 0.0) || mag >= 1e6 {
        let digits = match (decade(mag), step_decade) {
            (Some(m), Some(s)) => (m - s).clamp(2, MAX_DIGITS),
            _ => 2,
        } as usize;
        return trim_mantissa(format!("{value:.digits$e}"));
    }
    let by_magnitude = if mag < 10.0 {
        3
    } else if mag < 100.0 {
        2
    } else {
        1
    };
    let by_step = step_decade.map_or(0, |s| (-s).clamp(0, MAX_DIGITS));
    let precision = by_magnitude.max(by_step) as usize;
    let mut s = format!("{value:.precision$}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s.remove(0);
    }
    s
}
