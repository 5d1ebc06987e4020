//! Year intervals and tolerance checks shared by the resolver and the reconciler.

use crate::model::YearBound;

pub const UNKNOWN_START_YEAR: i32 = 1900;
pub const OPEN_END_YEAR: i32 = 2100;

pub const HP_TOLERANCE: i64 = 8;
pub const TORQUE_TOLERANCE: i64 = 25;
pub const CYLINDER_TOLERANCE: f64 = 0.21;

/// Float slack so that "1.6" vs "1.4" counts as 0.2.
const EPSILON: f64 = 1e-9;

fn half_open_overlap(start_a: i32, end_a: i32, start_b: i32, end_b: i32) -> bool {
    (start_a <= end_b && end_a > start_b) || (start_b < end_a && end_b >= start_a)
}

/// Overlap test between two year ranges. The half-open check is evaluated
/// from both sides so the relation does not depend on argument order.
pub fn intervals_intersect(start_a: i32, end_a: i32, start_b: i32, end_b: i32) -> bool {
    half_open_overlap(start_a, end_a, start_b, end_b) || half_open_overlap(start_b, end_b, start_a, end_a)
}

pub fn start_year(bound: YearBound) -> i32 {
    match bound {
        YearBound::Year(y) => y,
        YearBound::Unknown | YearBound::Present => UNKNOWN_START_YEAR,
    }
}

pub fn end_year(bound: YearBound) -> i32 {
    match bound {
        YearBound::Year(y) => y,
        YearBound::Unknown | YearBound::Present => OPEN_END_YEAR,
    }
}

/// Widening factor for the hp/torque margins. The less we know about an
/// engine's production years, the looser the power comparison.
pub fn confidence_coefficient(from: YearBound, to: YearBound) -> i64 {
    match (from.is_unknown(), to.is_unknown()) {
        (true, true) => 3,
        (true, false) => 2,
        _ => 1,
    }
}

pub fn hp_within_tolerance(a: Option<i64>, b: Option<i64>, coefficient: i64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.abs_diff(b) <= (coefficient * HP_TOLERANCE).unsigned_abs(),
        _ => true,
    }
}

pub fn torque_within_tolerance(a: Option<i64>, b: Option<i64>, coefficient: i64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.abs_diff(b) <= (coefficient * TORQUE_TOLERANCE).unsigned_abs(),
        _ => true,
    }
}

/// Absolute difference between two "D.D" cylinder strings.
pub fn cylinder_difference(a: Option<&str>, b: Option<&str>) -> Option<f64> {
    let a: f64 = a?.trim().parse().ok()?;
    let b: f64 = b?.trim().parse().ok()?;
    Some((a - b).abs())
}

pub fn cylinder_within_tolerance(a: Option<&str>, b: Option<&str>) -> bool {
    match cylinder_difference(a, b) {
        Some(diff) => diff <= CYLINDER_TOLERANCE + EPSILON,
        None => true,
    }
}

/// 3 for the same displacement, 2 within 0.13 l, 1 within 0.2 l.
pub fn cylinder_score(a: Option<&str>, b: Option<&str>) -> u32 {
    match cylinder_difference(a, b) {
        Some(diff) if diff <= EPSILON => 3,
        Some(diff) if diff <= 0.13 + EPSILON => 2,
        Some(diff) if diff <= 0.2 + EPSILON => 1,
        _ => 0,
    }
}
