//! Checked casts between resource amounts, piece counts and the floating
//! point scores used by action evaluation.

use num_traits::cast::cast;

/// Resource amount as a score term.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert a count to f64 for effect estimates.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a count to i64, saturating at `i64::MAX`.
#[must_use]
pub fn usize_to_i64(value: usize) -> i64 {
    cast::<usize, i64>(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_clamp_instead_of_wrapping() {
        assert_eq!(usize_to_i64(usize::MAX), i64::MAX);
        assert!((usize_to_f64(4) - 4.0).abs() < f64::EPSILON);
        assert!((i64_to_f64(-2) + 2.0).abs() < f64::EPSILON);
    }
}
