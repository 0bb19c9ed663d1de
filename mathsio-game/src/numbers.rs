//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Multiply a non-negative integer by a scalar and floor the result into `u32`.
///
/// Non-finite products and negative results collapse to 0; overflow saturates.
#[must_use]
pub fn floor_scaled_u32(value: u32, factor: f64) -> u32 {
    let product = f64::from(value) * factor;
    if !product.is_finite() || product <= 0.0 {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    cast::<f64, u32>(product.min(max).floor()).unwrap_or(u32::MAX)
}

/// Percentage of `part` over `whole`, rounded to the nearest integer.
///
/// Returns 0 when `whole` is zero.
#[must_use]
pub fn rounded_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = cast::<usize, f64>(part).unwrap_or(0.0);
    let whole = cast::<usize, f64>(whole).unwrap_or(1.0);
    let pct = (part / whole * 100.0).round().clamp(0.0, 100.0);
    cast::<f64, u32>(pct).unwrap_or(0)
}

/// Convert a `usize` count into `u32`, saturating at `u32::MAX`.
#[must_use]
pub fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_scaled_floors_and_guards() {
        assert_eq!(floor_scaled_u32(45, 1.5), 67);
        assert_eq!(floor_scaled_u32(10, 1.75), 17);
        assert_eq!(floor_scaled_u32(7, 1.0), 7);
        assert_eq!(floor_scaled_u32(0, 3.0), 0);
        assert_eq!(floor_scaled_u32(10, f64::NAN), 0);
        assert_eq!(floor_scaled_u32(u32::MAX, 2.0), u32::MAX);
    }

    #[test]
    fn percent_rounds_and_handles_empty() {
        assert_eq!(rounded_percent(0, 0), 0);
        assert_eq!(rounded_percent(2, 3), 67);
        assert_eq!(rounded_percent(10, 10), 100);
    }

    #[test]
    fn saturating_count_conversion() {
        assert_eq!(saturating_u32(12), 12);
    }
}
