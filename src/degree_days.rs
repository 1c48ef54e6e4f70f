/// Degree-day accumulation.
///
/// Converts a sequence of daily mean temperatures into one cumulative
/// degree-day count per metric. A day contributes only the part of its
/// temperature on the "wrong side" of the threshold: below it for the
/// freezing, heating, and below-zero indices, above it for the thawing
/// index. Contributions are clamped at zero, summed over the whole record,
/// and rounded half-to-even, so the result is always non-negative.

use crate::metrics::Metric;

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Sums clamped threshold deviations over a daily temperature series.
///
/// `count_below` selects the contributing direction: `threshold - t` when
/// true, `t - threshold` when false. Negative deltas are clamped to zero
/// before summation. An empty series yields 0.
pub fn accumulate(daily_temps: &[f64], threshold: f64, count_below: bool) -> i64 {
    let mut total = 0.0;
    for &temp in daily_temps {
        let delta = if count_below {
            threshold - temp
        } else {
            temp - threshold
        };
        if delta > 0.0 {
            total += delta;
        }
    }
    total.round_ties_even() as i64
}

/// Accumulates one named metric using its registered threshold and direction.
pub fn accumulate_metric(daily_temps: &[f64], metric: Metric) -> i64 {
    accumulate(daily_temps, metric.threshold_f(), metric.counts_below())
}

/// Cumulative air freezing index: degree days below 32°F.
pub fn freezing_index(daily_temps: &[f64]) -> i64 {
    accumulate_metric(daily_temps, Metric::FreezingIndex)
}

/// Cumulative heating degree days: degree days below 65°F.
pub fn heating_degree_days(daily_temps: &[f64]) -> i64 {
    accumulate_metric(daily_temps, Metric::Heating)
}

/// Cumulative degree days below 0°F.
pub fn below_zero_degree_days(daily_temps: &[f64]) -> i64 {
    accumulate_metric(daily_temps, Metric::BelowZero)
}

/// Cumulative air thawing index: degree days above 32°F.
pub fn thawing_index(daily_temps: &[f64]) -> i64 {
    accumulate_metric(daily_temps, Metric::ThawingIndex)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series_yields_zero() {
        assert_eq!(accumulate(&[], 32.0, true), 0);
        assert_eq!(accumulate(&[], 32.0, false), 0);
    }

    #[test]
    fn test_constant_series_at_threshold_yields_zero() {
        // A day exactly at the threshold contributes nothing in either
        // direction.
        let temps = [32.0; 365];
        assert_eq!(accumulate(&temps, 32.0, true), 0);
        assert_eq!(accumulate(&temps, 32.0, false), 0);
    }

    #[test]
    fn test_three_cold_days_below_freezing() {
        // 20°F is 12 degrees below 32°F; three such days accumulate 36.
        let temps = [20.0, 20.0, 20.0];
        assert_eq!(accumulate(&temps, 32.0, true), 36);
    }

    #[test]
    fn test_wrong_side_days_are_clamped_not_subtracted() {
        // Warm days must not cancel out cold days.
        let temps = [20.0, 50.0, 20.0];
        assert_eq!(accumulate(&temps, 32.0, true), 24);
        // Symmetric for the count-above direction.
        assert_eq!(accumulate(&temps, 32.0, false), 18);
    }

    #[test]
    fn test_output_is_never_negative() {
        let all_warm = [70.0, 80.0, 90.0];
        assert_eq!(accumulate(&all_warm, 32.0, true), 0);
        let all_cold = [-40.0, -20.0, 0.0];
        assert_eq!(accumulate(&all_cold, 32.0, false), 0);
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        // Two days at 20.25°F: deltas 11.75 + 11.75 = 23.5, which rounds to
        // the even integer 24.
        assert_eq!(accumulate(&[20.25, 20.25], 32.0, true), 24);
        // 10.75 + 11.75 = 22.5 rounds down to the even integer 22.
        assert_eq!(accumulate(&[21.25, 20.25], 32.0, true), 22);
    }

    #[test]
    fn test_metric_helpers_use_registered_parameters() {
        // One day at -10°F: 42 below freezing, 75 below the heating
        // threshold, 10 below zero, nothing thawing.
        let temps = [-10.0];
        assert_eq!(freezing_index(&temps), 42);
        assert_eq!(heating_degree_days(&temps), 75);
        assert_eq!(below_zero_degree_days(&temps), 10);
        assert_eq!(thawing_index(&temps), 0);
    }

    #[test]
    fn test_thawing_index_counts_above_threshold() {
        // 50°F is 18 above freezing; two days accumulate 36.
        assert_eq!(thawing_index(&[50.0, 50.0]), 36);
    }

    #[test]
    fn test_subdegree_contributions_accumulate() {
        // Fractional deviations sum before rounding; 0.3 * 10 = 3.
        let temps = [31.7; 10];
        assert_eq!(accumulate(&temps, 32.0, true), 3);
    }
}
