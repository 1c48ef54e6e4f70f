/// Degree-day metric registry.
///
/// Defines the canonical set of degree-day metrics computed by this service,
/// along with their threshold and accumulation direction. This is the single
/// source of truth for metric parameters — all other modules should reference
/// metrics from here rather than hardcoding thresholds. The parameters are
/// passed into the accumulator explicitly; nothing here is mutable state.

use crate::model::StationClimatology;

/// One of the four cumulative degree-day indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    /// Degree days below 32°F. Proxy for frozen-ground intensity.
    FreezingIndex,
    /// Heating degree days, below 65°F.
    Heating,
    /// Degree days below 0°F.
    BelowZero,
    /// Degree days above 32°F. Proxy for ground-thaw intensity.
    ThawingIndex,
}

/// All metrics, in the order columns appear in the climatology tables.
pub const ALL_METRICS: [Metric; 4] = [
    Metric::FreezingIndex,
    Metric::Heating,
    Metric::BelowZero,
    Metric::ThawingIndex,
];

impl Metric {
    /// Temperature threshold in °F.
    pub fn threshold_f(&self) -> f64 {
        match self {
            Metric::FreezingIndex => 32.0,
            Metric::Heating => 65.0,
            Metric::BelowZero => 0.0,
            Metric::ThawingIndex => 32.0,
        }
    }

    /// Whether days below the threshold contribute. When false, days above
    /// the threshold contribute instead (thawing index only).
    pub fn counts_below(&self) -> bool {
        !matches!(self, Metric::ThawingIndex)
    }

    /// Short identifier used in SNAP API paths and output filenames.
    pub fn api_name(&self) -> &'static str {
        match self {
            Metric::FreezingIndex => "freezing_index",
            Metric::Heating => "heating",
            Metric::BelowZero => "below_zero",
            Metric::ThawingIndex => "thawing_index",
        }
    }

    /// Human-readable climatology label used in wide table column names,
    /// e.g. "CCSM4 rcp85 Air Freezing Index Climatology".
    pub fn climo_label(&self) -> &'static str {
        match self {
            Metric::FreezingIndex => "Air Freezing Index Climatology",
            Metric::Heating => "Heating Degree Days Climatology",
            Metric::BelowZero => "Degree Days Below 0F Climatology",
            Metric::ThawingIndex => "Air Thawing Index Climatology",
        }
    }

    /// Parses the short identifier back into a metric.
    pub fn from_api_name(name: &str) -> Option<Metric> {
        ALL_METRICS.into_iter().find(|m| m.api_name() == name)
    }

    /// Reads this metric's value out of an observed climatology row.
    pub fn value_of(&self, climo: &StationClimatology) -> i64 {
        match self {
            Metric::FreezingIndex => climo.freezing_index,
            Metric::Heating => climo.heating,
            Metric::BelowZero => climo.below_zero,
            Metric::ThawingIndex => climo.thawing_index,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
