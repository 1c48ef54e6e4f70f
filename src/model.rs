/// Core data types for the degree-day climatology service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O and no external collaborators — only types, the
/// flatten/nest helpers for the projection grid, and the service error enum.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Reference periods and quality thresholds
// ---------------------------------------------------------------------------

/// Historical reference period used for both the WRCC normals and the
/// modeled baseline climatologies.
pub const HISTORICAL_START: u16 = 1981;
pub const HISTORICAL_END: u16 = 2010;

/// Projection period covered by the SNAP future degree-day grids.
pub const PROJECTION_START: u16 = 2020;
pub const PROJECTION_END: u16 = 2099;

/// Stations whose median years of observation fall below this are excluded
/// from all downstream use.
pub const MIN_YEARS_OF_OBSERVATION: i64 = 20;

// ---------------------------------------------------------------------------
// Station record types
// ---------------------------------------------------------------------------

/// One observation day from a WRCC 1981-2010 daily normals table.
///
/// Temperatures are in °F, precipitation in inches. A field is `None` when
/// the source row left it blank — the normals tables have gaps at stations
/// with short records. The `num_years_*` fields carry how many years of
/// observation back each averaged value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub doy: u16,
    pub month: u8,
    pub day: u8,
    pub tmax: Option<f64>,
    pub num_years_tmax: u32,
    pub tmin: Option<f64>,
    pub num_years_tmin: u32,
    pub precip: Option<f64>,
    pub num_years_precip: u32,
    pub sdmax: Option<f64>,
    pub sdmin: Option<f64>,
}

impl DailyRecord {
    /// Daily mean temperature, or `None` if either extreme is missing.
    /// Missing-value handling is the caller's policy decision — this never
    /// substitutes a value.
    pub fn temp_mean(&self) -> Option<f64> {
        match (self.tmax, self.tmin) {
            (Some(hi), Some(lo)) => Some((hi + lo) / 2.0),
            _ => None,
        }
    }

    /// Years of record backing this day's temperatures: the smaller of the
    /// tmax and tmin counts, so a gate on the result holds for both fields.
    pub fn temp_years(&self) -> u32 {
        self.num_years_tmax.min(self.num_years_tmin)
    }
}

/// One row of the observed climatology table: the four degree-day metrics
/// for a station, reduced from its full daily record, plus the data-quality
/// measure used to gate downstream use. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationClimatology {
    pub station_id: String,
    pub freezing_index: i64,
    pub heating: i64,
    pub below_zero: i64,
    pub thawing_index: i64,
    pub median_years_of_observation: i64,
}

impl StationClimatology {
    /// Whether this station's record is long enough to serve as a
    /// bias-correction baseline.
    pub fn meets_record_length(&self) -> bool {
        self.median_years_of_observation >= MIN_YEARS_OF_OBSERVATION
    }
}

// ---------------------------------------------------------------------------
// Projection grid types
// ---------------------------------------------------------------------------

/// Leaf value of a SNAP degree-day response: `{"dd": <value>}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DdValue {
    pub dd: f64,
}

/// The three-level nested structure returned by the SNAP degree-day API:
/// model → scenario → year → `{dd: value}`. Used verbatim for both the
/// historical range and the future projections.
pub type DegreeDayGrid = BTreeMap<String, BTreeMap<String, BTreeMap<String, DdValue>>>;

/// Modeled baseline climatologies for one station and one metric:
/// (model, scenario) → mean degree days over the historical period.
pub type BaselineTable = BTreeMap<(String, String), i64>;

/// Tagged key for one leaf of a projection grid.
///
/// The corrector flattens the nested grid to a single map keyed by this
/// tuple, transforms the flat map, and re-nests only at the end. Working on
/// the flat form sidesteps the aliasing hazards of mutating nested maps in
/// place.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProjectionKey {
    pub model: String,
    pub scenario: String,
    pub year: String,
}

/// Flattens a nested grid into a map keyed by (model, scenario, year).
pub fn flatten_grid(grid: &DegreeDayGrid) -> BTreeMap<ProjectionKey, f64> {
    let mut flat = BTreeMap::new();
    for (model, scenarios) in grid {
        for (scenario, years) in scenarios {
            for (year, value) in years {
                flat.insert(
                    ProjectionKey {
                        model: model.clone(),
                        scenario: scenario.clone(),
                        year: year.clone(),
                    },
                    value.dd,
                );
            }
        }
    }
    flat
}

/// Rebuilds the nested grid from a flat map. Inverse of `flatten_grid` for
/// any map whose keys came from a real grid.
pub fn nest_grid(flat: &BTreeMap<ProjectionKey, f64>) -> DegreeDayGrid {
    let mut grid: DegreeDayGrid = BTreeMap::new();
    for (key, value) in flat {
        grid.entry(key.model.clone())
            .or_default()
            .entry(key.scenario.clone())
            .or_default()
            .insert(key.year.clone(), DdValue { dd: *value });
    }
    grid
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when scraping, fetching, or transforming
/// degree-day data.
///
/// Per-station and per-metric failures are caught at the unit boundary by
/// the batch drivers in `pipeline` — only `MissingTable` is intended to
/// abort a run.
#[derive(Debug, Clone, PartialEq)]
pub enum DegDayError {
    /// Non-2xx HTTP response from WRCC or the SNAP API.
    HttpStatus(u16),
    /// Transport-level request failure (connection, timeout, TLS).
    Request(String),
    /// A response body could not be parsed.
    Parse(String),
    /// A daily-normals row could not be interpreted.
    MalformedRecord {
        station: String,
        line: usize,
        detail: String,
    },
    /// The upstream source returned nothing usable for this unit of work.
    /// Callers must treat the unit as absent, never as zero.
    NoData(String),
    /// A future projection references a (model, scenario) with no matching
    /// baseline climatology. This is an upstream contract breach between the
    /// historical and future data sources, distinct from unavailability.
    KeyAlignment {
        metric: String,
        model: String,
        scenario: String,
    },
    /// A required input table is entirely missing. The only batch-fatal case.
    MissingTable(String),
    /// Local filesystem failure while reading or writing persisted tables.
    Io(String),
}

impl fmt::Display for DegDayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegDayError::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            DegDayError::Request(msg) => write!(f, "Request failed: {}", msg),
            DegDayError::Parse(msg) => write!(f, "Parse error: {}", msg),
            DegDayError::MalformedRecord {
                station,
                line,
                detail,
            } => write!(
                f,
                "Malformed record for station {} at line {}: {}",
                station, line, detail
            ),
            DegDayError::NoData(what) => write!(f, "No data available: {}", what),
            DegDayError::KeyAlignment {
                metric,
                model,
                scenario,
            } => write!(
                f,
                "Key alignment violation for {}: no baseline for model '{}' scenario '{}'",
                metric, model, scenario
            ),
            DegDayError::MissingTable(what) => write!(f, "Required table missing: {}", what),
            DegDayError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for DegDayError {}

pub type Result<T> = std::result::Result<T, DegDayError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_temps(tmax: Option<f64>, tmin: Option<f64>) -> DailyRecord {
        DailyRecord {
            doy: 1,
            month: 1,
            day: 1,
            tmax,
            num_years_tmax: 25,
            tmin,
            num_years_tmin: 23,
            precip: Some(0.1),
            num_years_precip: 25,
            sdmax: None,
            sdmin: None,
        }
    }

    #[test]
    fn test_temp_mean_averages_extremes() {
        let rec = record_with_temps(Some(40.0), Some(20.0));
        assert_eq!(rec.temp_mean(), Some(30.0));
    }

    #[test]
    fn test_temp_mean_is_none_when_either_extreme_missing() {
        assert_eq!(record_with_temps(None, Some(20.0)).temp_mean(), None);
        assert_eq!(record_with_temps(Some(40.0), None).temp_mean(), None);
        assert_eq!(record_with_temps(None, None).temp_mean(), None);
    }

    #[test]
    fn test_temp_years_takes_minimum_of_both_counts() {
        // Gate on the minimum so both fields independently meet the
        // record-length threshold.
        let rec = record_with_temps(Some(40.0), Some(20.0));
        assert_eq!(rec.temp_years(), 23);
    }

    #[test]
    fn test_record_length_gate() {
        let mut climo = StationClimatology {
            station_id: "500546".to_string(),
            freezing_index: 3000,
            heating: 12000,
            below_zero: 400,
            thawing_index: 2500,
            median_years_of_observation: 20,
        };
        assert!(climo.meets_record_length(), "exactly 20 years should pass");
        climo.median_years_of_observation = 19;
        assert!(!climo.meets_record_length(), "19 years should be excluded");
    }

    #[test]
    fn test_flatten_then_nest_round_trips() {
        let mut grid: DegreeDayGrid = BTreeMap::new();
        grid.entry("CCSM4".to_string())
            .or_default()
            .entry("rcp45".to_string())
            .or_default()
            .insert("2020".to_string(), DdValue { dd: 101.0 });
        grid.entry("CCSM4".to_string())
            .or_default()
            .entry("rcp85".to_string())
            .or_default()
            .insert("2020".to_string(), DdValue { dd: 88.5 });
        grid.entry("GFDL-CM3".to_string())
            .or_default()
            .entry("rcp45".to_string())
            .or_default()
            .insert("2021".to_string(), DdValue { dd: -12.0 });

        let flat = flatten_grid(&grid);
        assert_eq!(flat.len(), 3, "three leaves should flatten to three keys");
        assert_eq!(
            flat.get(&ProjectionKey {
                model: "CCSM4".to_string(),
                scenario: "rcp85".to_string(),
                year: "2020".to_string(),
            }),
            Some(&88.5)
        );
        assert_eq!(nest_grid(&flat), grid);
    }

    #[test]
    fn test_flatten_empty_grid_is_empty() {
        let grid: DegreeDayGrid = BTreeMap::new();
        assert!(flatten_grid(&grid).is_empty());
    }

    #[test]
    fn test_dd_value_serde_shape() {
        // The API leaf is exactly {"dd": <number>}.
        let value: DdValue = serde_json::from_str(r#"{"dd": 42.5}"#).unwrap();
        assert_eq!(value.dd, 42.5);
        assert_eq!(
            serde_json::to_string(&DdValue { dd: 7.0 }).unwrap(),
            r#"{"dd":7.0}"#
        );
    }

    #[test]
    fn test_error_display_distinguishes_alignment_from_io() {
        let alignment = DegDayError::KeyAlignment {
            metric: "freezing_index".to_string(),
            model: "CCSM4".to_string(),
            scenario: "rcp85".to_string(),
        };
        let msg = alignment.to_string();
        assert!(msg.contains("Key alignment violation"), "got: {}", msg);
        assert!(msg.contains("CCSM4") && msg.contains("rcp85"));

        let transient = DegDayError::HttpStatus(503);
        assert!(transient.to_string().contains("503"));
    }
}
