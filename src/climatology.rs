/// Station climatology builder.
///
/// Reduces one station's full daily-normals record to a single climatology
/// row: the four degree-day metrics accumulated over the daily mean
/// temperature series, plus the median years of observation used downstream
/// as a data-quality gate. The builder always returns a row when given valid
/// input — the record-length filter is applied by consumers, and per-station
/// failures are isolated by the batch driver, not here.

use crate::degree_days::accumulate_metric;
use crate::metrics::ALL_METRICS;
use crate::model::{DailyRecord, DegDayError, Result, StationClimatology};

// ---------------------------------------------------------------------------
// Missing-value policy
// ---------------------------------------------------------------------------

/// What to do with a day whose tmax or tmin is missing.
///
/// The normals tables have occasional blank temperature fields at stations
/// with short records. Neither option fabricates a value: `Skip` drops the
/// day from the mean series, `FailStation` rejects the whole station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValuePolicy {
    Skip,
    FailStation,
}

impl MissingValuePolicy {
    /// Parses the policy name used in the configuration file.
    pub fn from_name(name: &str) -> Option<MissingValuePolicy> {
        match name {
            "skip" => Some(MissingValuePolicy::Skip),
            "fail-station" => Some(MissingValuePolicy::FailStation),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds the climatology row for one station from its daily records.
pub fn build_station_climatology(
    station_id: &str,
    records: &[DailyRecord],
    policy: MissingValuePolicy,
) -> Result<StationClimatology> {
    let temps = daily_mean_series(station_id, records, policy)?;

    let mut values = [0i64; 4];
    for (slot, metric) in values.iter_mut().zip(ALL_METRICS) {
        *slot = accumulate_metric(&temps, metric);
    }

    Ok(StationClimatology {
        station_id: station_id.to_string(),
        freezing_index: values[0],
        heating: values[1],
        below_zero: values[2],
        thawing_index: values[3],
        median_years_of_observation: median_years(records),
    })
}

/// Extracts the daily mean temperature series, applying the missing-value
/// policy to days with a blank extreme.
fn daily_mean_series(
    station_id: &str,
    records: &[DailyRecord],
    policy: MissingValuePolicy,
) -> Result<Vec<f64>> {
    let mut temps = Vec::with_capacity(records.len());
    for record in records {
        match record.temp_mean() {
            Some(mean) => temps.push(mean),
            None => match policy {
                MissingValuePolicy::Skip => continue,
                MissingValuePolicy::FailStation => {
                    return Err(DegDayError::MalformedRecord {
                        station: station_id.to_string(),
                        line: record.doy as usize,
                        detail: "missing tmax or tmin".to_string(),
                    });
                }
            },
        }
    }
    Ok(temps)
}

/// Median of the per-day years-of-record counts, truncated to an integer.
/// An empty record yields 0, which the record-length gate then excludes.
fn median_years(records: &[DailyRecord]) -> i64 {
    if records.is_empty() {
        return 0;
    }
    let mut years: Vec<u32> = records.iter().map(DailyRecord::temp_years).collect();
    years.sort_unstable();
    let mid = years.len() / 2;
    if years.len() % 2 == 1 {
        years[mid] as i64
    } else {
        // Mean of the two middle values, truncated.
        ((years[mid - 1] as i64) + (years[mid] as i64)) / 2
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
