/// Delta bias correction of future degree-day projections.
///
/// The delta method re-anchors each projected value to the observed station
/// baseline: `corrected = observed + (projected − modeled_historical)`. The
/// model's projected change relative to its own historical climatology is
/// preserved while its constant systematic offset is removed. Corrected
/// values are floored at zero (degree-day accumulations are physically
/// non-negative) and truncated to integers.
///
/// The traversal works on the flattened (model, scenario, year) key form
/// from `model::flatten_grid` rather than mutating the nested maps in place,
/// and re-nests only at the end. Output shape always mirrors input shape
/// exactly — this is a pure structural transform, not a filter.

use crate::metrics::Metric;
use crate::model::{
    BaselineTable, DegDayError, DegreeDayGrid, Result, flatten_grid, nest_grid,
};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Corrector
// ---------------------------------------------------------------------------

/// Bias-corrects one future grid for one station and metric.
///
/// `observed_baseline` is the ground-truth station climatology for the
/// metric; `model_baselines` the aggregated historical climatologies keyed
/// by (model, scenario). Every (model, scenario) present in `future` must
/// have a matching baseline — the historical and future API responses are
/// assumed to use consistent identifiers, and a missing baseline is
/// reported as a `KeyAlignment` integrity error, never silently skipped or
/// zero-filled.
///
/// An empty future grid yields an empty corrected grid: a valid zero-work
/// case, not a failure.
pub fn correct_grid(
    metric: Metric,
    observed_baseline: i64,
    model_baselines: &BaselineTable,
    future: &DegreeDayGrid,
) -> Result<DegreeDayGrid> {
    let flat = flatten_grid(future);
    let mut corrected: BTreeMap<_, f64> = BTreeMap::new();

    for (key, projected) in flat {
        let modeled = model_baselines
            .get(&(key.model.clone(), key.scenario.clone()))
            .copied()
            .ok_or_else(|| DegDayError::KeyAlignment {
                metric: metric.api_name().to_string(),
                model: key.model.clone(),
                scenario: key.scenario.clone(),
            })?;

        let delta_corrected = observed_baseline as f64 + (projected - modeled as f64);
        // Floor, then truncate — leaf values are non-negative integers.
        let floored = if delta_corrected < 0.0 {
            0.0
        } else {
            delta_corrected
        };
        corrected.insert(key, floored.trunc());
    }

    Ok(nest_grid(&corrected))
}

/// Bias-corrects all four metric grids for one station, merging the results
/// into one map keyed by metric. Metrics are processed independently; the
/// first integrity error aborts the station (the caller isolates it from
/// sibling stations).
pub fn correct_station(
    grids: &BTreeMap<Metric, (i64, BaselineTable, DegreeDayGrid)>,
) -> Result<BTreeMap<Metric, DegreeDayGrid>> {
    let mut out = BTreeMap::new();
    for (metric, (observed, baselines, future)) in grids {
        out.insert(*metric, correct_grid(*metric, *observed, baselines, future)?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
