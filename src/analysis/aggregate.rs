/// Model climatology aggregation.
///
/// Reduces a historical degree-day grid (model → scenario → year → dd) for
/// one station and one metric into a baseline scalar per (model, scenario):
/// the arithmetic mean of `dd` over whatever years are present, rounded
/// half-to-even. There is no interpolation for missing years, and a
/// (model, scenario) branch with no years at all simply does not appear in
/// the output — absent, never zero.

use crate::model::{BaselineTable, DegreeDayGrid};

/// Averages each (model, scenario) branch of a historical grid into a
/// rounded baseline climatology value.
pub fn aggregate_baselines(historical: &DegreeDayGrid) -> BaselineTable {
    let mut baselines = BaselineTable::new();
    for (model, scenarios) in historical {
        for (scenario, years) in scenarios {
            if years.is_empty() {
                continue;
            }
            let total: f64 = years.values().map(|v| v.dd).sum();
            let mean = total / years.len() as f64;
            baselines.insert(
                (model.clone(), scenario.clone()),
                mean.round_ties_even() as i64,
            );
        }
    }
    baselines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
