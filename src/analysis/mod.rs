/// Numeric transforms over fetched degree-day grids.
///
/// Submodules:
/// - `aggregate` — reduces historical per-year model grids to baseline
///   climatology scalars.
/// - `bias` — applies additive delta bias correction to future projections.

pub mod aggregate;
pub mod bias;
