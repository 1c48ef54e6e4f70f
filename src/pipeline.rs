/// Batch drivers for the three pipeline stages.
///
/// Each stage iterates its work units (stations, or station-metric pairs),
/// isolates failures to the unit, and reports a summary at the end. The one
/// batch-fatal condition is a required input table that does not exist;
/// everything else degrades to a logged failure for that unit.

use crate::analysis::{aggregate, bias};
use crate::climatology::build_station_climatology;
use crate::config::Config;
use crate::ingest::{snap, wrcc};
use crate::logging::{self, DataSource};
use crate::metrics::{ALL_METRICS, Metric};
use crate::model::{DegreeDayGrid, Result, StationClimatology};
use crate::stations::{StationEntry, stations_for_run};
use crate::store::{self, ProjectionRecord, StationBaselines};
use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Run Summary
// ---------------------------------------------------------------------------

/// Outcome counts for one batch stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    /// (unit id, error text) for each failed unit.
    pub failures: Vec<(String, String)>,
}

impl RunSummary {
    fn success(&mut self) {
        self.total += 1;
        self.successful += 1;
    }

    fn failure(&mut self, unit: &str, error: &str) {
        self.total += 1;
        self.failed += 1;
        self.failures.push((unit.to_string(), error.to_string()));
    }

    fn skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }
}

// ---------------------------------------------------------------------------
// Stage 1: Scrape
// ---------------------------------------------------------------------------

/// Scrapes daily normals for every station and writes one CSV per station.
///
/// A failing station is logged and skipped. Requests are spaced out by the
/// configured delay to stay polite to the WRCC portal.
pub fn scrape_all(client: &reqwest::blocking::Client, config: &Config) -> Result<RunSummary> {
    let stations = stations_for_run(config.paths.station_lookup.as_deref())?;
    let mut summary = RunSummary::default();

    for (at, station) in stations.iter().enumerate() {
        if at > 0 && config.pipeline.scrape_delay_ms > 0 {
            thread::sleep(Duration::from_millis(config.pipeline.scrape_delay_ms));
        }

        logging::info(
            DataSource::Wrcc,
            Some(station.wrcc_id.as_str()),
            &format!("Scraping normals for {}", station.wrcc_name),
        );
        match wrcc::fetch_station_normals(client, &station.wrcc_id).and_then(|records| {
            store::write_station_records(&config.paths.station_csv_dir, &station.wrcc_id, &records)
                .map(|_| records.len())
        }) {
            Ok(rows) => {
                logging::info(
                    DataSource::Wrcc,
                    Some(station.wrcc_id.as_str()),
                    &format!("Wrote {} daily records", rows),
                );
                summary.success();
            }
            Err(e) => {
                logging::log_wrcc_failure(&station.wrcc_id, "normals scrape", &e);
                summary.failure(&station.wrcc_id, &e.to_string());
            }
        }
    }

    logging::log_batch_summary(
        DataSource::Wrcc,
        summary.total,
        summary.successful,
        summary.failed,
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Stage 2: Climatology
// ---------------------------------------------------------------------------

/// Builds the observed climatology table from the scraped station CSVs.
///
/// The station CSV directory must exist; individual stations that fail to
/// parse or to build are logged and left out of the table.
pub fn compute_climatologies(config: &Config) -> Result<RunSummary> {
    let policy = config.missing_value_policy()?;
    let station_csvs = store::list_station_csvs(&config.paths.station_csv_dir)?;
    let mut summary = RunSummary::default();
    let mut rows: Vec<StationClimatology> = Vec::new();

    for (station_id, path) in &station_csvs {
        let outcome = store::load_station_records(path)
            .and_then(|records| build_station_climatology(station_id, &records, policy));
        match outcome {
            Ok(climo) => {
                if !climo.meets_record_length() {
                    logging::warn(
                        DataSource::Store,
                        Some(station_id.as_str()),
                        &format!(
                            "Only {} median years of observation, below the record-length gate",
                            climo.median_years_of_observation
                        ),
                    );
                    summary.skip();
                    continue;
                }
                rows.push(climo);
                summary.success();
            }
            Err(e) => {
                logging::error(
                    DataSource::Store,
                    Some(station_id.as_str()),
                    &format!("climatology build failed: {}", e),
                );
                summary.failure(station_id, &e.to_string());
            }
        }
    }

    rows.sort_by(|a, b| a.station_id.cmp(&b.station_id));
    store::save_climatology_table(&config.climatology_table_path(), &rows)?;
    logging::info(
        DataSource::Store,
        None,
        &format!(
            "Wrote climatology table with {} stations to {}",
            rows.len(),
            config.climatology_table_path().display()
        ),
    );

    logging::log_batch_summary(
        DataSource::Store,
        summary.total,
        summary.successful,
        summary.failed,
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Stage 3: Bias correction
// ---------------------------------------------------------------------------

/// Projection output of one (station, metric) unit.
struct MetricProjection {
    baselines: crate::model::BaselineTable,
    corrected: DegreeDayGrid,
    uncorrected: DegreeDayGrid,
}

/// Fetches model grids for one station and metric and applies the delta
/// correction against the observed baseline.
fn correct_station_metric(
    client: &reqwest::blocking::Client,
    config: &Config,
    metric: Metric,
    observed: &StationClimatology,
    community: &snap::Community,
) -> Result<MetricProjection> {
    let base = &config.sources.snap_degree_days_url;
    let historical = snap::fetch_historical_grid(
        client,
        base,
        metric,
        community.latitude,
        community.longitude,
    )?;
    let future =
        snap::fetch_future_grid(client, base, metric, community.latitude, community.longitude)?;

    let baselines = aggregate::aggregate_baselines(&historical);
    let corrected = bias::correct_grid(metric, metric.value_of(observed), &baselines, &future)?;

    Ok(MetricProjection {
        baselines,
        corrected,
        uncorrected: future,
    })
}

/// Runs delta bias correction for every station in the observed climatology
/// table, writing the baseline table and per-metric projection JSON.
///
/// The observed table is required; its absence aborts the batch. Everything
/// else isolates to the failing (station, metric) unit.
pub fn bias_correct(client: &reqwest::blocking::Client, config: &Config) -> Result<RunSummary> {
    let observed = store::load_climatology_table(&config.climatology_table_path())?;
    let stations = stations_for_run(config.paths.station_lookup.as_deref())?;
    let communities = snap::fetch_communities(client, &config.sources.snap_places_url)?;

    let mut summary = RunSummary::default();
    let mut baselines: BTreeMap<String, StationBaselines> = BTreeMap::new();
    let mut corrected: BTreeMap<Metric, Vec<ProjectionRecord>> = BTreeMap::new();
    let mut uncorrected: BTreeMap<Metric, Vec<ProjectionRecord>> = BTreeMap::new();

    for station in &stations {
        let Some(climo) = observed.get(&station.wrcc_id) else {
            logging::warn(
                DataSource::Store,
                Some(station.wrcc_id.as_str()),
                "not present in the climatology table",
            );
            summary.skip();
            continue;
        };
        if !climo.meets_record_length() {
            logging::warn(
                DataSource::Store,
                Some(station.wrcc_id.as_str()),
                "below the record-length gate",
            );
            summary.skip();
            continue;
        }
        let Some(community) = snap::find_community(&communities, &station.snap_name) else {
            logging::error(
                DataSource::Snap,
                Some(station.wrcc_id.as_str()),
                &format!("no SNAP community named '{}'", station.snap_name),
            );
            summary.failure(
                &station.wrcc_id,
                &format!("no SNAP community named '{}'", station.snap_name),
            );
            continue;
        };

        for metric in ALL_METRICS {
            let unit = format!("{}/{}", station.wrcc_id, metric.api_name());
            match correct_station_metric(client, config, metric, climo, community) {
                Ok(projection) => {
                    baselines
                        .entry(station.wrcc_id.clone())
                        .or_default()
                        .insert(metric, projection.baselines);
                    corrected
                        .entry(metric)
                        .or_default()
                        .push(projection_record(station, community, projection.corrected));
                    uncorrected
                        .entry(metric)
                        .or_default()
                        .push(projection_record(station, community, projection.uncorrected));
                    summary.success();
                }
                Err(e) => {
                    logging::log_snap_failure(&station.snap_name, &unit, &e);
                    summary.failure(&unit, &e.to_string());
                }
            }
        }
    }

    store::save_baseline_table(&config.baseline_table_path(), &baselines)?;
    for metric in ALL_METRICS {
        for (records, is_corrected) in [
            (corrected.get(&metric), true),
            (uncorrected.get(&metric), false),
        ] {
            let records = records.map(Vec::as_slice).unwrap_or_default();
            let path = config
                .paths
                .output_dir
                .join(store::projection_filename(metric, is_corrected));
            store::save_projection_records(&path, records)?;
            if is_corrected {
                let nested = config.paths.output_dir.join(format!(
                    "nested_{}",
                    store::projection_filename(metric, true)
                ));
                store::save_nested_projections(&nested, records)?;
            }
        }
    }

    logging::log_batch_summary(
        DataSource::Snap,
        summary.total,
        summary.successful,
        summary.failed,
    );
    Ok(summary)
}

fn projection_record(
    station: &StationEntry,
    community: &snap::Community,
    futures: DegreeDayGrid,
) -> ProjectionRecord {
    ProjectionRecord {
        wrcc_id: station.wrcc_id.clone(),
        wrcc_name: station.wrcc_name.clone(),
        snap_id: community.id,
        snap_name: community.name.clone(),
        futures,
    }
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Runs scrape, climatology, and bias correction back to back.
pub fn run_all(client: &reqwest::blocking::Client, config: &Config) -> Result<[RunSummary; 3]> {
    let scraped = scrape_all(client, config)?;
    let computed = compute_climatologies(config)?;
    let corrected = bias_correct(client, config)?;
    Ok([scraped, computed, corrected])
}
