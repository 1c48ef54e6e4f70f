/// CSV/JSON persistence for station records, climatology tables, and
/// projection structures.
///
/// Output layout:
/// - one daily-normals CSV per station under the scrape directory;
/// - `degree_day_metrics.csv` — observed climatology table, one row per
///   station;
/// - `model_climatologies.csv` — wide baseline table, one column per
///   (model, scenario, metric) label;
/// - per-metric projection JSON, both record-oriented and re-keyed by SNAP
///   community id for API serving.

use crate::metrics::{ALL_METRICS, Metric};
use crate::model::{BaselineTable, DailyRecord, DegDayError, DegreeDayGrid, Result, StationClimatology};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Baselines for one station across all metrics.
pub type StationBaselines = BTreeMap<Metric, BaselineTable>;

fn io_err(context: &str, err: impl std::fmt::Display) -> DegDayError {
    DegDayError::Io(format!("{}: {}", context, err))
}

// ---------------------------------------------------------------------------
// Per-station daily records
// ---------------------------------------------------------------------------

/// Path of one station's daily-normals CSV under the scrape directory.
pub fn station_csv_path(dir: &Path, wrcc_id: &str) -> PathBuf {
    dir.join(format!("{}.csv", wrcc_id))
}

/// Writes one station's daily records, creating the directory if needed.
pub fn write_station_records(dir: &Path, wrcc_id: &str, records: &[DailyRecord]) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| io_err("creating station directory", e))?;
    let path = station_csv_path(dir, wrcc_id);
    let file = File::create(&path).map_err(|e| io_err("creating station csv", e))?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| io_err("writing station csv", e))?;
    }
    writer.flush().map_err(|e| io_err("flushing station csv", e))
}

/// Reads one station's daily records back.
pub fn read_station_records<R: Read>(reader: R) -> Result<Vec<DailyRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<DailyRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| DegDayError::Parse(e.to_string()))
}

/// Lists the (station id, path) pairs of all station CSVs in a directory.
pub fn list_station_csvs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        DegDayError::MissingTable(format!("station directory {}: {}", dir.display(), e))
    })?;
    let mut stations = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_err("reading station directory", e))?.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stations.push((stem.to_string(), path.clone()));
            }
        }
    }
    stations.sort();
    Ok(stations)
}

/// Opens and reads one station CSV from disk.
pub fn load_station_records(path: &Path) -> Result<Vec<DailyRecord>> {
    let file = File::open(path).map_err(|e| io_err("opening station csv", e))?;
    read_station_records(file)
}

// ---------------------------------------------------------------------------
// Observed climatology table
// ---------------------------------------------------------------------------

const STATION_ID_COLUMN: &str = "WRCC ID";
const MEDIAN_YEARS_COLUMN: &str = "Median Years of Observations";

/// Column name of an observed metric, e.g.
/// "WRCC Air Freezing Index Climatology".
pub fn observed_column(metric: Metric) -> String {
    format!("WRCC {}", metric.climo_label())
}

/// Writes the observed climatology table.
pub fn write_climatology_table<W: Write>(
    writer: W,
    rows: &[StationClimatology],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut header = vec![STATION_ID_COLUMN.to_string()];
    header.extend(ALL_METRICS.iter().map(|m| observed_column(*m)));
    header.push(MEDIAN_YEARS_COLUMN.to_string());
    csv_writer
        .write_record(&header)
        .map_err(|e| io_err("writing climatology header", e))?;

    for row in rows {
        let record = vec![
            row.station_id.clone(),
            row.freezing_index.to_string(),
            row.heating.to_string(),
            row.below_zero.to_string(),
            row.thawing_index.to_string(),
            row.median_years_of_observation.to_string(),
        ];
        csv_writer
            .write_record(&record)
            .map_err(|e| io_err("writing climatology row", e))?;
    }
    csv_writer
        .flush()
        .map_err(|e| io_err("flushing climatology table", e))
}

/// Reads the observed climatology table, keyed by station id.
pub fn read_climatology_table<R: Read>(reader: R) -> Result<BTreeMap<String, StationClimatology>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|e| DegDayError::Parse(e.to_string()))?
        .clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DegDayError::Parse(format!("climatology table missing column '{}'", name)))
    };

    let id_at = column(STATION_ID_COLUMN)?;
    let freezing_at = column(&observed_column(Metric::FreezingIndex))?;
    let heating_at = column(&observed_column(Metric::Heating))?;
    let below_at = column(&observed_column(Metric::BelowZero))?;
    let thawing_at = column(&observed_column(Metric::ThawingIndex))?;
    let years_at = column(MEDIAN_YEARS_COLUMN)?;

    let parse_int = |record: &csv::StringRecord, at: usize| -> Result<i64> {
        record
            .get(at)
            .and_then(|v| v.parse::<f64>().ok())
            .map(|v| v as i64)
            .ok_or_else(|| DegDayError::Parse("non-numeric climatology value".to_string()))
    };

    let mut table = BTreeMap::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| DegDayError::Parse(e.to_string()))?;
        let station_id = record
            .get(id_at)
            .ok_or_else(|| DegDayError::Parse("missing station id".to_string()))?
            .to_string();
        table.insert(
            station_id.clone(),
            StationClimatology {
                station_id,
                freezing_index: parse_int(&record, freezing_at)?,
                heating: parse_int(&record, heating_at)?,
                below_zero: parse_int(&record, below_at)?,
                thawing_index: parse_int(&record, thawing_at)?,
                median_years_of_observation: parse_int(&record, years_at)?,
            },
        );
    }
    Ok(table)
}

/// Loads the observed climatology table from disk. Its absence is the one
/// batch-fatal condition of the bias-correction run.
pub fn load_climatology_table(path: &Path) -> Result<BTreeMap<String, StationClimatology>> {
    let file = File::open(path).map_err(|e| {
        DegDayError::MissingTable(format!("climatology table {}: {}", path.display(), e))
    })?;
    read_climatology_table(file)
}

/// Writes the observed climatology table to disk.
pub fn save_climatology_table(path: &Path, rows: &[StationClimatology]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err("creating output directory", e))?;
    }
    let file = File::create(path).map_err(|e| io_err("creating climatology table", e))?;
    write_climatology_table(file, rows)
}

// ---------------------------------------------------------------------------
// Model baseline table
// ---------------------------------------------------------------------------

/// Column name of a modeled baseline, e.g.
/// "CCSM4 rcp85 Air Freezing Index Climatology".
pub fn baseline_column(model: &str, scenario: &str, metric: Metric) -> String {
    format!("{} {} {}", model, scenario, metric.climo_label())
}

/// Splits a baseline column name back into (model, scenario, metric).
/// Model and scenario identifiers never contain spaces.
fn parse_baseline_column(column: &str) -> Option<(String, String, Metric)> {
    let mut parts = column.splitn(3, ' ');
    let model = parts.next()?.to_string();
    let scenario = parts.next()?.to_string();
    let label = parts.next()?;
    let metric = ALL_METRICS.into_iter().find(|m| m.climo_label() == label)?;
    Some((model, scenario, metric))
}

/// Writes the wide model-baseline table: one row per station, one column
/// per (model, scenario, metric) combination seen anywhere in the input.
pub fn write_baseline_table<W: Write>(
    writer: W,
    baselines: &BTreeMap<String, StationBaselines>,
) -> Result<()> {
    // Union of all columns, so stations with missing branches still line up.
    let mut columns: Vec<(String, String, Metric)> = Vec::new();
    for station in baselines.values() {
        for (metric, table) in station {
            for (model, scenario) in table.keys() {
                let key = (model.clone(), scenario.clone(), *metric);
                if !columns.contains(&key) {
                    columns.push(key);
                }
            }
        }
    }
    columns.sort();

    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut header = vec![STATION_ID_COLUMN.to_string()];
    header.extend(
        columns
            .iter()
            .map(|(model, scenario, metric)| baseline_column(model, scenario, *metric)),
    );
    csv_writer
        .write_record(&header)
        .map_err(|e| io_err("writing baseline header", e))?;

    for (station_id, station) in baselines {
        let mut record = vec![station_id.clone()];
        for (model, scenario, metric) in &columns {
            let value = station
                .get(metric)
                .and_then(|table| table.get(&(model.clone(), scenario.clone())));
            record.push(value.map(|v| v.to_string()).unwrap_or_default());
        }
        csv_writer
            .write_record(&record)
            .map_err(|e| io_err("writing baseline row", e))?;
    }
    csv_writer
        .flush()
        .map_err(|e| io_err("flushing baseline table", e))
}

/// Reads the wide baseline table back into nested form. Empty cells stay
/// absent — never zero-filled.
pub fn read_baseline_table<R: Read>(reader: R) -> Result<BTreeMap<String, StationBaselines>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|e| DegDayError::Parse(e.to_string()))?
        .clone();

    let mut columns: Vec<(usize, String, String, Metric)> = Vec::new();
    let mut id_at = None;
    for (at, name) in headers.iter().enumerate() {
        if name == STATION_ID_COLUMN {
            id_at = Some(at);
        } else if let Some((model, scenario, metric)) = parse_baseline_column(name) {
            columns.push((at, model, scenario, metric));
        }
    }
    let id_at = id_at.ok_or_else(|| {
        DegDayError::Parse(format!("baseline table missing column '{}'", STATION_ID_COLUMN))
    })?;

    let mut baselines = BTreeMap::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| DegDayError::Parse(e.to_string()))?;
        let station_id = record
            .get(id_at)
            .ok_or_else(|| DegDayError::Parse("missing station id".to_string()))?
            .to_string();
        let station: &mut StationBaselines = baselines.entry(station_id).or_default();
        for (at, model, scenario, metric) in &columns {
            let cell = record.get(*at).unwrap_or("");
            if cell.is_empty() {
                continue;
            }
            let value = cell
                .parse::<f64>()
                .map_err(|e| DegDayError::Parse(format!("baseline cell '{}': {}", cell, e)))?;
            station
                .entry(*metric)
                .or_default()
                .insert((model.clone(), scenario.clone()), value as i64);
        }
    }
    Ok(baselines)
}

/// Loads the baseline table from disk.
pub fn load_baseline_table(path: &Path) -> Result<BTreeMap<String, StationBaselines>> {
    let file = File::open(path).map_err(|e| {
        DegDayError::MissingTable(format!("baseline table {}: {}", path.display(), e))
    })?;
    read_baseline_table(file)
}

/// Writes the baseline table to disk.
pub fn save_baseline_table(
    path: &Path,
    baselines: &BTreeMap<String, StationBaselines>,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err("creating output directory", e))?;
    }
    let file = File::create(path).map_err(|e| io_err("creating baseline table", e))?;
    write_baseline_table(file, baselines)
}

// ---------------------------------------------------------------------------
// Projection output
// ---------------------------------------------------------------------------

/// One station's projection grid for one metric, with the station and
/// community identifiers carried through to the output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRecord {
    pub wrcc_id: String,
    pub wrcc_name: String,
    pub snap_id: i64,
    pub snap_name: String,
    pub futures: DegreeDayGrid,
}

/// Filename of a per-metric projection JSON.
pub fn projection_filename(metric: Metric, corrected: bool) -> String {
    let prefix = if corrected { "bias_corrected" } else { "uncorrected" };
    format!("{}_{}_future_projections.json", prefix, metric.api_name())
}

/// Writes a record-oriented projection JSON for one metric.
pub fn save_projection_records(path: &Path, records: &[ProjectionRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err("creating output directory", e))?;
    }
    let body = serde_json::to_string_pretty(records)
        .map_err(|e| io_err("serializing projections", e))?;
    fs::write(path, body).map_err(|e| io_err("writing projections", e))
}

/// Re-keys projection records by SNAP community id — the nested layout the
/// downstream API serves directly.
pub fn nested_by_snap_id(records: &[ProjectionRecord]) -> BTreeMap<String, DegreeDayGrid> {
    records
        .iter()
        .map(|r| (r.snap_id.to_string(), r.futures.clone()))
        .collect()
}

/// Writes the id-keyed nested projection JSON for one metric.
pub fn save_nested_projections(path: &Path, records: &[ProjectionRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err("creating output directory", e))?;
    }
    let body = serde_json::to_string_pretty(&nested_by_snap_id(records))
        .map_err(|e| io_err("serializing nested projections", e))?;
    fs::write(path, body).map_err(|e| io_err("writing nested projections", e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
