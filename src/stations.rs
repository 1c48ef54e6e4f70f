/// WRCC station registry for the degree-day climatology service.
///
/// Defines the canonical list of Alaska stations processed by this service
/// along with the SNAP community name used to resolve coordinates for the
/// model API. This is the single source of truth for station ids — other
/// modules should reference stations from here rather than hardcoding ids.
/// A lookup CSV with the same columns can replace the built-in registry for
/// larger runs.

use crate::model::{DegDayError, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single WRCC station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationEntry {
    /// Six-digit WRCC cooperative station id.
    pub wrcc_id: String,
    /// Official WRCC station name.
    pub wrcc_name: String,
    /// SNAP community name used for the coordinate lookup. Station and
    /// community names rarely match exactly (airport suffixes, renames),
    /// so the pairing is explicit.
    pub snap_name: String,
}

struct RegistryRow {
    wrcc_id: &'static str,
    wrcc_name: &'static str,
    snap_name: &'static str,
}

/// Built-in station set, ordered south to north.
///
/// Sources:
///   - Station ids and names: WRCC coop network (wrcc.dri.edu)
///   - Community names: SNAP community registry (earthmaps.io)
static STATION_REGISTRY: &[RegistryRow] = &[
    RegistryRow {
        wrcc_id: "504100",
        wrcc_name: "JUNEAU INT'L AP",
        snap_name: "Juneau",
    },
    RegistryRow {
        wrcc_id: "500280",
        wrcc_name: "ANCHORAGE INT'L AP",
        snap_name: "Anchorage",
    },
    RegistryRow {
        wrcc_id: "500754",
        wrcc_name: "BETHEL AIRPORT",
        snap_name: "Bethel",
    },
    RegistryRow {
        wrcc_id: "505769",
        wrcc_name: "MCGRATH AP",
        snap_name: "McGrath",
    },
    RegistryRow {
        wrcc_id: "502968",
        wrcc_name: "FAIRBANKS INT'L AP",
        snap_name: "Fairbanks",
    },
    RegistryRow {
        wrcc_id: "506496",
        wrcc_name: "NOME WSO AIRPORT",
        snap_name: "Nome",
    },
    RegistryRow {
        wrcc_id: "505076",
        wrcc_name: "KOTZEBUE WSO AP",
        snap_name: "Kotzebue",
    },
    RegistryRow {
        wrcc_id: "500546",
        wrcc_name: "BARROW W POST-W ROGERS AP",
        snap_name: "Utqiaġvik (Barrow)",
    },
];

/// Returns the built-in station set.
pub fn builtin_stations() -> Vec<StationEntry> {
    STATION_REGISTRY
        .iter()
        .map(|row| StationEntry {
            wrcc_id: row.wrcc_id.to_string(),
            wrcc_name: row.wrcc_name.to_string(),
            snap_name: row.snap_name.to_string(),
        })
        .collect()
}

/// Looks up a built-in station by WRCC id. Returns `None` if not found.
pub fn find_station(wrcc_id: &str) -> Option<StationEntry> {
    builtin_stations().into_iter().find(|s| s.wrcc_id == wrcc_id)
}

// ---------------------------------------------------------------------------
// Lookup CSV
// ---------------------------------------------------------------------------

/// One row of a station lookup CSV with the column headers
/// "WRCC ID", "WRCC Name", "SNAP Name".
#[derive(Debug, Deserialize)]
struct LookupRow {
    #[serde(rename = "WRCC ID")]
    wrcc_id: String,
    #[serde(rename = "WRCC Name")]
    wrcc_name: String,
    #[serde(rename = "SNAP Name")]
    snap_name: String,
}

/// Reads a station lookup table from any CSV source.
pub fn read_station_lookup<R: Read>(reader: R) -> Result<Vec<StationEntry>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut stations = Vec::new();
    for row in csv_reader.deserialize::<LookupRow>() {
        let row = row.map_err(|e| DegDayError::Parse(e.to_string()))?;
        stations.push(StationEntry {
            wrcc_id: row.wrcc_id,
            wrcc_name: row.wrcc_name,
            snap_name: row.snap_name,
        });
    }
    Ok(stations)
}

/// Loads the station lookup CSV from disk.
pub fn load_station_lookup(path: &Path) -> Result<Vec<StationEntry>> {
    let file = File::open(path).map_err(|e| {
        DegDayError::MissingTable(format!("station lookup {}: {}", path.display(), e))
    })?;
    read_station_lookup(file)
}

/// Station set for a run: the lookup CSV when configured and present,
/// otherwise the built-in registry.
pub fn stations_for_run(lookup_path: Option<&Path>) -> Result<Vec<StationEntry>> {
    match lookup_path {
        Some(path) => load_station_lookup(path),
        None => Ok(builtin_stations()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
