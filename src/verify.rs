//! Data Source Verification Module
//!
//! Framework for testing the configured station set against the live WRCC
//! and SNAP APIs to determine which stations are accessible and returning
//! data.
//!
//! Use this before a batch run to catch upstream changes early.

use crate::config::Config;
use crate::ingest::{snap, wrcc};
use crate::metrics::Metric;
use crate::stations::stations_for_run;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub wrcc_results: Vec<WrccVerification>,
    pub snap_results: Vec<SnapVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub wrcc_total: usize,
    pub wrcc_working: usize,
    pub wrcc_failed: usize,
    pub snap_total: usize,
    pub snap_working: usize,
    pub snap_failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrccVerification {
    pub station_id: String,
    pub name: String,
    pub status: VerificationStatus,
    pub page_exists: bool,
    pub daily_record_count: usize,
    pub days_with_both_extremes: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapVerification {
    pub station_id: String,
    pub community_name: String,
    pub status: VerificationStatus,
    pub community_resolved: bool,
    pub models_available: Vec<String>,
    pub sample_year_count: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// WRCC Verification
// ============================================================================

pub fn verify_wrcc_station(
    client: &reqwest::blocking::Client,
    station_id: &str,
    name: &str,
) -> WrccVerification {
    let mut result = WrccVerification {
        station_id: station_id.to_string(),
        name: name.to_string(),
        status: VerificationStatus::Failed,
        page_exists: false,
        daily_record_count: 0,
        days_with_both_extremes: 0,
        error_message: None,
    };

    match wrcc::fetch_station_normals(client, station_id) {
        Ok(records) => {
            result.page_exists = true;
            result.daily_record_count = records.len();
            result.days_with_both_extremes = records
                .iter()
                .filter(|r| r.tmax.is_some() && r.tmin.is_some())
                .count();

            // A full normals table carries one row per calendar day. A
            // short table still computes, just with less coverage.
            if result.days_with_both_extremes >= 365 {
                result.status = VerificationStatus::Success;
            } else if result.days_with_both_extremes > 0 {
                result.status = VerificationStatus::PartialSuccess;
            }
        }
        Err(e) => {
            result.error_message = Some(e.to_string());
        }
    }

    result
}

// ============================================================================
// SNAP Verification
// ============================================================================

pub fn verify_snap_station(
    client: &reqwest::blocking::Client,
    config: &Config,
    communities: &[snap::Community],
    station_id: &str,
    community_name: &str,
) -> SnapVerification {
    let mut result = SnapVerification {
        station_id: station_id.to_string(),
        community_name: community_name.to_string(),
        status: VerificationStatus::Failed,
        community_resolved: false,
        models_available: Vec::new(),
        sample_year_count: 0,
        error_message: None,
    };

    let Some(community) = snap::find_community(communities, community_name) else {
        result.error_message = Some(format!("no community named '{}'", community_name));
        return result;
    };
    result.community_resolved = true;

    // Probe one metric over a short historical window.
    match snap::fetch_degree_day_grid(
        client,
        &config.sources.snap_degree_days_url,
        Metric::FreezingIndex,
        community.latitude,
        community.longitude,
        1981,
        1983,
    ) {
        Ok(grid) => {
            result.models_available = grid.keys().cloned().collect();
            result.sample_year_count = grid
                .values()
                .flat_map(|scenarios| scenarios.values())
                .map(|years| years.len())
                .sum();

            if !result.models_available.is_empty() && result.sample_year_count > 0 {
                result.status = VerificationStatus::Success;
            } else {
                result.status = VerificationStatus::PartialSuccess;
            }
        }
        Err(e) => {
            result.error_message = Some(e.to_string());
        }
    }

    result
}

// ============================================================================
// Full Verification Runner
// ============================================================================

pub fn run_full_verification(config: &Config) -> Result<VerificationReport, Box<dyn Error>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let mut report = VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        wrcc_results: Vec::new(),
        snap_results: Vec::new(),
        summary: VerificationSummary {
            wrcc_total: 0,
            wrcc_working: 0,
            wrcc_failed: 0,
            snap_total: 0,
            snap_working: 0,
            snap_failed: 0,
        },
    };

    let stations = stations_for_run(config.paths.station_lookup.as_deref())?;

    // Verify WRCC normals pages
    println!("🔍 Verifying WRCC stations...");
    report.summary.wrcc_total = stations.len();

    for station in &stations {
        print!("  {} ... ", station.wrcc_id);
        let result = verify_wrcc_station(&client, &station.wrcc_id, &station.wrcc_name);

        match result.status {
            VerificationStatus::Success => {
                println!("✓ OK ({} daily records)", result.daily_record_count);
                report.summary.wrcc_working += 1;
            }
            VerificationStatus::PartialSuccess => {
                println!(
                    "⚠ Partial ({}/{} days with both extremes)",
                    result.days_with_both_extremes, result.daily_record_count
                );
                report.summary.wrcc_working += 1;
            }
            VerificationStatus::Failed => {
                println!(
                    "✗ FAILED: {}",
                    result.error_message.as_deref().unwrap_or("Unknown")
                );
                report.summary.wrcc_failed += 1;
            }
        }

        report.wrcc_results.push(result);
    }

    // Verify SNAP community resolution and grid availability
    println!("\n🔍 Verifying SNAP communities...");
    match snap::fetch_communities(&client, &config.sources.snap_places_url) {
        Ok(communities) => {
            report.summary.snap_total = stations.len();

            for station in &stations {
                print!("  {} ... ", station.snap_name);
                let result = verify_snap_station(
                    &client,
                    config,
                    &communities,
                    &station.wrcc_id,
                    &station.snap_name,
                );

                match result.status {
                    VerificationStatus::Success => {
                        println!(
                            "✓ OK ({} models, {} year entries)",
                            result.models_available.len(),
                            result.sample_year_count
                        );
                        report.summary.snap_working += 1;
                    }
                    VerificationStatus::PartialSuccess => {
                        println!("⚠ Responsive but empty grid");
                        report.summary.snap_working += 1;
                    }
                    VerificationStatus::Failed => {
                        println!(
                            "✗ FAILED: {}",
                            result.error_message.as_deref().unwrap_or("Unknown")
                        );
                        report.summary.snap_failed += 1;
                    }
                }

                report.snap_results.push(result);
            }
        }
        Err(e) => {
            println!("⚠ Warning: Could not load SNAP community registry: {}", e);
        }
    }

    Ok(report)
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 VERIFICATION SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!(
        "WRCC Stations:    {}/{} working  ({} failed)",
        report.summary.wrcc_working, report.summary.wrcc_total, report.summary.wrcc_failed
    );
    println!(
        "SNAP Communities: {}/{} working  ({} failed)",
        report.summary.snap_working, report.summary.snap_total, report.summary.snap_failed
    );
    println!();

    let total_working = report.summary.wrcc_working + report.summary.snap_working;
    let total_stations = report.summary.wrcc_total + report.summary.snap_total;
    let success_rate = if total_stations > 0 {
        (total_working as f64 / total_stations as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Overall Success Rate: {:.1}% ({}/{})",
        success_rate, total_working, total_stations
    );
    println!("═══════════════════════════════════════════════════════════");
}
