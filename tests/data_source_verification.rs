//! Data Source Verification Integration Tests
//!
//! These tests check the configured station set against the live WRCC and
//! SNAP APIs to determine which stations are accessible and returning data.
//! Run these before a batch run to catch upstream changes early.

use degday_service::config::Config;
use degday_service::ingest::snap;
use degday_service::stations;
use degday_service::verify::*;

#[test]
#[ignore] // Only run manually - makes real API calls
fn test_wrcc_verification() {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap();

    let station_list = stations::builtin_stations();

    println!("\n🔍 Testing WRCC Stations:");
    println!("═══════════════════════════════════════════════════════════");

    let mut working = 0;
    let mut failed = 0;

    for station in &station_list {
        let result = verify_wrcc_station(&client, &station.wrcc_id, &station.wrcc_name);

        println!("\n{} ({})", station.wrcc_name, station.wrcc_id);
        println!("  Status: {:?}", result.status);
        println!("  Page Exists: {}", result.page_exists);
        println!("  Daily Records: {}", result.daily_record_count);
        println!(
            "  Days With Both Extremes: {}",
            result.days_with_both_extremes
        );

        if let Some(error) = &result.error_message {
            println!("  Error: {}", error);
        }

        match result.status {
            VerificationStatus::Success | VerificationStatus::PartialSuccess => working += 1,
            VerificationStatus::Failed => failed += 1,
        }
    }

    println!("\n═══════════════════════════════════════════════════════════");
    println!(
        "Summary: {}/{} working, {} failed",
        working,
        station_list.len(),
        failed
    );
    println!("═══════════════════════════════════════════════════════════\n");

    // At least some stations should be working
    assert!(working > 0, "No WRCC stations are working!");
}

#[test]
#[ignore] // Only run manually - makes real API calls
fn test_snap_verification() {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap();

    let config = Config::default();
    let station_list = stations::builtin_stations();
    let communities = snap::fetch_communities(&client, &config.sources.snap_places_url)
        .expect("SNAP community registry should be reachable");

    println!("\n🔍 Testing SNAP Communities:");
    println!("═══════════════════════════════════════════════════════════");

    let mut working = 0;
    let mut failed = 0;

    for station in &station_list {
        let result = verify_snap_station(
            &client,
            &config,
            &communities,
            &station.wrcc_id,
            &station.snap_name,
        );

        println!("\n{} ({})", station.snap_name, station.wrcc_id);
        println!("  Status: {:?}", result.status);
        println!("  Community Resolved: {}", result.community_resolved);
        println!("  Models: {:?}", result.models_available);
        println!("  Year Entries: {}", result.sample_year_count);

        if let Some(error) = &result.error_message {
            println!("  Error: {}", error);
        }

        match result.status {
            VerificationStatus::Success | VerificationStatus::PartialSuccess => working += 1,
            VerificationStatus::Failed => failed += 1,
        }
    }

    println!("\n═══════════════════════════════════════════════════════════");
    println!(
        "Summary: {}/{} working, {} failed",
        working,
        station_list.len(),
        failed
    );
    println!("═══════════════════════════════════════════════════════════\n");

    // This test documents what works - it doesn't fail if SNAP is unavailable
    println!("Note: SNAP verification complete. Check output above for availability.");
}

#[test]
#[ignore] // Only run manually - makes real API calls
fn test_full_verification_report_serializes() {
    let config = Config::default();
    let report = run_full_verification(&config).expect("verification should complete");
    print_summary(&report);

    let body = serde_json::to_string_pretty(&report).unwrap();
    assert!(body.contains("wrcc_results"));
    assert!(body.contains("snap_results"));
}
