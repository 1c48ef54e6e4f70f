//! Offline end-to-end tests of the pipeline stages.
//!
//! Drives the full chain from raw WRCC table text through the observed
//! climatology, baseline aggregation, and delta correction, with no network
//! access. Live-API coverage lives in data_source_verification.rs.

use degday_service::analysis::{aggregate, bias};
use degday_service::climatology::{MissingValuePolicy, build_station_climatology};
use degday_service::ingest::wrcc;
use degday_service::metrics::Metric;
use degday_service::model::{DdValue, DegreeDayGrid};
use degday_service::store;

/// Three days of normals with daily means of 10, 20, and 40 degrees F.
const NORMALS_TABLE: &str = "\
 TEST STATION, ALASKA  (502968)\n\
 Daily Climate Normals 1981-2010\n\
 doy mo dy    maxt  nyrs   mint  nyrs    pcpn nyrs  sdmax  sdmin\n\
   1  1  1   15.0  30.     5.0  30.   0.010  30.  9.000  10.000\n\
   2  1  2   25.0  30.    15.0  30.   0.020  30.  9.000  10.000\n\
   3  1  3   45.0  30.    35.0  30.   0.030  30.  9.000  10.000\n";

fn grid_with(entries: &[(&str, &str, &str, f64)]) -> DegreeDayGrid {
    let mut grid = DegreeDayGrid::new();
    for (model, scenario, year, dd) in entries {
        grid.entry(model.to_string())
            .or_default()
            .entry(scenario.to_string())
            .or_default()
            .insert(year.to_string(), DdValue { dd: *dd });
    }
    grid
}

#[test]
fn test_normals_text_to_climatology() {
    let records = wrcc::parse_normals_table(NORMALS_TABLE, "502968").unwrap();
    let climo = build_station_climatology("502968", &records, MissingValuePolicy::Skip).unwrap();

    // Daily means 10, 20, 40 against the four thresholds.
    assert_eq!(climo.freezing_index, 34, "22 + 12 + 0 below 32F");
    assert_eq!(climo.heating, 125, "55 + 45 + 25 below 65F");
    assert_eq!(climo.below_zero, 0, "no day reaches below 0F");
    assert_eq!(climo.thawing_index, 8, "only the 40F day thaws");
    assert_eq!(climo.median_years_of_observation, 30);
    assert!(climo.meets_record_length());
}

#[test]
fn test_climatology_through_correction() {
    let records = wrcc::parse_normals_table(NORMALS_TABLE, "502968").unwrap();
    let climo = build_station_climatology("502968", &records, MissingValuePolicy::Skip).unwrap();

    let historical = grid_with(&[
        ("CCSM4", "rcp45", "1981", 100.0),
        ("CCSM4", "rcp45", "1982", 120.0),
    ]);
    let future = grid_with(&[
        ("CCSM4", "rcp45", "2020", 150.0),
        ("CCSM4", "rcp45", "2021", 50.0),
    ]);

    let baselines = aggregate::aggregate_baselines(&historical);
    assert_eq!(
        baselines[&("CCSM4".to_string(), "rcp45".to_string())],
        110,
        "baseline is the mean of the historical years"
    );

    let corrected = bias::correct_grid(
        Metric::FreezingIndex,
        climo.freezing_index,
        &baselines,
        &future,
    )
    .unwrap();

    // observed 34 + (150 - 110) = 74; 34 + (50 - 110) floors at 0.
    assert_eq!(corrected["CCSM4"]["rcp45"]["2020"].dd, 74.0);
    assert_eq!(corrected["CCSM4"]["rcp45"]["2021"].dd, 0.0);
}

#[test]
fn test_climatology_survives_table_round_trip() {
    let records = wrcc::parse_normals_table(NORMALS_TABLE, "502968").unwrap();
    let climo = build_station_climatology("502968", &records, MissingValuePolicy::Skip).unwrap();

    let mut buf = Vec::new();
    store::write_climatology_table(&mut buf, &[climo.clone()]).unwrap();
    let table = store::read_climatology_table(buf.as_slice()).unwrap();

    let reloaded = &table["502968"];
    assert_eq!(reloaded, &climo);

    // The reloaded row drives a correction identically to the in-memory row.
    let historical = grid_with(&[("GFDL-CM3", "rcp85", "1981", 40.0)]);
    let future = grid_with(&[("GFDL-CM3", "rcp85", "2050", 45.0)]);
    let baselines = aggregate::aggregate_baselines(&historical);
    let corrected = bias::correct_grid(
        Metric::ThawingIndex,
        reloaded.thawing_index,
        &baselines,
        &future,
    )
    .unwrap();
    assert_eq!(corrected["GFDL-CM3"]["rcp85"]["2050"].dd, 13.0, "8 + (45 - 40)");
}

#[test]
fn test_missing_baseline_isolates_to_the_metric() {
    let records = wrcc::parse_normals_table(NORMALS_TABLE, "502968").unwrap();
    let climo = build_station_climatology("502968", &records, MissingValuePolicy::Skip).unwrap();

    // Historical grid is missing the rcp85 branch that the future has.
    let historical = grid_with(&[("CCSM4", "rcp45", "1981", 100.0)]);
    let future = grid_with(&[("CCSM4", "rcp85", "2020", 150.0)]);
    let baselines = aggregate::aggregate_baselines(&historical);

    let err = bias::correct_grid(
        Metric::FreezingIndex,
        climo.freezing_index,
        &baselines,
        &future,
    )
    .unwrap_err();
    assert!(
        err.to_string().contains("rcp85"),
        "the error should name the unmatched branch: {}",
        err
    );
}

#[test]
fn test_fail_station_policy_rejects_gappy_normals() {
    let gappy = "\
 h\n h\n h\n\
   1  1  1   ----  30.     5.0  30.   0.010  30.  9.000  10.000\n\
   2  1  2   25.0  30.    15.0  30.   0.020  30.  9.000  10.000\n";
    let records = wrcc::parse_normals_table(gappy, "500280").unwrap();

    assert!(
        build_station_climatology("500280", &records, MissingValuePolicy::FailStation).is_err()
    );

    // Under skip, the gappy day drops and the rest still computes.
    let climo =
        build_station_climatology("500280", &records, MissingValuePolicy::Skip).unwrap();
    assert_eq!(climo.freezing_index, 12, "only the 20F day remains");
}

#[test]
fn test_projection_records_nest_by_snap_id() {
    let futures = grid_with(&[("CCSM4", "rcp45", "2020", 74.0)]);
    let records = vec![store::ProjectionRecord {
        wrcc_id: "502968".to_string(),
        wrcc_name: "FAIRBANKS INT'L AP".to_string(),
        snap_id: 24,
        snap_name: "Fairbanks".to_string(),
        futures: futures.clone(),
    }];

    let nested = store::nested_by_snap_id(&records);
    assert_eq!(nested["24"], futures);

    let body = serde_json::to_string(&records).unwrap();
    let reparsed: Vec<store::ProjectionRecord> = serde_json::from_str(&body).unwrap();
    assert_eq!(reparsed, records);
}
