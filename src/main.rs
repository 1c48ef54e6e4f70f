/// Subcommand runner for the degree-day pipeline.
///
/// Usage:
///   degday scrape        scrape WRCC daily normals into per-station CSVs
///   degday climatology   build the observed climatology table
///   degday bias-correct  fetch SNAP grids and write corrected projections
///   degday all           run all three stages back to back
///   degday verify        check configured stations against the live APIs
///
/// An optional second argument names the config file; the default is
/// `degday.toml` in the working directory.

use degday_service::config::{Config, DEFAULT_CONFIG_PATH};
use degday_service::logging::{self, DataSource};
use degday_service::pipeline::{self, RunSummary};
use degday_service::verify;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        print_usage();
        return ExitCode::FAILURE;
    };

    let (config_path, explicit) = match args.get(2) {
        Some(path) => (path.as_str(), true),
        None => (DEFAULT_CONFIG_PATH, false),
    };
    let config = match Config::load(Path::new(config_path), explicit) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logger(
        config.log_level(),
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );

    let client = match reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match command {
        "scrape" => pipeline::scrape_all(&client, &config).map(|s| vec![("scrape", s)]),
        "climatology" => pipeline::compute_climatologies(&config).map(|s| vec![("climatology", s)]),
        "bias-correct" => pipeline::bias_correct(&client, &config).map(|s| vec![("bias-correct", s)]),
        "all" => pipeline::run_all(&client, &config).map(|[scrape, climo, bias]| {
            vec![
                ("scrape", scrape),
                ("climatology", climo),
                ("bias-correct", bias),
            ]
        }),
        "verify" => {
            return match verify::run_full_verification(&config) {
                Ok(report) => {
                    verify::print_summary(&report);
                    if report.summary.wrcc_failed == 0 && report.summary.snap_failed == 0 {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(e) => {
                    eprintln!("Verification failed: {}", e);
                    ExitCode::FAILURE
                }
            };
        }
        _ => {
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match outcome {
        Ok(stages) => {
            let mut any_failed = false;
            for (name, summary) in &stages {
                print_stage_summary(name, summary);
                any_failed |= summary.failed > 0;
            }
            if any_failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            logging::error(DataSource::System, None, &format!("{} aborted: {}", command, e));
            eprintln!("{} aborted: {}", command, e);
            ExitCode::FAILURE
        }
    }
}

fn print_stage_summary(name: &str, summary: &RunSummary) {
    println!(
        "{}: {}/{} successful, {} failed, {} skipped",
        name, summary.successful, summary.total, summary.failed, summary.skipped
    );
    for (unit, error) in &summary.failures {
        println!("  ✗ {}: {}", unit, error);
    }
}

fn print_usage() {
    eprintln!("Usage: degday <scrape|climatology|bias-correct|all|verify> [config.toml]");
}
