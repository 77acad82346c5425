//! Solar simulator entry point: CLI wiring and config-driven run.

use std::fs;
use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use solar_sim::config::ScenarioConfig;
use solar_sim::io::export::export_csv;
use solar_sim::report::ReportRecord;
use solar_sim::request::SimulationRequest;
use solar_sim::sim::engine;
use solar_sim::sim::kpi::KpiReport;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    request_path: Option<String>,
    hours_override: Option<usize>,
    weather_csv: Option<String>,
    seed_override: Option<u64>,
    telemetry_out: Option<String>,
    report_out: Option<String>,
}

fn print_help() {
    eprintln!("solar-sim - hourly solar generation and battery simulator");
    eprintln!();
    eprintln!("Usage: solar-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --request <path>         Load a JSON simulation request");
    eprintln!("  --hours <n>              Override simulation duration in hours");
    eprintln!("  --weather-csv <path>     Read hourly weather from a CSV file");
    eprintln!("  --seed <u64>             Override synthetic weather seed");
    eprintln!("  --telemetry-out <path>   Export hourly results to CSV");
    eprintln!("  --report-out <path>      Write the JSON report record");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario, --request or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following a flag, exiting if it is missing.
fn flag_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    match args.get(i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {flag} requires {what} argument");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        request_path: None,
        hours_override: None,
        weather_csv: None,
        seed_override: None,
        telemetry_out: None,
        report_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(flag_value(&args, i, "--scenario", "a path"));
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(flag_value(&args, i, "--preset", "a name"));
            }
            "--request" => {
                i += 1;
                cli.request_path = Some(flag_value(&args, i, "--request", "a path"));
            }
            "--hours" => {
                i += 1;
                let v = flag_value(&args, i, "--hours", "a positive integer");
                match v.parse::<usize>() {
                    Ok(h) if h > 0 => cli.hours_override = Some(h),
                    _ => {
                        eprintln!("error: --hours value \"{v}\" is not a positive integer");
                        process::exit(1);
                    }
                }
            }
            "--weather-csv" => {
                i += 1;
                cli.weather_csv = Some(flag_value(&args, i, "--weather-csv", "a path"));
            }
            "--seed" => {
                i += 1;
                let v = flag_value(&args, i, "--seed", "a u64");
                if let Ok(s) = v.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{v}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out = Some(flag_value(&args, i, "--telemetry-out", "a path"));
            }
            "--report-out" => {
                i += 1;
                cli.report_out = Some(flag_value(&args, i, "--report-out", "a path"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Loads the scenario: --scenario takes priority, then --request, then
/// --preset, then the baseline default.
fn load_scenario(cli: &CliArgs) -> ScenarioConfig {
    if let Some(ref path) = cli.scenario_path {
        ScenarioConfig::from_toml_file(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        })
    } else if let Some(ref path) = cli.request_path {
        let body = fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("error: cannot read request \"{path}\": {e}");
            process::exit(1);
        });
        let validated = SimulationRequest::from_json(&body)
            .and_then(|req| req.validate())
            .unwrap_or_else(|e| {
                eprintln!("error: invalid request: {e}");
                process::exit(1);
            });
        ScenarioConfig::from_request(&validated)
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        })
    } else {
        ScenarioConfig::baseline()
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    let mut scenario = load_scenario(&cli);

    // Apply overrides
    if let Some(seed) = cli.seed_override {
        scenario.weather.seed = seed;
    }
    if let Some(hours) = cli.hours_override {
        scenario.simulation.duration_hours = hours;
    }
    if let Some(ref path) = cli.weather_csv {
        scenario.weather.source = "csv".to_string();
        scenario.weather.csv_path = Some(path.into());
    }

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let config = scenario.simulation_config();
    let estimator = scenario.estimator();
    let mut feed = scenario.weather_feed().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });
    let report = engine::run_with_feed(&config, feed.as_mut(), &estimator).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });
    let kpi = KpiReport::from_report(&report);

    // Print per-hour results
    for r in &report.hourly {
        println!("{r}");
    }

    println!("\n{report}");
    println!("\n{kpi}");

    // Export CSV if requested
    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&report.hourly, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }

    // Write JSON report if requested
    if let Some(ref path) = cli.report_out {
        let record = ReportRecord::from_report(&report, scenario.site.start_hour)
            .with_location(scenario.site.latitude, scenario.site.longitude);
        let written = serde_json::to_string_pretty(&record)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("error: failed to write report: {e}");
            process::exit(1);
        }
        eprintln!("Report written to {path}");
    }
}
