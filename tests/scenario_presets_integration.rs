use std::path::PathBuf;
use std::process::{Command, Output};

#[derive(Debug)]
struct Summary {
    generated_kwh: f64,
    unmet_kwh: f64,
    self_sufficiency_pct: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_dynamics() {
    let baseline = run_and_parse(&["--scenario", "scenarios/baseline.toml"]);
    let cloudy = run_and_parse(&["--scenario", "scenarios/cloudy.toml"]);
    let no_battery = run_and_parse(&["--scenario", "scenarios/no_battery.toml"]);

    // Cloudy runs 48 h, so compare per-hour averages.
    assert!(
        cloudy.generated_kwh / 48.0 < baseline.generated_kwh / 24.0,
        "expected cloudy to generate less per hour: baseline={:.3}, cloudy={:.3}",
        baseline.generated_kwh,
        cloudy.generated_kwh
    );

    assert!(
        no_battery.unmet_kwh - baseline.unmet_kwh > 3.0,
        "expected the battery to cover night load: baseline={:.3}, no_battery={:.3}",
        baseline.unmet_kwh,
        no_battery.unmet_kwh
    );
    assert!(no_battery.self_sufficiency_pct < baseline.self_sufficiency_pct);

    assert_eq!(
        baseline.generated_kwh, no_battery.generated_kwh,
        "same weather and array should generate the same energy"
    );
}

#[test]
fn presets_match_scenario_files() {
    let from_file = run_and_parse(&["--scenario", "scenarios/baseline.toml"]);
    let from_preset = run_and_parse(&["--preset", "baseline"]);
    assert_eq!(from_file.generated_kwh, from_preset.generated_kwh);
    assert_eq!(from_file.unmet_kwh, from_preset.unmet_kwh);
}

#[test]
fn csv_weather_scenario_runs() {
    let output = run(&["--scenario", "scenarios/csv_weather.toml"]);
    assert_success(&output, "csv_weather");
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(stdout.contains("--- Simulation Report (6 h) ---"), "{stdout}");
}

#[test]
fn unknown_preset_exits_with_error() {
    let output = run(&["--preset", "sunny_mars"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"), "{stderr}");
}

#[test]
fn request_file_drives_the_run_and_writes_outputs() {
    let dir = scratch_dir("request");
    let request = dir.join("request.json");
    let telemetry = dir.join("hourly.csv");
    let report = dir.join("report.json");
    std::fs::write(
        &request,
        r#"{"latitude": 40.4, "longitude": -3.7, "max_grid_power": 6,
            "max_battery_capacity": 5, "current_battery_capacity": 1,
            "energy_consumption": 0.9, "duration_hours": 12}"#,
    )
    .expect("write request");

    let output = run(&[
        "--request",
        path_str(&request),
        "--telemetry-out",
        path_str(&telemetry),
        "--report-out",
        path_str(&report),
    ]);
    assert_success(&output, "request");

    let mut rdr = csv::Reader::from_path(&telemetry).expect("telemetry csv");
    assert_eq!(rdr.records().count(), 12);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report file"))
            .expect("report json");
    assert_eq!(json["hour_labels"].as_array().map(Vec::len), Some(12));
    assert_eq!(json["location"]["latitude"], 40.4);
    assert!(json["battery"]["percentage"].is_number());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn invalid_request_reports_missing_fields() {
    let dir = scratch_dir("invalid_request");
    let request = dir.join("request.json");
    std::fs::write(&request, r#"{"latitude": 40.4, "longitude": -3.7}"#).expect("write");

    let output = run(&["--request", path_str(&request)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required fields"), "{stderr}");
    assert!(stderr.contains("duration_hours"), "{stderr}");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn hours_override_changes_horizon() {
    let output = run(&["--preset", "baseline", "--hours", "6"]);
    assert_success(&output, "hours override");
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(stdout.contains("--- Simulation Report (6 h) ---"), "{stdout}");
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_solar-sim"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("solar-sim process should run")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "run failed for {what}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn run_and_parse(args: &[&str]) -> Summary {
    let output = run(args);
    assert_success(&output, &args.join(" "));
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    Summary {
        generated_kwh: parse_metric(&stdout, "Energy generated:", "kWh"),
        unmet_kwh: parse_metric(&stdout, "Unmet demand:", "kWh"),
        self_sufficiency_pct: parse_metric(&stdout, "Self-sufficiency:", "%"),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from line `{line}`"))
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("solar-sim-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn path_str(path: &std::path::Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}
