//! Integration tests for end-to-end simulation runs.

mod common;

use solar_sim::config::ScenarioConfig;
use solar_sim::error::{EstimatorError, SimError, ValidationError};
use solar_sim::estimator::PowerFeatures;
use solar_sim::sim::engine::run;
use solar_sim::sim::kpi::KpiReport;
use solar_sim::sim::types::BatteryStatus;

#[test]
fn baseline_run_produces_one_result_per_hour() {
    let scenario = ScenarioConfig::baseline();
    let report = common::run_scenario(&scenario);
    assert_eq!(report.hourly.len(), 24);
    for (i, h) in report.hourly.iter().enumerate() {
        assert_eq!(h.hour, i);
    }
}

#[test]
fn baseline_run_holds_invariants() {
    let scenario = ScenarioConfig::baseline();
    let report = common::run_scenario(&scenario);
    common::assert_invariants(&report, &scenario.simulation_config());
}

#[test]
fn every_preset_holds_invariants() {
    for name in ScenarioConfig::PRESETS {
        let scenario = ScenarioConfig::from_preset(name).expect("preset");
        let report = common::run_scenario(&scenario);
        common::assert_invariants(&report, &scenario.simulation_config());
    }
}

#[test]
fn night_hours_generate_nothing() {
    let scenario = ScenarioConfig::baseline();
    let report = common::run_scenario(&scenario);
    // start_hour 0, sunrise 6, sunset 18
    for h in report.hourly.iter().filter(|h| h.hour < 6 || h.hour >= 18) {
        assert_eq!(h.generated_energy_kwh, 0.0, "hour {}", h.hour);
    }
    assert!(report.total_energy_generated_kwh > 0.0);
}

#[test]
fn energy_is_conserved_over_the_run() {
    let scenario = ScenarioConfig::baseline();
    let cfg = scenario.simulation_config();
    let report = common::run_scenario(&scenario);

    let consumed = cfg.energy_consumption_kwh_per_hour * cfg.duration_hours as f64;
    let spilled: f64 = report
        .hourly
        .iter()
        .map(|h| (h.net_energy_kwh() - h.energy_to_battery_kwh).max(0.0))
        .sum();

    // generation + battery discharge + unmet = consumption + battery charge + spill
    let supplied = report.total_energy_generated_kwh
        + report.total_energy_from_battery_kwh
        + report.total_unmet_energy_kwh;
    let used = consumed + report.total_energy_to_battery_kwh + spilled;
    assert!((supplied - used).abs() < 1e-6, "supplied {supplied}, used {used}");

    let battery_delta = report.final_battery.capacity_kwh - cfg.initial_battery_capacity_kwh;
    assert!(
        (battery_delta
            - (report.total_energy_to_battery_kwh - report.total_energy_from_battery_kwh))
            .abs()
            < 1e-6
    );
}

#[test]
fn determinism_two_identical_runs_produce_identical_reports() {
    let scenario = ScenarioConfig::cloudy();
    let a = common::run_scenario(&scenario);
    let b = common::run_scenario(&scenario);
    assert_eq!(a, b);
}

#[test]
fn one_estimator_serves_concurrent_runs() {
    let scenario = ScenarioConfig::cloudy();
    let config = scenario.simulation_config();
    let estimator = scenario.estimator();
    let samples = scenario
        .weather_feed()
        .expect("weather feed")
        .fetch(config.duration_hours)
        .expect("samples");

    let (a, b) = std::thread::scope(|s| {
        let first = s.spawn(|| run(&config, &samples, &estimator));
        let second = s.spawn(|| run(&config, &samples, &estimator));
        (
            first.join().expect("first run thread"),
            second.join().expect("second run thread"),
        )
    });
    let a = a.expect("first run");
    let b = b.expect("second run");
    assert_eq!(a, b);
    assert_eq!(a.hourly.len(), 48);
}

#[test]
fn different_seeds_change_cloud_cover() {
    let a = common::run_scenario(&ScenarioConfig::baseline());
    let mut other = ScenarioConfig::baseline();
    other.weather.seed = 7;
    let b = common::run_scenario(&other);
    assert_ne!(a.total_energy_generated_kwh, b.total_energy_generated_kwh);
}

#[test]
fn no_battery_never_moves_energy() {
    let report = common::run_scenario(&ScenarioConfig::no_battery());
    assert_eq!(report.total_energy_to_battery_kwh, 0.0);
    assert_eq!(report.total_energy_from_battery_kwh, 0.0);
    assert_eq!(report.final_battery.percentage, 0.0);
    assert!(report.total_unmet_energy_kwh > 0.0);
}

#[test]
fn battery_reduces_unmet_demand() {
    let with = common::run_scenario(&ScenarioConfig::baseline());
    let without = common::run_scenario(&ScenarioConfig::no_battery());
    // Same weather, so every kWh drawn from the battery is a kWh not left unmet.
    assert!(
        (without.total_unmet_energy_kwh
            - with.total_unmet_energy_kwh
            - with.total_energy_from_battery_kwh)
            .abs()
            < 1e-6
    );
    assert!(with.total_unmet_energy_kwh < without.total_unmet_energy_kwh);
}

#[test]
fn three_hour_charge_sequence() {
    let cfg = common::lossless_config(5.0, 0.0, 2.0, 3);
    let report = run(&cfg, &common::samples_for(&[4.0, 6.0, 2.0]), &common::passthrough)
        .expect("run");

    let levels: Vec<f64> = report.hourly.iter().map(|h| h.battery_level_kwh).collect();
    assert_eq!(levels, vec![2.0, 5.0, 5.0]);
    assert_eq!(report.total_energy_to_battery_kwh, 5.0);
    assert_eq!(report.hourly[2].status, BatteryStatus::Idle);
    common::assert_invariants(&report, &cfg);
}

#[test]
fn full_battery_spills_surplus() {
    // Rated 10 kW caps generation at 10 kWh.
    let cfg = common::lossless_config(10.0, 10.0, 5.0, 1);
    let report = run(&cfg, &common::samples_for(&[10.0]), &common::passthrough).expect("run");
    let h = &report.hourly[0];
    assert_eq!(h.status, BatteryStatus::Full);
    assert_eq!(h.energy_to_battery_kwh, 0.0);
    assert_eq!(h.battery_level_kwh, 10.0);
    assert_eq!(report.final_battery.percentage, 1.0);
}

#[test]
fn empty_battery_leaves_demand_unmet() {
    let cfg = common::lossless_config(10.0, 0.0, 5.0, 1);
    let report = run(&cfg, &common::samples_for(&[2.0]), &common::passthrough).expect("run");
    let h = &report.hourly[0];
    assert_eq!(h.status, BatteryStatus::Empty);
    assert!((h.unmet_energy_kwh - 3.0).abs() < 1e-12);
    assert_eq!(h.battery_level_kwh, 0.0);
}

#[test]
fn exact_balance_is_idle() {
    let cfg = common::lossless_config(10.0, 4.0, 5.0, 1);
    let report = run(&cfg, &common::samples_for(&[5.0]), &common::passthrough).expect("run");
    let h = &report.hourly[0];
    assert_eq!(h.status, BatteryStatus::Idle);
    assert_eq!(h.energy_to_battery_kwh, 0.0);
    assert_eq!(h.energy_from_battery_kwh, 0.0);
    assert_eq!(h.unmet_energy_kwh, 0.0);
}

#[test]
fn estimator_outputs_are_clamped_to_rated_power() {
    let wild = |f: &PowerFeatures| -> Result<f64, EstimatorError> {
        Ok(if f.direct_normalized > 0.0 { 3.0 } else { -2.0 })
    };
    let cfg = common::lossless_config(5.0, 0.0, 0.0, 2);
    let report = run(&cfg, &common::samples_for(&[1.0, 0.0]), &wild).expect("run");
    assert_eq!(report.hourly[0].generated_energy_kwh, 10.0);
    assert_eq!(report.hourly[1].generated_energy_kwh, 0.0);
}

#[test]
fn nan_prediction_aborts_the_run() {
    let broken = |_: &PowerFeatures| -> Result<f64, EstimatorError> { Ok(f64::NAN) };
    let cfg = common::lossless_config(5.0, 0.0, 1.0, 2);
    let err = run(&cfg, &common::samples_for(&[1.0, 1.0]), &broken).expect_err("nan");
    assert!(matches!(err, SimError::Estimator { hour: 0, .. }));
}

#[test]
fn wrong_sample_count_is_rejected_before_simulating() {
    let cfg = common::lossless_config(5.0, 0.0, 1.0, 4);
    let err = run(&cfg, &common::samples_for(&[1.0; 3]), &common::passthrough)
        .expect_err("mismatch");
    assert!(matches!(
        err,
        SimError::Validation(ValidationError::SampleCountMismatch {
            expected: 4,
            actual: 3
        })
    ));
}

#[test]
fn kpi_values_are_finite_and_consistent() {
    let report = common::run_scenario(&ScenarioConfig::baseline());
    let kpi = KpiReport::from_report(&report);
    assert!(kpi.peak_generation_kwh > 0.0);
    assert!((6..18).contains(&kpi.peak_generation_hour));
    assert!((0.0..=100.0).contains(&kpi.self_sufficiency_pct));
    assert!(kpi.spilled_energy_kwh.is_finite() && kpi.spilled_energy_kwh >= 0.0);
    assert!(kpi.battery_equivalent_full_cycles.is_finite());
    assert_eq!(
        kpi.battery_throughput_kwh,
        report.total_energy_to_battery_kwh + report.total_energy_from_battery_kwh
    );
}
