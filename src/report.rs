//! Flat, machine-readable report for clients.
//!
//! Maps the internal `SimulationReport` onto the public contract: totals at
//! the top level, a nested `battery` object, and parallel per-hour arrays
//! that chart libraries can consume directly.

use serde::Serialize;

use crate::sim::types::SimulationReport;

/// Final battery charge in the public contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryRecord {
    /// Charge at the end of the horizon (kWh).
    pub capacity: f64,
    /// Charge as a fraction of battery size (0.0 to 1.0).
    pub percentage: f64,
}

/// Site the report was computed for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Public report record.
///
/// `hour_labels`, `hourly_generated_energy`, `hourly_battery_level` and
/// `hourly_status` always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub duration_hours: usize,
    pub total_energy_generated: f64,
    pub total_energy_to_battery: f64,
    pub total_energy_from_battery: f64,
    pub total_unmet_energy: f64,
    pub battery: BatteryRecord,
    pub hour_labels: Vec<String>,
    pub hourly_generated_energy: Vec<f64>,
    pub hourly_battery_level: Vec<f64>,
    pub hourly_status: Vec<&'static str>,
}

impl ReportRecord {
    /// Builds the record, labelling hours from `start_hour` (hour of day of
    /// the first sample).
    pub fn from_report(report: &SimulationReport, start_hour: usize) -> Self {
        let n = report.hourly.len();
        Self {
            location: None,
            duration_hours: n,
            total_energy_generated: report.total_energy_generated_kwh,
            total_energy_to_battery: report.total_energy_to_battery_kwh,
            total_energy_from_battery: report.total_energy_from_battery_kwh,
            total_unmet_energy: report.total_unmet_energy_kwh,
            battery: BatteryRecord {
                capacity: report.final_battery.capacity_kwh,
                percentage: report.final_battery.percentage,
            },
            hour_labels: hour_labels(start_hour, n),
            hourly_generated_energy: report
                .hourly
                .iter()
                .map(|h| h.generated_energy_kwh)
                .collect(),
            hourly_battery_level: report.hourly.iter().map(|h| h.battery_level_kwh).collect(),
            hourly_status: report.hourly.iter().map(|h| h.status.label()).collect(),
        }
    }

    /// Attaches the site coordinates.
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(Location {
            latitude,
            longitude,
        });
        self
    }
}

/// Wall-clock labels (`"HH:00"`) for `n` consecutive hours.
pub fn hour_labels(start_hour: usize, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("{:02}:00", (start_hour + i) % 24))
        .collect()
}
