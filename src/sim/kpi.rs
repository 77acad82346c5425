//! Post-hoc KPI computation from a simulation report.

use std::fmt;

use serde::Serialize;

use super::types::SimulationReport;

/// Decision-support indicators derived from a complete run.
///
/// Computed from the hourly records so the numbers always agree with the
/// series that is exported or plotted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    /// Highest single-hour generation (kWh).
    pub peak_generation_kwh: f64,
    /// Hour index of the generation peak.
    pub peak_generation_hour: usize,
    /// Number of hours with any unmet demand.
    pub hours_with_unmet_demand: usize,
    /// Share of consumption covered by generation or the battery (%).
    pub self_sufficiency_pct: f64,
    /// Energy generated but neither consumed nor stored (kWh).
    pub spilled_energy_kwh: f64,
    /// Energy moved into and out of the battery (kWh).
    pub battery_throughput_kwh: f64,
    /// Throughput divided by twice the battery size.
    pub battery_equivalent_full_cycles: f64,
}

impl KpiReport {
    /// Computes all KPIs from a report.
    pub fn from_report(report: &SimulationReport) -> Self {
        let mut peak_generation_kwh = 0.0_f64;
        let mut peak_generation_hour = 0_usize;
        let mut hours_with_unmet_demand = 0_usize;
        let mut consumption_sum = 0.0_f64;
        let mut spilled = 0.0_f64;

        for h in &report.hourly {
            if h.generated_energy_kwh > peak_generation_kwh {
                peak_generation_kwh = h.generated_energy_kwh;
                peak_generation_hour = h.hour;
            }
            if h.unmet_energy_kwh > 0.0 {
                hours_with_unmet_demand += 1;
            }
            consumption_sum += h.consumption_kwh;

            let net = h.net_energy_kwh();
            if net > 0.0 {
                spilled += (net - h.energy_to_battery_kwh).max(0.0);
            }
        }

        let self_sufficiency_pct = if consumption_sum > 0.0 {
            100.0 * (1.0 - report.total_unmet_energy_kwh / consumption_sum)
        } else {
            100.0
        };

        let throughput =
            report.total_energy_to_battery_kwh + report.total_energy_from_battery_kwh;
        let capacity = report.final_battery.max_capacity_kwh;
        let cycles = if capacity > 0.0 {
            throughput / (2.0 * capacity)
        } else {
            0.0
        };

        Self {
            peak_generation_kwh,
            peak_generation_hour,
            hours_with_unmet_demand,
            self_sufficiency_pct,
            spilled_energy_kwh: spilled,
            battery_throughput_kwh: throughput,
            battery_equivalent_full_cycles: cycles,
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(
            f,
            "Peak generation:       {:.2} kWh (hour {})",
            self.peak_generation_kwh, self.peak_generation_hour
        )?;
        writeln!(f, "Hours with unmet load: {}", self.hours_with_unmet_demand)?;
        writeln!(f, "Self-sufficiency:      {:.1}%", self.self_sufficiency_pct)?;
        writeln!(f, "Spilled energy:        {:.2} kWh", self.spilled_energy_kwh)?;
        write!(
            f,
            "Battery throughput:    {:.2} kWh ({:.2} equiv. cycles)",
            self.battery_throughput_kwh, self.battery_equivalent_full_cycles
        )
    }
}
