//! CSV export for hourly simulation results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::HourlyResult;

/// Column header for CSV telemetry export.
const HEADER: &str = "hour,generated_energy_kwh,consumption_kwh,battery_level_kwh,\
                      energy_to_battery_kwh,energy_from_battery_kwh,unmet_energy_kwh,status";

/// Exports hourly results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per hour. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[HourlyResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes hourly results as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[HourlyResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        wtr.write_record(&[
            r.hour.to_string(),
            format!("{:.4}", r.generated_energy_kwh),
            format!("{:.4}", r.consumption_kwh),
            format!("{:.4}", r.battery_level_kwh),
            format!("{:.4}", r.energy_to_battery_kwh),
            format!("{:.4}", r.energy_from_battery_kwh),
            format!("{:.4}", r.unmet_energy_kwh),
            r.status.label().to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
