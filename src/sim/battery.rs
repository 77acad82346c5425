//! Net-energy battery step.
//!
//! Surplus generation charges the battery up to its headroom; a deficit is
//! drawn from the battery down to empty and whatever remains is unmet.

use super::types::{BatteryState, BatteryStatus, EnergyFlows};

/// Advances the battery by one hour.
///
/// # Arguments
///
/// * `state` - Battery charge before this hour
/// * `generated_kwh` - Energy generated this hour
/// * `consumption_kwh` - Energy consumed this hour
/// * `max_capacity_kwh` - Battery size
///
/// # Returns
///
/// The updated state and the energy that moved. The updated charge is
/// always within `[0, max_capacity_kwh]`.
///
/// # Examples
///
/// ```
/// use solar_sim::sim::battery::step;
/// use solar_sim::sim::types::{BatteryState, BatteryStatus};
///
/// let (state, flows) = step(BatteryState::clamped(10.0, 10.0), 20.0, 5.0, 10.0);
/// assert_eq!(state.current_capacity_kwh, 10.0);
/// assert_eq!(flows.to_battery_kwh, 0.0);
/// assert_eq!(flows.status, BatteryStatus::Full);
/// ```
pub fn step(
    state: BatteryState,
    generated_kwh: f64,
    consumption_kwh: f64,
    max_capacity_kwh: f64,
) -> (BatteryState, EnergyFlows) {
    let net = generated_kwh - consumption_kwh;
    let mut current = state.current_capacity_kwh;

    let flows = if net > 0.0 {
        let space = max_capacity_kwh - current;
        let stored = net.min(space).max(0.0);
        current += stored;
        let status = if stored > 0.0 {
            BatteryStatus::Charging
        } else {
            BatteryStatus::Full
        };
        EnergyFlows {
            to_battery_kwh: stored,
            from_battery_kwh: 0.0,
            unmet_kwh: 0.0,
            status,
        }
    } else {
        // net == 0 lands here with nothing needed: idle.
        let needed = (-net).max(0.0);
        let drawn = needed.min(current).max(0.0);
        current -= drawn;
        let status = if drawn > 0.0 {
            BatteryStatus::Discharging
        } else if needed > 0.0 && current <= 0.0 {
            BatteryStatus::Empty
        } else {
            BatteryStatus::Idle
        };
        EnergyFlows {
            to_battery_kwh: 0.0,
            from_battery_kwh: drawn,
            unmet_kwh: needed - drawn,
            status,
        }
    };

    let updated = BatteryState::clamped(current, max_capacity_kwh);
    (updated, flows)
}
