//! Battery-fed electric motor driving pumps in place of a turbine.
//!
//! Sizing runs backwards from the shaft power the pumps draw: motor and
//! inverter losses set the power the battery must deliver, and the battery
//! mass is the larger of its power-limited and energy-limited sizes.

use crate::error::{ComponentError, ComponentResult};
use rc_core::units::{Power, Time, s, watts};
use uom::si::power::watt;
use uom::si::time::second;

/// Battery discharge efficiency never reaches unity.
const MAX_BATTERY_EFFICIENCY: f64 = 0.99;

fn positive(value: f64, what: &'static str) -> ComponentResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ComponentError::InvalidArg { what })
    }
}

fn fraction(value: f64, what: &'static str) -> ComponentResult<f64> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(ComponentError::InvalidArg { what })
    }
}

/// Lithium-polymer class battery pack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Battery {
    /// [J/kg]
    specific_energy: f64,
    /// [W/kg]
    specific_power: f64,
    /// Pack mass over cell mass.
    packing_factor: f64,
    burn_time: Time,
}

impl Battery {
    pub fn new(specific_energy: f64, specific_power: f64, packing_factor: f64, burn_time: Time) -> ComponentResult<Self> {
        positive(specific_energy, "battery specific energy must be positive")?;
        positive(specific_power, "battery specific power must be positive")?;
        if !(packing_factor.is_finite() && packing_factor >= 1.0) {
            return Err(ComponentError::InvalidArg {
                what: "battery packing factor must be at least 1",
            });
        }
        positive(burn_time.get::<second>(), "burn time must be positive")?;
        Ok(Self {
            specific_energy,
            specific_power,
            packing_factor,
            burn_time,
        })
    }

    /// Li-Po pack: 198 Wh/kg, 6.95 kW/kg, packing factor 1.2.
    pub fn lithium_polymer(burn_time: Time) -> ComponentResult<Self> {
        Self::new(198.0 * 3600.0, 6.95e3, 1.2, burn_time)
    }

    pub fn burn_time(&self) -> Time {
        self.burn_time
    }

    /// Discharge efficiency, which improves with longer, gentler discharges.
    pub fn efficiency(&self) -> f64 {
        (0.093 * self.burn_time.get::<second>().ln() + 0.3301).clamp(0.0, MAX_BATTERY_EFFICIENCY)
    }
}

/// Power and mass breakdown of a sized electric drive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectricDriveReport {
    pub shaft_power_w: f64,
    pub motor_input_w: f64,
    pub battery_output_w: f64,
    pub battery_input_w: f64,
    /// Battery heat loss [W].
    pub battery_heat_w: f64,
    /// Energy drawn from the pack over the burn [J].
    pub energy_j: f64,
    pub battery_efficiency: f64,
    pub motor_mass_kg: f64,
    pub inverter_mass_kg: f64,
    pub battery_mass_kg: f64,
}

impl ElectricDriveReport {
    pub fn total_mass_kg(&self) -> f64 {
        self.motor_mass_kg + self.inverter_mass_kg + self.battery_mass_kg
    }
}

/// Motor, inverter and battery chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectricDrive {
    motor_efficiency: f64,
    /// [W/kg]
    motor_specific_power: f64,
    inverter_efficiency: f64,
    /// [W/kg]
    inverter_specific_power: f64,
    battery: Battery,
}

impl ElectricDrive {
    pub fn new(
        motor_efficiency: f64,
        motor_specific_power: f64,
        inverter_efficiency: f64,
        inverter_specific_power: f64,
        battery: Battery,
    ) -> ComponentResult<Self> {
        fraction(motor_efficiency, "motor efficiency must be in (0, 1]")?;
        fraction(inverter_efficiency, "inverter efficiency must be in (0, 1]")?;
        positive(motor_specific_power, "motor specific power must be positive")?;
        positive(inverter_specific_power, "inverter specific power must be positive")?;
        Ok(Self {
            motor_efficiency,
            motor_specific_power,
            inverter_efficiency,
            inverter_specific_power,
            battery,
        })
    }

    /// Brushless DC motor (95 %, 5.3 kW/kg) with an 85 %, 60 kW/kg
    /// inverter.
    pub fn with_battery(battery: Battery) -> ComponentResult<Self> {
        Self::new(0.95, 5.3e3, 0.85, 60e3, battery)
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn motor_efficiency(&self) -> f64 {
        self.motor_efficiency
    }

    pub fn inverter_efficiency(&self) -> f64 {
        self.inverter_efficiency
    }

    /// Electric power the battery must deliver for a shaft power.
    pub fn battery_output(&self, shaft_power: Power) -> Power {
        watts(shaft_power.get::<watt>() / self.motor_efficiency / self.inverter_efficiency)
    }

    pub fn size(&self, shaft_power: Power) -> ComponentResult<ElectricDriveReport> {
        let p_shaft = shaft_power.get::<watt>();
        if !(p_shaft.is_finite() && p_shaft >= 0.0) {
            return Err(ComponentError::NonPhysical {
                what: "electric drive shaft power",
            });
        }
        let eta_battery = self.battery.efficiency();
        if eta_battery <= 0.0 {
            return Err(ComponentError::Infeasible {
                what: format!(
                    "burn of {:.3} s is too short for a usable battery efficiency",
                    self.battery.burn_time.get::<second>()
                ),
            });
        }
        let t = self.battery.burn_time.get::<second>();
        let motor_input = p_shaft / self.motor_efficiency;
        let battery_output = motor_input / self.inverter_efficiency;
        let battery_input = battery_output / eta_battery;

        let b = &self.battery;
        let power_limited = b.packing_factor * battery_output / b.specific_power;
        let energy_limited = b.packing_factor * battery_output * t / (b.specific_energy * eta_battery);

        Ok(ElectricDriveReport {
            shaft_power_w: p_shaft,
            motor_input_w: motor_input,
            battery_output_w: battery_output,
            battery_input_w: battery_input,
            battery_heat_w: battery_input * (1.0 - eta_battery),
            energy_j: battery_input * t,
            battery_efficiency: eta_battery,
            motor_mass_kg: p_shaft / self.motor_specific_power,
            inverter_mass_kg: motor_input / self.inverter_specific_power,
            battery_mass_kg: power_limited.max(energy_limited),
        })
    }
}

impl Default for Battery {
    /// Li-Po pack for a 300 s burn.
    fn default() -> Self {
        Self {
            specific_energy: 198.0 * 3600.0,
            specific_power: 6.95e3,
            packing_factor: 1.2,
            burn_time: s(300.0),
        }
    }
}
