// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

use std::ops::RangeInclusive;

use crate::types::ControllerKind;
use squid_units::{
    Duration, Frequency, Hertz, Nanosecond, Volt, Voltage, hertz, nanoseconds, volts,
};

/// Limits of a controller's analog front-end
pub struct DeviceTraits {
    pub sampling_rate: f64,
    /// Pulse durations must be a multiple of this grid.
    pub clock_resolution: Duration<Nanosecond, i64>,
    pub min_pulse_duration: Duration<Nanosecond, i64>,
    pub output_voltage_range: RangeInclusive<Voltage<Volt>>,
    pub max_intermediate_frequency: Frequency<Hertz>,
    pub analog_outputs: u8,
    pub analog_inputs: u8,
}

impl DeviceTraits {
    pub fn from_controller_kind(kind: &ControllerKind) -> &'static Self {
        match kind {
            ControllerKind::OpxPlus => &OPX_PLUS_TRAITS,
            ControllerKind::Opx1000Lf => &OPX1000_LF_TRAITS,
        }
    }

    pub fn max_amplitude(&self) -> f64 {
        self.output_voltage_range.end().value()
    }

    pub fn accepts_amplitude(&self, amplitude: f64) -> bool {
        amplitude.is_finite() && self.output_voltage_range.contains(&volts(amplitude))
    }

    pub fn accepts_intermediate_frequency(&self, frequency: Frequency<Hertz>) -> bool {
        frequency.is_finite()
            && frequency.value().abs() <= self.max_intermediate_frequency.value()
    }
}

pub const OPX_PLUS_TRAITS: DeviceTraits = DeviceTraits {
    sampling_rate: 1e9,
    clock_resolution: nanoseconds(4),
    min_pulse_duration: nanoseconds(16),
    output_voltage_range: volts(-0.5)..=volts(0.5),
    max_intermediate_frequency: hertz(400e6),
    analog_outputs: 10,
    analog_inputs: 2,
};

pub const OPX1000_LF_TRAITS: DeviceTraits = DeviceTraits {
    sampling_rate: 1e9,
    clock_resolution: nanoseconds(4),
    min_pulse_duration: nanoseconds(16),
    output_voltage_range: volts(-2.5)..=volts(2.5),
    max_intermediate_frequency: hertz(400e6),
    analog_outputs: 8,
    analog_inputs: 2,
};

/// Limits of the Octave up- and down-conversion stages
pub struct OctaveTraits {
    pub lo_frequency_range: RangeInclusive<Frequency<Hertz>>,
    /// Output gain range in dB
    pub gain_range: RangeInclusive<f64>,
    pub gain_step: f64,
    pub rf_outputs: u8,
    pub rf_inputs: u8,
    /// IF outputs of the down-conversion stage, shared by all RF inputs.
    pub if_outputs: u8,
}

impl OctaveTraits {
    pub fn accepts_lo_frequency(&self, frequency: Frequency<Hertz>) -> bool {
        frequency.is_finite() && self.lo_frequency_range.contains(&frequency)
    }

    pub fn accepts_gain(&self, gain: f64) -> bool {
        if !self.gain_range.contains(&gain) {
            return false;
        }
        let steps = gain / self.gain_step;
        (steps - steps.round()).abs() < 1e-9
    }
}

pub const OCTAVE_TRAITS: OctaveTraits = OctaveTraits {
    lo_frequency_range: hertz(2e9)..=hertz(18e9),
    gain_range: -20.0..=20.0,
    gain_step: 0.5,
    rf_outputs: 5,
    rf_inputs: 2,
    if_outputs: 2,
};
