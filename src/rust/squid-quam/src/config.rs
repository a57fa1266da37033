// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! Low-level configuration handed to the instrument compiler.
//!
//! A configuration is only created by the config builder and never changes
//! afterwards; a rebuild replaces it as a whole.

use indexmap::IndexMap;
use serde::Serialize;

use squid_common::types::{IfMode, LoSource, OutputMode};
use squid_units::{Frequency, Hertz};

use crate::octave::{Calibration, DownConverter, OctaveUnit};
use crate::pulse::ResolvedPulse;
use crate::uid::{ChannelUid, OctaveUid, PulseUid};
use crate::wiring::{ChannelWiring, ControllerPort};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelConfig {
    pulse_set: String,
    pulses: IndexMap<PulseUid, ResolvedPulse>,
    calibration: Calibration,
    #[serde(skip_serializing_if = "Option::is_none")]
    intermediate_frequency: Option<Frequency<Hertz>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    octave: Option<OctaveUid>,
    /// LO plus IF of the up-converted signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    rf_frequency: Option<Frequency<Hertz>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wiring: Option<ChannelWiring>,
}

impl ChannelConfig {
    pub(crate) fn new(
        pulse_set: String,
        pulses: IndexMap<PulseUid, ResolvedPulse>,
        calibration: Calibration,
    ) -> Self {
        ChannelConfig {
            pulse_set,
            pulses,
            calibration,
            intermediate_frequency: None,
            octave: None,
            rf_frequency: None,
            wiring: None,
        }
    }

    pub(crate) fn with_intermediate_frequency(mut self, frequency: Option<Frequency<Hertz>>) -> Self {
        self.intermediate_frequency = frequency;
        self
    }

    pub(crate) fn with_octave(
        mut self,
        octave: OctaveUid,
        rf_frequency: Option<Frequency<Hertz>>,
    ) -> Self {
        self.octave = Some(octave);
        self.rf_frequency = rf_frequency;
        self
    }

    pub(crate) fn with_wiring(mut self, wiring: Option<ChannelWiring>) -> Self {
        self.wiring = wiring;
        self
    }

    pub fn pulse_set(&self) -> &str {
        &self.pulse_set
    }

    pub fn pulses(&self) -> &IndexMap<PulseUid, ResolvedPulse> {
        &self.pulses
    }

    pub fn pulse(&self, id: &PulseUid) -> Option<&ResolvedPulse> {
        self.pulses.get(id)
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn intermediate_frequency(&self) -> Option<Frequency<Hertz>> {
        self.intermediate_frequency
    }

    pub fn octave(&self) -> Option<&OctaveUid> {
        self.octave.as_ref()
    }

    pub fn rf_frequency(&self) -> Option<Frequency<Hertz>> {
        self.rf_frequency
    }

    pub fn wiring(&self) -> Option<&ChannelWiring> {
        self.wiring.as_ref()
    }
}

/// Settings of a down-converter read by at least one feed line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfInputConfig {
    pub lo_frequency: Frequency<Hertz>,
    pub lo_source: LoSource,
    pub if_mode_i: IfMode,
    pub if_mode_q: IfMode,
}

impl RfInputConfig {
    pub(crate) fn from_converter(converter: &DownConverter, lo_frequency: Frequency<Hertz>) -> Self {
        let (if_mode_i, if_mode_q) = converter.if_modes();
        RfInputConfig {
            lo_frequency,
            lo_source: converter.lo_source(),
            if_mode_i,
            if_mode_q,
        }
    }
}

/// Settings of an Octave referenced by at least one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OctaveConfig {
    pub lo_frequency: Frequency<Hertz>,
    pub lo_source: LoSource,
    pub gain: f64,
    pub output_mode: OutputMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rf_output: Option<u8>,
    /// Down-converters by RF input.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub rf_inputs: IndexMap<u8, RfInputConfig>,
    /// Controller input fed by each IF output.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub if_outputs: IndexMap<u8, ControllerPort>,
}

impl OctaveConfig {
    pub(crate) fn from_unit(octave: &OctaveUnit, lo_frequency: Frequency<Hertz>) -> Self {
        OctaveConfig {
            lo_frequency,
            lo_source: octave.lo_source(),
            gain: octave.gain(),
            output_mode: octave.output_mode(),
            rf_output: octave.rf_output(),
            rf_inputs: IndexMap::new(),
            if_outputs: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LowLevelConfig {
    channels: IndexMap<ChannelUid, ChannelConfig>,
    octaves: IndexMap<OctaveUid, OctaveConfig>,
}

impl LowLevelConfig {
    pub(crate) fn new(
        channels: IndexMap<ChannelUid, ChannelConfig>,
        octaves: IndexMap<OctaveUid, OctaveConfig>,
    ) -> Self {
        LowLevelConfig { channels, octaves }
    }

    pub fn channels(&self) -> &IndexMap<ChannelUid, ChannelConfig> {
        &self.channels
    }

    pub fn channel(&self, uid: &ChannelUid) -> Option<&ChannelConfig> {
        self.channels.get(uid)
    }

    pub fn octaves(&self) -> &IndexMap<OctaveUid, OctaveConfig> {
        &self.octaves
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
