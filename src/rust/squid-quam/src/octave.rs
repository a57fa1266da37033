// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! Octave frequency conversion: the up-converter with its IF calibration
//! table, and the down-converters reading back readout signals.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use squid_common::device_traits::OCTAVE_TRAITS;
use squid_common::types::{IfMode, LoSource, OutputMode};
use squid_log::diagnostic;
use squid_units::{Frequency, Hertz};

use crate::error::{Error, Result};
use crate::uid::OctaveUid;

/// Mixer correction applied at one intermediate frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub gain: f64,
    /// Phase correction in radians.
    pub phase: f64,
    pub dc_offset_i: f64,
    pub dc_offset_q: f64,
}

impl Calibration {
    pub const IDENTITY: Calibration = Calibration {
        gain: 1.0,
        phase: 0.0,
        dc_offset_i: 0.0,
        dc_offset_q: 0.0,
    };

    fn lerp(&self, other: &Calibration, weight: f64) -> Calibration {
        let mix = |a: f64, b: f64| a + (b - a) * weight;
        Calibration {
            gain: mix(self.gain, other.gain),
            phase: mix(self.phase, other.phase),
            dc_offset_i: mix(self.dc_offset_i, other.dc_offset_i),
            dc_offset_q: mix(self.dc_offset_q, other.dc_offset_q),
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration::IDENTITY
    }
}

/// Calibration entries kept sorted by intermediate frequency.
///
/// Lookup is a binary search; entries are unique per frequency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationTable(Vec<(Frequency<Hertz>, Calibration)>);

impl CalibrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, frequency: &Frequency<Hertz>) -> Result<usize, usize> {
        self.0.binary_search_by(|(key, _)| key.cmp(frequency))
    }

    /// Insert or overwrite. Returns the replaced entry.
    pub fn upsert(
        &mut self,
        frequency: Frequency<Hertz>,
        calibration: Calibration,
    ) -> Option<Calibration> {
        match self.position(&frequency) {
            Ok(idx) => Some(std::mem::replace(&mut self.0[idx].1, calibration)),
            Err(idx) => {
                self.0.insert(idx, (frequency, calibration));
                None
            }
        }
    }

    pub fn get(&self, frequency: &Frequency<Hertz>) -> Option<&Calibration> {
        self.position(frequency).ok().map(|idx| &self.0[idx].1)
    }

    pub fn remove(&mut self, frequency: &Frequency<Hertz>) -> Option<Calibration> {
        self.position(frequency)
            .ok()
            .map(|idx| self.0.remove(idx).1)
    }

    /// Nearest entries strictly below and above `frequency`.
    pub fn bracket(
        &self,
        frequency: &Frequency<Hertz>,
    ) -> Option<(&(Frequency<Hertz>, Calibration), &(Frequency<Hertz>, Calibration))> {
        let idx = self.position(frequency).err()?;
        if idx == 0 || idx == self.0.len() {
            return None;
        }
        Some((&self.0[idx - 1], &self.0[idx]))
    }

    pub fn frequencies(&self) -> impl Iterator<Item = Frequency<Hertz>> + '_ {
        self.0.iter().map(|(f, _)| *f)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn check_lo_frequency(frequency: Frequency<Hertz>) -> Result<()> {
    if OCTAVE_TRAITS.accepts_lo_frequency(frequency) {
        return Ok(());
    }
    Err(Error::OutOfBand {
        quantity: "LO frequency",
        value: frequency.value(),
        min: OCTAVE_TRAITS.lo_frequency_range.start().value(),
        max: OCTAVE_TRAITS.lo_frequency_range.end().value(),
    })
}

/// Down-conversion of one Octave RF input onto the IF outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DownConverter {
    rf_input: u8,
    lo_frequency: Option<Frequency<Hertz>>,
    lo_source: LoSource,
    if_mode_i: IfMode,
    if_mode_q: IfMode,
    if_output_i: u8,
    if_output_q: u8,
}

impl DownConverter {
    /// Down-converter on `rf_input` with I on IF output 1 and Q on 2.
    ///
    /// RF input 1 defaults to the internal LO, RF input 2 to an external one.
    pub fn new(rf_input: u8) -> Result<Self> {
        if !(1..=OCTAVE_TRAITS.rf_inputs).contains(&rf_input) {
            return Err(Error::InvalidWiring(format!(
                "Octave has no RF input {rf_input}; valid inputs are 1 to {}.",
                OCTAVE_TRAITS.rf_inputs
            )));
        }
        Ok(DownConverter {
            rf_input,
            lo_frequency: None,
            lo_source: if rf_input == 1 {
                LoSource::Internal
            } else {
                LoSource::External
            },
            if_mode_i: IfMode::default(),
            if_mode_q: IfMode::default(),
            if_output_i: 1,
            if_output_q: 2,
        })
    }

    pub fn rf_input(&self) -> u8 {
        self.rf_input
    }

    pub fn lo_frequency(&self) -> Option<Frequency<Hertz>> {
        self.lo_frequency
    }

    pub fn lo_source(&self) -> LoSource {
        self.lo_source
    }

    pub fn if_modes(&self) -> (IfMode, IfMode) {
        (self.if_mode_i, self.if_mode_q)
    }

    /// IF outputs carrying the I and Q quadratures.
    pub fn if_outputs(&self) -> (u8, u8) {
        (self.if_output_i, self.if_output_q)
    }

    pub fn set_lo_frequency(&mut self, frequency: Frequency<Hertz>) -> Result<()> {
        check_lo_frequency(frequency)?;
        self.lo_frequency = Some(frequency);
        Ok(())
    }

    pub fn set_lo_source(&mut self, source: LoSource) {
        self.lo_source = source;
    }

    pub fn set_if_modes(&mut self, mode_i: IfMode, mode_q: IfMode) {
        self.if_mode_i = mode_i;
        self.if_mode_q = mode_q;
    }

    /// Swap or reassign the IF outputs, e.g. when the cables to the
    /// controller inputs are crossed.
    pub fn set_if_outputs(&mut self, output_i: u8, output_q: u8) -> Result<()> {
        let valid = 1..=OCTAVE_TRAITS.if_outputs;
        if !valid.contains(&output_i) || !valid.contains(&output_q) || output_i == output_q {
            return Err(Error::InvalidWiring(format!(
                "IF outputs of RF input {} must be two distinct ports in 1 to {}, got {output_i} and {output_q}.",
                self.rf_input, OCTAVE_TRAITS.if_outputs
            )));
        }
        self.if_output_i = output_i;
        self.if_output_q = output_q;
        Ok(())
    }
}

/// One Octave RF output with its LO and IF calibration state, plus the
/// down-converters of the same Octave.
#[derive(Debug, Clone, PartialEq)]
pub struct OctaveUnit {
    uid: OctaveUid,
    rf_output: Option<u8>,
    lo_frequency: Option<Frequency<Hertz>>,
    lo_source: LoSource,
    gain: f64,
    output_mode: OutputMode,
    calibration: CalibrationTable,
    down_converters: IndexMap<u8, DownConverter>,
}

impl OctaveUnit {
    pub fn new(uid: impl Into<OctaveUid>) -> Self {
        OctaveUnit {
            uid: uid.into(),
            rf_output: None,
            lo_frequency: None,
            lo_source: LoSource::default(),
            gain: 0.0,
            output_mode: OutputMode::default(),
            calibration: CalibrationTable::new(),
            down_converters: IndexMap::new(),
        }
    }

    pub fn uid(&self) -> &OctaveUid {
        &self.uid
    }

    pub fn lo_frequency(&self) -> Option<Frequency<Hertz>> {
        self.lo_frequency
    }

    pub fn rf_output(&self) -> Option<u8> {
        self.rf_output
    }

    pub fn lo_source(&self) -> LoSource {
        self.lo_source
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn calibration_table(&self) -> &CalibrationTable {
        &self.calibration
    }

    pub fn set_lo_frequency(&mut self, frequency: Frequency<Hertz>) -> Result<()> {
        check_lo_frequency(frequency)?;
        self.lo_frequency = Some(frequency);
        Ok(())
    }

    pub fn set_gain(&mut self, gain: f64) -> Result<()> {
        if !OCTAVE_TRAITS.accepts_gain(gain) {
            return Err(Error::InvalidGain(gain));
        }
        self.gain = gain;
        Ok(())
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn set_lo_source(&mut self, source: LoSource) {
        self.lo_source = source;
    }

    pub fn set_rf_output(&mut self, port: u8) -> Result<()> {
        if !(1..=OCTAVE_TRAITS.rf_outputs).contains(&port) {
            return Err(Error::InvalidWiring(format!(
                "Octave '{}' has no RF output {port}; valid ports are 1 to {}.",
                self.uid, OCTAVE_TRAITS.rf_outputs
            )));
        }
        self.rf_output = Some(port);
        Ok(())
    }

    /// Store a calibration for `intermediate_frequency`, replacing any previous entry.
    pub fn add_calibration(
        &mut self,
        intermediate_frequency: Frequency<Hertz>,
        gain: f64,
        phase: f64,
        dc_offsets: (f64, f64),
    ) -> Result<()> {
        if !intermediate_frequency.is_finite() {
            return Err(Error::OutOfBand {
                quantity: "intermediate frequency",
                value: intermediate_frequency.value(),
                min: f64::NEG_INFINITY,
                max: f64::INFINITY,
            });
        }
        let calibration = Calibration {
            gain,
            phase,
            dc_offset_i: dc_offsets.0,
            dc_offset_q: dc_offsets.1,
        };
        if let Some(previous) = self.calibration.upsert(intermediate_frequency, calibration) {
            diagnostic!(
                "Octave '{}': recalibrated {}, gain {} -> {}, phase {} -> {}",
                self.uid,
                intermediate_frequency,
                previous.gain,
                gain,
                previous.phase,
                phase
            );
        }
        Ok(())
    }

    pub fn add_down_converter(&mut self, converter: DownConverter) -> Result<()> {
        if self.down_converters.contains_key(&converter.rf_input) {
            return Err(Error::DuplicateId {
                scope: format!("down-converters of octave '{}'", self.uid),
                id: format!("RF input {}", converter.rf_input),
            });
        }
        self.down_converters.insert(converter.rf_input, converter);
        Ok(())
    }

    pub fn down_converter(&self, rf_input: u8) -> Option<&DownConverter> {
        self.down_converters.get(&rf_input)
    }

    pub fn down_converter_mut(&mut self, rf_input: u8) -> Option<&mut DownConverter> {
        self.down_converters.get_mut(&rf_input)
    }

    pub fn down_converters(&self) -> impl Iterator<Item = &DownConverter> {
        self.down_converters.values()
    }

    pub fn remove_calibration(&mut self, intermediate_frequency: Frequency<Hertz>) -> Option<Calibration> {
        self.calibration.remove(&intermediate_frequency)
    }

    pub fn calibrated_frequencies(&self) -> Vec<Frequency<Hertz>> {
        self.calibration.frequencies().collect()
    }

    /// Calibration at `intermediate_frequency`.
    ///
    /// An exact entry is returned unchanged. Between two calibrated
    /// neighbours every field is interpolated linearly. Outside the
    /// calibrated span the lookup fails; there is no extrapolation.
    pub fn resolve_calibration(&self, intermediate_frequency: Frequency<Hertz>) -> Result<Calibration> {
        let uncalibrated = || Error::UncalibratedFrequency {
            octave: self.uid.clone(),
            frequency: intermediate_frequency.value(),
        };
        if !intermediate_frequency.is_finite() {
            return Err(uncalibrated());
        }
        if let Some(calibration) = self.calibration.get(&intermediate_frequency) {
            return Ok(*calibration);
        }
        let ((low_f, low), (high_f, high)) = self
            .calibration
            .bracket(&intermediate_frequency)
            .ok_or_else(uncalibrated)?;
        let weight = (intermediate_frequency - *low_f).value() / (*high_f - *low_f).value();
        diagnostic!(
            "Octave '{}': interpolating calibration at {} between {} and {}",
            self.uid,
            intermediate_frequency,
            low_f,
            high_f
        );
        Ok(low.lerp(high, weight))
    }
}
