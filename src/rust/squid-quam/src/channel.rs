// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;

use squid_units::{Frequency, Hertz};

use crate::error::{Error, Result};
use crate::octave::{Calibration, OctaveUnit};
use crate::tree::NodePath;
use crate::uid::{ChannelUid, OctaveUid};
use crate::wiring::ChannelWiring;

/// Lookup of Octave units by id.
///
/// Bindings only hold the id; the unit itself is owned by the tree.
pub trait OctaveLookup {
    fn octave(&self, uid: &OctaveUid) -> Option<&OctaveUnit>;
}

impl OctaveLookup for IndexMap<OctaveUid, OctaveUnit> {
    fn octave(&self, uid: &OctaveUid) -> Option<&OctaveUnit> {
        self.get(uid)
    }
}

/// Association of a controller channel with the pulse set it plays.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBinding {
    channel: ChannelUid,
    pulse_set: NodePath,
    octave: Option<OctaveUid>,
    intermediate_frequency: Option<Frequency<Hertz>>,
    wiring: Option<ChannelWiring>,
}

impl ChannelBinding {
    /// Bind `channel` to `pulse_set`, optionally up-converted through `octave`.
    ///
    /// A channel routed through an Octave needs an intermediate frequency.
    pub fn bind(
        channel: impl Into<ChannelUid>,
        pulse_set: impl Into<NodePath>,
        octave: Option<OctaveUid>,
        intermediate_frequency: Option<Frequency<Hertz>>,
    ) -> Result<Self> {
        let channel = channel.into();
        if let Some(octave) = &octave
            && intermediate_frequency.is_none()
        {
            return Err(Error::MissingIntermediateFrequency {
                channel,
                octave: octave.clone(),
            });
        }
        Ok(ChannelBinding {
            channel,
            pulse_set: pulse_set.into(),
            octave,
            intermediate_frequency,
            wiring: None,
        })
    }

    /// Cabling to the Octave: an I/Q drive pair or a readout feed line.
    pub fn with_wiring(mut self, wiring: impl Into<ChannelWiring>) -> Self {
        self.wiring = Some(wiring.into());
        self
    }

    pub fn channel(&self) -> &ChannelUid {
        &self.channel
    }

    pub fn pulse_set(&self) -> &NodePath {
        &self.pulse_set
    }

    pub fn octave(&self) -> Option<&OctaveUid> {
        self.octave.as_ref()
    }

    pub fn intermediate_frequency(&self) -> Option<Frequency<Hertz>> {
        self.intermediate_frequency
    }

    pub fn wiring(&self) -> Option<&ChannelWiring> {
        self.wiring.as_ref()
    }

    /// Calibration the channel plays with.
    ///
    /// Unbound channels use [`Calibration::IDENTITY`].
    pub fn effective_calibration(&self, octaves: &impl OctaveLookup) -> Result<Calibration> {
        let Some(uid) = &self.octave else {
            return Ok(Calibration::IDENTITY);
        };
        let octave = octaves
            .octave(uid)
            .ok_or_else(|| Error::UnknownOctave(uid.clone()))?;
        let frequency = self
            .intermediate_frequency
            .ok_or_else(|| Error::MissingIntermediateFrequency {
                channel: self.channel.clone(),
                octave: uid.clone(),
            })?;
        octave.resolve_calibration(frequency)
    }
}
