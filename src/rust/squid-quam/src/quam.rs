// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;

use crate::channel::ChannelBinding;
use crate::error::{Error, Result};
use crate::octave::OctaveUnit;
use crate::pulse_set::PulseSet;
use crate::tree::{NodePath, ParameterTree};
use crate::uid::{ChannelUid, OctaveUid};

/// Root of the hardware description consumed by the config builder.
///
/// Pulse sets are keyed by their tree path, so names only need to be
/// unique within their parent scope.
#[derive(Debug, Clone, Default)]
pub struct Quam {
    pub parameters: ParameterTree,
    pulse_sets: IndexMap<NodePath, PulseSet>,
    octaves: IndexMap<OctaveUid, OctaveUnit>,
    channels: IndexMap<ChannelUid, ChannelBinding>,
}

impl Quam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pulse_set(&mut self, pulse_set: PulseSet) -> Result<NodePath> {
        let path = pulse_set.path();
        if self.pulse_sets.contains_key(&path) {
            return Err(Error::DuplicateId {
                scope: format!("scope '{}'", pulse_set.scope()),
                id: pulse_set.name().to_string(),
            });
        }
        self.pulse_sets.insert(path.clone(), pulse_set);
        Ok(path)
    }

    pub fn add_octave(&mut self, octave: OctaveUnit) -> Result<()> {
        if self.octaves.contains_key(octave.uid()) {
            return Err(Error::DuplicateId {
                scope: "octaves".to_string(),
                id: octave.uid().to_string(),
            });
        }
        self.octaves.insert(octave.uid().clone(), octave);
        Ok(())
    }

    pub fn bind_channel(&mut self, binding: ChannelBinding) -> Result<()> {
        if self.channels.contains_key(binding.channel()) {
            return Err(Error::DuplicateId {
                scope: "channels".to_string(),
                id: binding.channel().to_string(),
            });
        }
        self.channels.insert(binding.channel().clone(), binding);
        Ok(())
    }

    pub fn unbind(&mut self, channel: &ChannelUid) -> Option<ChannelBinding> {
        self.channels.shift_remove(channel)
    }

    pub fn pulse_set(&self, path: &NodePath) -> Option<&PulseSet> {
        self.pulse_sets.get(path)
    }

    pub fn pulse_set_mut(&mut self, path: &NodePath) -> Option<&mut PulseSet> {
        self.pulse_sets.get_mut(path)
    }

    pub fn pulse_sets(&self) -> impl Iterator<Item = &PulseSet> {
        self.pulse_sets.values()
    }

    pub fn octave(&self, uid: &OctaveUid) -> Option<&OctaveUnit> {
        self.octaves.get(uid)
    }

    pub fn octave_mut(&mut self, uid: &OctaveUid) -> Option<&mut OctaveUnit> {
        self.octaves.get_mut(uid)
    }

    pub fn octaves(&self) -> &IndexMap<OctaveUid, OctaveUnit> {
        &self.octaves
    }

    pub fn channel(&self, uid: &ChannelUid) -> Option<&ChannelBinding> {
        self.channels.get(uid)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelBinding> {
        self.channels.values()
    }

    /// Channels a pulse set is applied to.
    pub fn channels_of(&self, pulse_set: &NodePath) -> impl Iterator<Item = &ChannelUid> {
        self.channels
            .values()
            .filter(move |binding| binding.pulse_set() == pulse_set)
            .map(ChannelBinding::channel)
    }
}
