// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::device_traits::DeviceTraits;

/// Controller generating the baseband signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    #[default]
    OpxPlus,
    Opx1000Lf,
}

impl ControllerKind {
    pub fn traits(&self) -> &'static DeviceTraits {
        DeviceTraits::from_controller_kind(self)
    }
}

/// Fast switch mode of an Octave up-converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    #[default]
    AlwaysOn,
    AlwaysOff,
    /// Plays on a rising edge of the Octave digital port.
    Triggered,
    /// Plays on a falling edge of the Octave digital port.
    TriggeredReversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoSource {
    #[default]
    Internal,
    External,
}

/// Routing of one quadrature through the IF stage of an Octave down-converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfMode {
    /// Bypasses the IF stage.
    #[default]
    Direct,
    Envelope,
    Mixer,
    Off,
}
