// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::uid::{ChannelUid, OctaveUid, PulseUid};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Duplicate id '{id}' in {scope}.")]
    DuplicateId { scope: String, id: String },

    #[error("Unresolved parameter '{attribute}' on node '{node}': {reason}.")]
    UnresolvedParameter {
        node: String,
        attribute: String,
        reason: String,
    },

    #[error("Cyclic reference: '{attribute}' on node '{node}' was visited twice.")]
    CyclicReference { node: String, attribute: String },

    #[error("{quantity} {value} outside of the supported range [{min}, {max}].")]
    OutOfBand {
        quantity: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error(
        "Intermediate frequency {frequency} Hz is outside the calibrated span of octave '{octave}'."
    )]
    UncalibratedFrequency { octave: OctaveUid, frequency: f64 },

    #[error("Channel '{channel}' is routed through octave '{octave}' without an intermediate frequency.")]
    MissingIntermediateFrequency {
        channel: ChannelUid,
        octave: OctaveUid,
    },

    #[error("Octave '{0}' has no LO frequency set.")]
    MissingLoFrequency(OctaveUid),

    #[error("Down-converter on RF input {rf_input} of octave '{octave}' has no LO frequency set.")]
    MissingDownConverterLo { octave: OctaveUid, rf_input: u8 },

    #[error("Octave gain {0} dB must lie in [-20, 20] dB on a 0.5 dB grid.")]
    InvalidGain(f64),

    #[error("Unknown pulse set '{0}'.")]
    UnknownPulseSet(String),

    #[error("Unknown octave '{0}'.")]
    UnknownOctave(OctaveUid),

    #[error("{0}")]
    InvalidWiring(String),

    #[error("Parameter '{attribute}' on node '{node}' is not {expected}.")]
    TypeMismatch {
        node: String,
        attribute: String,
        expected: &'static str,
    },

    #[error("Duration {duration} ns is not a positive multiple of the {resolution} ns clock.")]
    DurationNotAligned { duration: i64, resolution: i64 },

    #[error("Duration {duration} ns is shorter than the minimum of {minimum} ns.")]
    DurationTooShort { duration: i64, minimum: i64 },

    #[error("Amplitude {amplitude} V exceeds the output range of +/-{limit} V.")]
    AmplitudeOutOfRange { amplitude: f64, limit: f64 },

    #[error("Waveform has {actual} samples but its duration requires {expected}.")]
    SampleCountMismatch { expected: i64, actual: i64 },

    #[error("Invalid shape parameter '{parameter}': {value}.")]
    InvalidShapeParameter { parameter: &'static str, value: f64 },

    #[error("Invalid digital marker ({level}, {length}).")]
    InvalidDigitalMarker { level: i64, length: i64 },

    #[error("Component tree is corrupted: {0}.")]
    CorruptedTree(String),

    #[error("Build failed with {} violation(s): {}", .0.len(), display_violations(.0))]
    BuildValidation(Vec<Violation>),
}

impl Error {
    /// Whether the error leaves the tree in a state where further traversal is unsafe.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::CyclicReference { .. } | Error::CorruptedTree(_))
    }
}

/// Component a [`Violation`] is reported against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    PulseSet(String),
    Template { pulse_set: String, pulse: PulseUid },
    Channel(ChannelUid),
    Octave(OctaveUid),
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::PulseSet(name) => write!(f, "pulse set '{name}'"),
            Component::Template { pulse_set, pulse } => {
                write!(f, "pulse '{pulse}' of pulse set '{pulse_set}'")
            }
            Component::Channel(uid) => write!(f, "channel '{uid}'"),
            Component::Octave(uid) => write!(f, "octave '{uid}'"),
        }
    }
}

/// A broken invariant, naming the offending component.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub component: Component,
    pub error: Error,
}

impl Violation {
    pub fn new(component: Component, error: Error) -> Self {
        Violation { component, error }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.component, self.error)
    }
}

fn display_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
