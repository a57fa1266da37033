// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! Pulse sets, Octave units and configuration building for the SQuID Lab QuAM.
//!
//! The hardware description ([`Quam`]) is edited freely. A [`ConfigBuilder`]
//! turns it into an immutable [`LowLevelConfig`], or reports every
//! violation found in one pass.

pub mod builder;
pub mod channel;
pub mod config;
pub mod error;
pub mod octave;
pub mod parameter_resolver;
pub mod pulse;
pub mod pulse_set;
pub mod quam;
pub mod settings;
pub mod tree;
pub mod uid;
pub mod wiring;

pub use builder::{BuildState, ConfigBuilder};
pub use channel::{ChannelBinding, OctaveLookup};
pub use config::{ChannelConfig, LowLevelConfig, OctaveConfig, RfInputConfig};
pub use error::{Component, Error, Result, Violation};
pub use octave::{Calibration, CalibrationTable, DownConverter, OctaveUnit};
pub use parameter_resolver::{ParameterResolver, ValueOrParameter};
pub use pulse::{PulseShape, PulseTemplate, ResolvedPulse, Waveform};
pub use pulse_set::{DragGaussianParameters, PulseSet, PulseSetContext};
pub use quam::Quam;
pub use settings::BuilderSettings;
pub use tree::{ComponentTree, NodePath, ParameterTree, Value};
pub use uid::{ChannelUid, OctaveUid, PulseUid};
pub use wiring::{ChannelWiring, ControllerPort, FeedLineWiring, IqWiring};
