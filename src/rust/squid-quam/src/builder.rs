// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! Compilation of the hardware description into a [`LowLevelConfig`].
//!
//! A build runs `Idle -> Validating -> Resolving -> Emitting -> Built` and
//! drops to `Failed` on the first stage that reports a violation. All
//! violations of a stage are reported together. The previous configuration
//! stays the last known good one until a build succeeds.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use squid_log::{diagnostic, info, warn};

use crate::channel::ChannelBinding;
use crate::config::{ChannelConfig, LowLevelConfig, OctaveConfig, RfInputConfig};
use crate::error::{Component, Error, Result, Violation};
use crate::octave::{Calibration, OctaveUnit};
use crate::pulse::ResolvedPulse;
use crate::pulse_set::PulseSetContext;
use crate::quam::Quam;
use crate::settings::BuilderSettings;
use crate::tree::{NodePath, ParameterTree};
use crate::uid::{ChannelUid, OctaveUid, PulseUid};
use crate::wiring::{ChannelWiring, ControllerPort, FeedLineWiring};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildState {
    Idle,
    Validating,
    Resolving,
    Emitting,
    Built,
    Failed,
}

impl BuildState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildState::Built | BuildState::Failed)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildState::Idle => "idle",
            BuildState::Validating => "validating",
            BuildState::Resolving => "resolving",
            BuildState::Emitting => "emitting",
            BuildState::Built => "built",
            BuildState::Failed => "failed",
        };
        f.write_str(name)
    }
}

type ResolvedPulses = IndexMap<PulseUid, ResolvedPulse>;

pub struct ConfigBuilder {
    settings: BuilderSettings,
    history: Vec<BuildState>,
    last_built: Option<Arc<LowLevelConfig>>,
}

impl ConfigBuilder {
    pub fn new(mut settings: BuilderSettings) -> Self {
        for change in settings.sanitize() {
            warn!(
                "Setting '{}' changed from {} to {}: {}",
                change.field,
                change.original,
                change.sanitized,
                change.reason
            );
        }
        ConfigBuilder {
            settings,
            history: vec![BuildState::Idle],
            last_built: None,
        }
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    pub fn state(&self) -> BuildState {
        self.history.last().copied().unwrap_or(BuildState::Idle)
    }

    /// States visited by the most recent build, starting at `Idle`.
    pub fn history(&self) -> &[BuildState] {
        &self.history
    }

    /// Configuration of the last successful build.
    pub fn last_built(&self) -> Option<&Arc<LowLevelConfig>> {
        self.last_built.as_ref()
    }

    fn transition(&mut self, next: BuildState) {
        diagnostic!("Config build: {} -> {}", self.state(), next);
        self.history.push(next);
    }

    fn fail(&mut self, violations: Vec<Violation>) -> Error {
        self.transition(BuildState::Failed);
        warn!("Config build failed with {} violation(s)", violations.len());
        Error::BuildValidation(violations)
    }

    /// Build a new configuration from `quam`.
    ///
    /// The description stays read-locked until the build has finished.
    pub fn build(&mut self, quam: &RwLock<Quam>) -> Result<Arc<LowLevelConfig>> {
        self.history = vec![BuildState::Idle];
        let quam = match quam.read() {
            Ok(guard) => guard,
            Err(_) => {
                self.transition(BuildState::Failed);
                warn!("Config build aborted: component tree lock is poisoned");
                return Err(Error::CorruptedTree(
                    "a writer panicked while holding the tree lock".to_string(),
                ));
            }
        };
        let ctx = PulseSetContext {
            check_waveform_peak: self.settings.check_waveform_peak,
            ..PulseSetContext::new(
                &quam.parameters,
                self.settings.traits(),
                self.settings.max_reference_depth,
            )
        };

        self.transition(BuildState::Validating);
        let violations = self.validate(&quam, &ctx);
        if !violations.is_empty() {
            return Err(self.fail(violations));
        }

        self.transition(BuildState::Resolving);
        let resolved = match resolve(&quam, &ctx) {
            Ok(resolved) => resolved,
            Err(violations) => return Err(self.fail(violations)),
        };

        self.transition(BuildState::Emitting);
        let config = Arc::new(emit(&quam, resolved));
        self.last_built = Some(Arc::clone(&config));
        self.transition(BuildState::Built);
        info!(
            "Built configuration with {} channel(s) and {} octave(s)",
            config.channels().len(),
            config.octaves().len()
        );
        Ok(config)
    }

    /// Every violation of the description, without building.
    ///
    /// A fatal violation in a pulse set stops the traversal; the violations
    /// found up to that point are returned.
    pub fn validate(&self, quam: &Quam, ctx: &PulseSetContext<'_, ParameterTree>) -> Vec<Violation> {
        let mut violations = vec![];
        for pulse_set in quam.pulse_sets() {
            violations.extend(pulse_set.validate(ctx));
            if let Some(fatal) = violations.iter().find(|v| v.error.is_fatal()) {
                warn!("Validation aborted: {}", fatal);
                return violations;
            }
        }

        let mut checked_octaves = HashSet::new();
        let mut checked_converters = HashSet::new();
        let mut if_outputs: IndexMap<(&OctaveUid, u8), &ControllerPort> = IndexMap::new();
        for binding in quam.channels() {
            let channel = || Component::Channel(binding.channel().clone());
            violations.extend(
                self.check_binding(quam, binding)
                    .into_iter()
                    .map(|e| Violation::new(channel(), e)),
            );
            let Some(uid) = binding.octave() else {
                continue;
            };
            if checked_octaves.insert(uid) {
                violations.extend(
                    check_octave(quam, uid)
                        .into_iter()
                        .map(|e| Violation::new(Component::Octave(uid.clone()), e)),
                );
            }
            let Some(octave) = quam.octave(uid) else {
                continue;
            };
            let Some(ChannelWiring::FeedLine(feed_line)) = binding.wiring() else {
                continue;
            };
            let Some(converter) = feed_line
                .default_octave_port_out()
                .ok()
                .and_then(|rf_input| octave.down_converter(rf_input))
            else {
                continue;
            };
            if checked_converters.insert((uid, converter.rf_input()))
                && converter.lo_frequency().is_none()
            {
                violations.push(Violation::new(
                    Component::Octave(uid.clone()),
                    Error::MissingDownConverterLo {
                        octave: uid.clone(),
                        rf_input: converter.rf_input(),
                    },
                ));
            }
            // Each IF output returns on exactly one controller input.
            let (output_i, output_q) = converter.if_outputs();
            for (output, port) in [(output_i, &feed_line.input_i), (output_q, &feed_line.input_q)] {
                let claimed = *if_outputs.entry((uid, output)).or_insert(port);
                if claimed != port {
                    violations.push(Violation::new(
                        channel(),
                        Error::InvalidWiring(format!(
                            "IF output {output} of octave '{uid}' is already assigned to port ({}, {}), not ({}, {}).",
                            claimed.0, claimed.1, port.0, port.1
                        )),
                    ));
                }
            }
        }
        violations
    }

    fn check_binding(&self, quam: &Quam, binding: &ChannelBinding) -> Vec<Error> {
        let mut errors = vec![];
        if quam.pulse_set(binding.pulse_set()).is_none() {
            errors.push(Error::UnknownPulseSet(binding.pulse_set().to_string()));
        }
        let traits = self.settings.traits();
        if let Some(frequency) = binding.intermediate_frequency()
            && !traits.accepts_intermediate_frequency(frequency)
        {
            let limit = traits.max_intermediate_frequency.value();
            errors.push(Error::OutOfBand {
                quantity: "intermediate frequency",
                value: frequency.value(),
                min: -limit,
                max: limit,
            });
        }
        let ports_exist = match binding.wiring().map(|wiring| wiring.check_ports(traits)) {
            Some(Err(e)) => {
                errors.push(e);
                false
            }
            _ => true,
        };
        let Some(uid) = binding.octave() else {
            return errors;
        };
        // Missing octaves and LO settings are reported once against the octave.
        let Some(octave) = quam.octave(uid) else {
            return errors;
        };
        if let Err(e) = binding.effective_calibration(quam.octaves()) {
            errors.push(e);
        }
        if let Some(wiring) = binding.wiring()
            && ports_exist
        {
            errors.extend(check_octave_ports(binding, wiring, octave));
        }
        errors
    }
}

fn check_octave_ports(binding: &ChannelBinding, wiring: &ChannelWiring, octave: &OctaveUnit) -> Vec<Error> {
    let mut errors = vec![];
    match (wiring.rf_output(), octave.rf_output()) {
        (Err(e), _) => errors.push(e),
        (Ok(port), Some(rf_output)) if port != rf_output => {
            errors.push(Error::InvalidWiring(format!(
                "Channel '{}' is wired to Octave RF input {port} but octave '{}' uses RF output {rf_output}.",
                binding.channel(),
                octave.uid()
            )));
        }
        _ => {}
    }
    match wiring.rf_input() {
        Err(e) => errors.push(e),
        Ok(Some(rf_input)) if octave.down_converter(rf_input).is_none() => {
            errors.push(Error::InvalidWiring(format!(
                "Channel '{}' reads RF input {rf_input} of octave '{}', which has no down-converter.",
                binding.channel(),
                octave.uid()
            )));
        }
        Ok(_) => {}
    }
    errors
}

/// The LO range is enforced by the setter, so only presence is checked here.
fn check_octave(quam: &Quam, uid: &OctaveUid) -> Vec<Error> {
    match quam.octave(uid) {
        None => vec![Error::UnknownOctave(uid.clone())],
        Some(octave) if octave.lo_frequency().is_none() => {
            vec![Error::MissingLoFrequency(uid.clone())]
        }
        Some(_) => vec![],
    }
}

struct ResolvedChannel {
    pulses: Arc<ResolvedPulses>,
    calibration: Calibration,
}

fn resolve(
    quam: &Quam,
    ctx: &PulseSetContext<'_, ParameterTree>,
) -> Result<IndexMap<ChannelUid, ResolvedChannel>, Vec<Violation>> {
    let mut pulse_sets: IndexMap<&NodePath, Arc<ResolvedPulses>> = IndexMap::new();
    let mut channels = IndexMap::new();
    let mut violations = vec![];
    for binding in quam.channels() {
        let component = || Component::Channel(binding.channel().clone());
        let pulses = match pulse_sets.get(binding.pulse_set()) {
            Some(pulses) => Arc::clone(pulses),
            None => {
                let resolved = quam
                    .pulse_set(binding.pulse_set())
                    .ok_or_else(|| Error::UnknownPulseSet(binding.pulse_set().to_string()))
                    .and_then(|pulse_set| pulse_set.resolve(ctx));
                match resolved {
                    Ok(pulses) => {
                        let pulses = Arc::new(pulses);
                        pulse_sets.insert(binding.pulse_set(), Arc::clone(&pulses));
                        pulses
                    }
                    Err(e) if e.is_fatal() => {
                        violations.push(Violation::new(component(), e));
                        break;
                    }
                    Err(e) => {
                        violations.push(Violation::new(component(), e));
                        continue;
                    }
                }
            }
        };
        match binding.effective_calibration(quam.octaves()) {
            Ok(calibration) => {
                channels.insert(
                    binding.channel().clone(),
                    ResolvedChannel {
                        pulses,
                        calibration,
                    },
                );
            }
            Err(e) => violations.push(Violation::new(component(), e)),
        }
    }
    if violations.is_empty() {
        Ok(channels)
    } else {
        Err(violations)
    }
}

fn emit(quam: &Quam, resolved: IndexMap<ChannelUid, ResolvedChannel>) -> LowLevelConfig {
    let mut octaves = IndexMap::new();
    let mut channels = IndexMap::new();
    for (uid, channel) in resolved {
        let Some(binding) = quam.channel(&uid) else {
            continue;
        };
        let intermediate_frequency = binding.intermediate_frequency();
        let pulses = Arc::unwrap_or_clone(channel.pulses);
        let mut config = ChannelConfig::new(binding.pulse_set().to_string(), pulses, channel.calibration)
            .with_intermediate_frequency(intermediate_frequency)
            .with_wiring(binding.wiring().cloned());
        if let Some(octave_uid) = binding.octave()
            && let Some(octave) = quam.octave(octave_uid)
        {
            let lo = octave.lo_frequency();
            let rf_frequency = lo.zip(intermediate_frequency).map(|(lo, i)| lo + i);
            config = config.with_octave(octave_uid.clone(), rf_frequency);
            if let Some(lo) = lo {
                let octave_config = octaves
                    .entry(octave_uid.clone())
                    .or_insert_with(|| OctaveConfig::from_unit(octave, lo));
                if let Some(feed_line) = binding.wiring().and_then(ChannelWiring::feed_line) {
                    add_readout(octave_config, octave, feed_line);
                }
            }
        }
        channels.insert(uid, config);
    }
    LowLevelConfig::new(channels, octaves)
}

/// Record the down-converter and IF outputs a feed line reads through.
fn add_readout(config: &mut OctaveConfig, octave: &OctaveUnit, feed_line: &FeedLineWiring) {
    let Some(converter) = feed_line
        .default_octave_port_out()
        .ok()
        .and_then(|rf_input| octave.down_converter(rf_input))
    else {
        return;
    };
    if let Some(lo) = converter.lo_frequency() {
        config
            .rf_inputs
            .entry(converter.rf_input())
            .or_insert_with(|| RfInputConfig::from_converter(converter, lo));
    }
    let (output_i, output_q) = converter.if_outputs();
    for (output, port) in [(output_i, &feed_line.input_i), (output_q, &feed_line.input_q)] {
        config.if_outputs.entry(output).or_insert_with(|| port.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octave::DownConverter;
    use crate::parameter_resolver::ValueOrParameter;
    use crate::pulse::PulseTemplate;
    use crate::pulse_set::PulseSet;
    use crate::wiring::IqWiring;
    use squid_common::types::IfMode;
    use squid_units::{gigahertz, hertz, megahertz};

    fn quam() -> Quam {
        let mut quam = Quam::new();
        let mut readout = PulseSet::new("readout", "/");
        readout
            .add_template(PulseTemplate::constant("ro_pulse", 1000, 0.25))
            .unwrap();
        let path = quam.add_pulse_set(readout).unwrap();
        let mut octave = OctaveUnit::new("oct1");
        octave.set_lo_frequency(gigahertz(5.0)).unwrap();
        octave
            .add_calibration(megahertz(100.0), 1.02, 0.01, (0.0, 0.0))
            .unwrap();
        octave.set_rf_output(1).unwrap();
        quam.add_octave(octave).unwrap();
        quam.bind_channel(
            ChannelBinding::bind("ch1", path, Some("oct1".into()), Some(megahertz(100.0)))
                .unwrap()
                .with_wiring(IqWiring::new("con1", 1, 2)),
        )
        .unwrap();
        quam
    }

    #[test]
    fn test_successful_build() {
        let quam = RwLock::new(quam());
        let mut builder = ConfigBuilder::new(BuilderSettings::default());
        assert_eq!(builder.state(), BuildState::Idle);
        let config = builder.build(&quam).unwrap();
        assert_eq!(
            builder.history(),
            &[
                BuildState::Idle,
                BuildState::Validating,
                BuildState::Resolving,
                BuildState::Emitting,
                BuildState::Built
            ]
        );
        assert!(builder.state().is_terminal());
        let ch1 = config.channel(&"ch1".into()).unwrap();
        assert_eq!(ch1.rf_frequency(), Some(hertz(5.1e9)));
        assert_eq!(ch1.octave(), Some(&OctaveUid::from("oct1")));
        let oct1 = &config.octaves()[&OctaveUid::from("oct1")];
        assert_eq!(oct1.lo_frequency, gigahertz(5.0));
        assert!(oct1.rf_inputs.is_empty());
        assert!(Arc::ptr_eq(builder.last_built().unwrap(), &config));
    }

    #[test]
    fn test_missing_lo_reported_once_per_octave() {
        let mut description = quam();
        let mut octave = OctaveUnit::new("oct1");
        octave
            .add_calibration(megahertz(100.0), 1.02, 0.01, (0.0, 0.0))
            .unwrap();
        *description.octave_mut(&"oct1".into()).unwrap() = octave;
        let path = NodePath::from("/readout");
        description
            .bind_channel(
                ChannelBinding::bind("ch2", path, Some("oct1".into()), Some(megahertz(100.0)))
                    .unwrap(),
            )
            .unwrap();
        let mut builder = ConfigBuilder::new(BuilderSettings::default());
        let Err(Error::BuildValidation(violations)) = builder.build(&RwLock::new(description))
        else {
            panic!("build should fail");
        };
        assert_eq!(
            violations,
            vec![Violation::new(
                Component::Octave("oct1".into()),
                Error::MissingLoFrequency("oct1".into())
            )]
        );
    }

    #[test]
    fn test_wiring_mismatch() {
        let mut description = quam();
        description.octave_mut(&"oct1".into()).unwrap().set_rf_output(2).unwrap();
        let mut builder = ConfigBuilder::new(BuilderSettings::default());
        let err = builder.build(&RwLock::new(description)).unwrap_err();
        assert!(matches!(
            &err,
            Error::BuildValidation(violations)
                if matches!(violations[..], [Violation { error: Error::InvalidWiring(_), .. }])
        ));
        assert_eq!(builder.state(), BuildState::Failed);
    }

    #[test]
    fn test_intermediate_frequency_limit() {
        let mut description = quam();
        description
            .bind_channel(ChannelBinding::bind("ch2", "/readout", None, Some(megahertz(450.0))).unwrap())
            .unwrap();
        let mut builder = ConfigBuilder::new(BuilderSettings::default());
        let Err(Error::BuildValidation(violations)) = builder.build(&RwLock::new(description))
        else {
            panic!("build should fail");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].component, Component::Channel("ch2".into()));
        assert!(matches!(
            violations[0].error,
            Error::OutOfBand {
                quantity: "intermediate frequency",
                ..
            }
        ));
    }

    #[test]
    fn test_poisoned_lock_is_corrupted_tree() {
        let quam = Arc::new(RwLock::new(quam()));
        let writer = Arc::clone(&quam);
        let _ = std::thread::spawn(move || {
            let _guard = writer.write().unwrap();
            panic!("writer failed");
        })
        .join();
        let mut builder = ConfigBuilder::new(BuilderSettings::default());
        let err = builder.build(&quam).unwrap_err();
        assert!(matches!(err, Error::CorruptedTree(_)));
        assert!(err.is_fatal());
        assert_eq!(builder.history(), &[BuildState::Idle, BuildState::Failed]);
    }

    #[test]
    fn test_wiring_outside_controller_is_a_violation() {
        let mut description = quam();
        description
            .bind_channel(
                ChannelBinding::bind("ch2", "/readout", Some("oct1".into()), Some(megahertz(100.0)))
                    .unwrap()
                    .with_wiring(IqWiring::new("con1", 255, 0)),
            )
            .unwrap();
        let mut builder = ConfigBuilder::new(BuilderSettings::default());
        let Err(Error::BuildValidation(violations)) = builder.build(&RwLock::new(description))
        else {
            panic!("build should fail");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].component, Component::Channel("ch2".into()));
        assert!(matches!(
            &violations[0].error,
            Error::InvalidWiring(message) if message.contains("analog output 255")
        ));
    }

    #[test]
    fn test_fatal_violation_stops_validation() {
        let mut description = quam();
        description.parameters.set_reference("/a", "x", "#/b/x");
        description.parameters.set_reference("/b", "x", "#/a/x");
        let mut looped = PulseSet::new("looped", "/");
        looped
            .add_template(PulseTemplate::constant(
                "p",
                100,
                ValueOrParameter::parameter("#/a/x"),
            ))
            .unwrap();
        description.add_pulse_set(looped).unwrap();
        let mut misaligned = PulseSet::new("misaligned", "/");
        misaligned
            .add_template(PulseTemplate::constant("p", 1001, 0.1))
            .unwrap();
        description.add_pulse_set(misaligned).unwrap();
        description
            .bind_channel(ChannelBinding::bind("ch2", "/missing", None, None).unwrap())
            .unwrap();

        let mut builder = ConfigBuilder::new(BuilderSettings::default());
        let Err(Error::BuildValidation(violations)) = builder.build(&RwLock::new(description))
        else {
            panic!("build should fail");
        };
        assert!(!violations.is_empty());
        assert!(violations.iter().all(|v| v.error.is_fatal()));
        assert_eq!(
            builder.history(),
            &[BuildState::Idle, BuildState::Validating, BuildState::Failed]
        );
    }

    fn readout_quam() -> Quam {
        let mut description = quam();
        let octave = description.octave_mut(&"oct1".into()).unwrap();
        octave.set_rf_output(5).unwrap();
        let mut converter = DownConverter::new(1).unwrap();
        converter.set_lo_frequency(gigahertz(5.0)).unwrap();
        converter.set_if_modes(IfMode::Direct, IfMode::Mixer);
        octave.add_down_converter(converter).unwrap();
        description.unbind(&"ch1".into());
        description
            .bind_channel(
                ChannelBinding::bind("q0.rr", "/readout", Some("oct1".into()), Some(megahertz(100.0)))
                    .unwrap()
                    .with_wiring(FeedLineWiring::new("con1", (9, 10), (1, 2))),
            )
            .unwrap();
        description
    }

    #[test]
    fn test_feed_line_emits_down_conversion() {
        let mut builder = ConfigBuilder::new(BuilderSettings::default());
        let config = builder.build(&RwLock::new(readout_quam())).unwrap();
        let oct1 = &config.octaves()[&OctaveUid::from("oct1")];
        assert_eq!(oct1.rf_output, Some(5));
        let rf_input = &oct1.rf_inputs[&1];
        assert_eq!(rf_input.lo_frequency, gigahertz(5.0));
        assert_eq!(rf_input.if_mode_q, IfMode::Mixer);
        assert_eq!(oct1.if_outputs[&1], ("con1".to_string(), 1));
        assert_eq!(oct1.if_outputs[&2], ("con1".to_string(), 2));
    }

    #[test]
    fn test_feed_line_needs_down_converter_with_lo() {
        let mut description = readout_quam();
        *description.octave_mut(&"oct1".into()).unwrap().down_converter_mut(1).unwrap() =
            DownConverter::new(1).unwrap();
        description
            .bind_channel(
                ChannelBinding::bind("q1.rr", "/readout", Some("oct1".into()), Some(megahertz(100.0)))
                    .unwrap()
                    .with_wiring(FeedLineWiring::new("con1", (9, 10), (1, 2))),
            )
            .unwrap();
        let mut builder = ConfigBuilder::new(BuilderSettings::default());
        let Err(Error::BuildValidation(violations)) = builder.build(&RwLock::new(description))
        else {
            panic!("build should fail");
        };
        // Reported once for both feed lines.
        assert_eq!(
            violations,
            vec![Violation::new(
                Component::Octave("oct1".into()),
                Error::MissingDownConverterLo {
                    octave: "oct1".into(),
                    rf_input: 1
                }
            )]
        );

        let mut description = readout_quam();
        let mut octave = OctaveUnit::new("oct1");
        octave.set_lo_frequency(gigahertz(5.0)).unwrap();
        octave
            .add_calibration(megahertz(100.0), 1.02, 0.01, (0.0, 0.0))
            .unwrap();
        *description.octave_mut(&"oct1".into()).unwrap() = octave;
        let Err(Error::BuildValidation(violations)) = builder.build(&RwLock::new(description))
        else {
            panic!("build should fail");
        };
        assert!(matches!(
            &violations[..],
            [Violation { error: Error::InvalidWiring(message), .. }]
                if message.contains("no down-converter")
        ));
    }

    #[test]
    fn test_conflicting_if_outputs() {
        let mut description = readout_quam();
        description
            .bind_channel(
                ChannelBinding::bind("q1.rr", "/readout", Some("oct1".into()), Some(megahertz(100.0)))
                    .unwrap()
                    .with_wiring(FeedLineWiring::new("con2", (9, 10), (1, 2))),
            )
            .unwrap();
        let mut builder = ConfigBuilder::new(BuilderSettings::default());
        let Err(Error::BuildValidation(violations)) = builder.build(&RwLock::new(description))
        else {
            panic!("build should fail");
        };
        assert_eq!(violations.len(), 2);
        for violation in &violations {
            assert_eq!(violation.component, Component::Channel("q1.rr".into()));
            assert!(matches!(
                &violation.error,
                Error::InvalidWiring(message) if message.contains("already assigned to port (con1")
            ));
        }
    }
}
