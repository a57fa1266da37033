// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, RwLock};

use squid_quam::{
    BuildState, BuilderSettings, ChannelBinding, Component, ConfigBuilder, DragGaussianParameters,
    Error, OctaveUnit, PulseSet, PulseTemplate, PulseUid, Quam, ValueOrParameter,
};
use squid_units::{gigahertz, megahertz};

fn readout_quam(intermediate_frequency: f64) -> Quam {
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
    quam.add_octave(octave).unwrap();

    quam.bind_channel(
        ChannelBinding::bind(
            "ch1",
            path,
            Some("oct1".into()),
            Some(megahertz(intermediate_frequency)),
        )
        .unwrap(),
    )
    .unwrap();
    quam
}

#[test]
fn readout_at_calibrated_frequency_builds() {
    let quam = RwLock::new(readout_quam(100.0));
    let mut builder = ConfigBuilder::new(BuilderSettings::default());
    let config = builder.build(&quam).unwrap();

    assert_eq!(
        builder.history(),
        &[
            BuildState::Idle,
            BuildState::Validating,
            BuildState::Resolving,
            BuildState::Emitting,
            BuildState::Built,
        ]
    );
    assert_eq!(config.channels().len(), 1);
    let ch1 = config.channel(&"ch1".into()).unwrap();
    let pulse = ch1.pulse(&PulseUid::from("ro_pulse")).unwrap();
    assert_eq!(pulse.duration, 1000);
    assert_eq!(pulse.amplitude, 0.25);
    assert_eq!(ch1.calibration().gain, 1.02);
    assert_eq!(ch1.calibration().phase, 0.01);
    assert_eq!(ch1.intermediate_frequency(), Some(megahertz(100.0)));
    assert_eq!(ch1.rf_frequency(), Some(megahertz(5100.0)));
}

#[test]
fn readout_between_calibrations_is_interpolated() {
    let mut quam = readout_quam(100.0);
    let mut octave = OctaveUnit::new("oct1");
    octave.set_lo_frequency(gigahertz(5.0)).unwrap();
    octave
        .add_calibration(megahertz(50.0), 1.0, 0.0, (0.01, -0.01))
        .unwrap();
    octave
        .add_calibration(megahertz(150.0), 1.2, 0.02, (0.03, 0.01))
        .unwrap();
    *quam.octave_mut(&"oct1".into()).unwrap() = octave;

    let mut builder = ConfigBuilder::new(BuilderSettings::default());
    let config = builder.build(&RwLock::new(quam)).unwrap();
    let calibration = config.channel(&"ch1".into()).unwrap().calibration();
    assert!((calibration.gain - 1.1).abs() < 1e-12);
    assert!((calibration.phase - 0.01).abs() < 1e-12);
    assert!((calibration.dc_offset_i - 0.02).abs() < 1e-12);
    assert!(calibration.dc_offset_q.abs() < 1e-12);
}

#[test]
fn readout_outside_calibrated_span_fails() {
    let quam = RwLock::new(readout_quam(300.0));
    let mut builder = ConfigBuilder::new(BuilderSettings::default());
    let err = builder.build(&quam).unwrap_err();

    let Error::BuildValidation(violations) = err else {
        panic!("expected a validation failure, got {err:?}");
    };
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].component, Component::Channel("ch1".into()));
    assert_eq!(
        violations[0].error,
        Error::UncalibratedFrequency {
            octave: "oct1".into(),
            frequency: 300e6,
        }
    );
    assert_eq!(
        builder.history(),
        &[BuildState::Idle, BuildState::Validating, BuildState::Failed]
    );
    assert!(builder.last_built().is_none());
}

#[test]
fn failed_rebuild_keeps_last_configuration() {
    let quam = RwLock::new(readout_quam(100.0));
    let mut builder = ConfigBuilder::new(BuilderSettings::default());
    let first = builder.build(&quam).unwrap();

    {
        let mut description = quam.write().unwrap();
        let path = "/readout".into();
        let readout = description.pulse_set_mut(&path).unwrap();
        readout
            .add_template(PulseTemplate::constant("misaligned", 1002, 0.25))
            .unwrap();
        readout
            .add_template(PulseTemplate::constant("too_loud", 1000, 0.8))
            .unwrap();
        description
            .bind_channel(ChannelBinding::bind("ch2", "/missing", None, None).unwrap())
            .unwrap();
    }

    let Err(Error::BuildValidation(violations)) = builder.build(&quam) else {
        panic!("rebuild should fail");
    };
    let errors: Vec<_> = violations.iter().map(|v| &v.error).collect();
    assert_eq!(violations.len(), 3);
    assert!(matches!(errors[0], Error::DurationNotAligned { .. }));
    assert!(matches!(errors[1], Error::AmplitudeOutOfRange { .. }));
    assert_eq!(errors[2], &Error::UnknownPulseSet("/missing".to_string()));

    assert_eq!(builder.state(), BuildState::Failed);
    assert!(Arc::ptr_eq(builder.last_built().unwrap(), &first));
    let ch1 = first.channel(&"ch1".into()).unwrap();
    assert_eq!(ch1.pulses().len(), 1);
}

#[test]
fn one_entry_per_bound_channel() {
    let mut quam = readout_quam(100.0);
    let drag = PulseSet::drag_gaussian("drag", "/q0/xy");
    DragGaussianParameters::new(0.1, 0.2, 40, 8.0, -200e6)
        .write_to(&mut quam.parameters, &drag.path());
    let drag_path = quam.add_pulse_set(drag).unwrap();
    for channel in ["q0.xy", "q0.xy_copy"] {
        quam.bind_channel(ChannelBinding::bind(channel, drag_path.clone(), None, None).unwrap())
            .unwrap();
    }

    let mut builder = ConfigBuilder::new(BuilderSettings::default());
    let config = builder.build(&RwLock::new(quam)).unwrap();
    let channels: Vec<_> = config.channels().keys().map(|c| c.as_str()).collect();
    assert_eq!(channels, vec!["ch1", "q0.xy", "q0.xy_copy"]);

    let xy = config.channel(&"q0.xy".into()).unwrap();
    assert_eq!(xy.pulses().len(), 6);
    assert_eq!(xy.calibration().gain, 1.0);
    assert_eq!(xy.octave(), None);
    assert_eq!(config.octaves().len(), 1);

    let json = config.to_json().unwrap();
    assert!(json.contains("\"drag\""));
    assert!(json.contains("\"oct1\""));
}

#[test]
fn shared_parameter_edit_is_picked_up_by_next_build() {
    let mut quam = readout_quam(100.0);
    quam.parameters.set("/shared", "readout_amplitude", 0.25);
    let mut readout = PulseSet::new("readout", "/q1");
    readout
        .add_template(PulseTemplate::constant(
            "ro_pulse",
            1000,
            ValueOrParameter::parameter("#/shared/readout_amplitude"),
        ))
        .unwrap();
    let path = quam.add_pulse_set(readout).unwrap();
    quam.bind_channel(ChannelBinding::bind("q1.rr", path, None, None).unwrap())
        .unwrap();
    let quam = RwLock::new(quam);

    let mut builder = ConfigBuilder::new(BuilderSettings::default());
    let first = builder.build(&quam).unwrap();
    quam.write()
        .unwrap()
        .parameters
        .set("/shared", "readout_amplitude", 0.3);
    let second = builder.build(&quam).unwrap();

    let amplitude = |config: &squid_quam::LowLevelConfig| {
        config.channel(&"q1.rr".into()).unwrap().pulses()[&PulseUid::from("ro_pulse")].amplitude
    };
    assert_eq!(amplitude(&first), 0.25);
    assert_eq!(amplitude(&second), 0.3);
}

#[test]
fn cyclic_reference_is_reported() {
    let mut quam = readout_quam(100.0);
    quam.parameters.set_reference("/a", "x", "#/b/x");
    quam.parameters.set_reference("/b", "x", "#/a/x");
    let mut looped = PulseSet::new("looped", "/");
    looped
        .add_template(PulseTemplate::constant(
            "p",
            100,
            ValueOrParameter::parameter("#/a/x"),
        ))
        .unwrap();
    quam.add_pulse_set(looped).unwrap();

    let mut builder = ConfigBuilder::new(BuilderSettings::default());
    let Err(Error::BuildValidation(violations)) = builder.build(&RwLock::new(quam)) else {
        panic!("build should fail");
    };
    assert_eq!(violations.len(), 1);
    assert!(violations[0].error.is_fatal());
    assert_eq!(
        violations[0].to_string(),
        "pulse 'p' of pulse set '/looped': Cyclic reference: 'x' on node '/a' was visited twice."
    );
}
