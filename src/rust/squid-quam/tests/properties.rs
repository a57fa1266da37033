// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

use proptest::prelude::*;

use squid_common::device_traits::OPX_PLUS_TRAITS;
use squid_quam::{OctaveUnit, ParameterTree, PulseSet, PulseSetContext, PulseTemplate};
use squid_units::hertz;

/// Template with a possibly invalid duration and amplitude.
fn arb_template(index: usize) -> impl Strategy<Value = PulseTemplate> {
    (0_i64..200, -1.0_f64..1.0).prop_map(move |(duration, amplitude)| {
        PulseTemplate::constant(format!("p{index}").as_str(), duration * 2, amplitude)
    })
}

fn arb_pulse_set() -> impl Strategy<Value = PulseSet> {
    (1_usize..8)
        .prop_flat_map(|n| (0..n).map(arb_template).collect::<Vec<_>>())
        .prop_map(|templates| {
            let mut set = PulseSet::new("generated", "/");
            for template in templates {
                set.add_template(template).unwrap();
            }
            set
        })
}

proptest! {
    #[test]
    fn validate_is_idempotent(set in arb_pulse_set()) {
        let tree = ParameterTree::new();
        let ctx = PulseSetContext::new(&tree, &OPX_PLUS_TRAITS, 16);
        let first = set.validate(&ctx);
        let second = set.validate(&ctx);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn exact_calibration_round_trips(
        frequency in -400e6_f64..400e6,
        gain in 0.5_f64..1.5,
        phase in -0.5_f64..0.5,
        offset_i in -0.1_f64..0.1,
        offset_q in -0.1_f64..0.1,
    ) {
        let mut octave = OctaveUnit::new("oct1");
        octave.add_calibration(hertz(frequency), gain, phase, (offset_i, offset_q)).unwrap();
        let calibration = octave.resolve_calibration(hertz(frequency)).unwrap();
        prop_assert_eq!(calibration.gain, gain);
        prop_assert_eq!(calibration.phase, phase);
        prop_assert_eq!(calibration.dc_offset_i, offset_i);
        prop_assert_eq!(calibration.dc_offset_q, offset_q);
    }

    #[test]
    fn interpolated_gain_lies_between_neighbours(
        f1 in -300e6_f64..0.0,
        span in 1e3_f64..300e6,
        g1 in 0.5_f64..1.5,
        g2 in 0.5_f64..1.5,
        fraction in 0.0_f64..1.0,
    ) {
        let f2 = f1 + span;
        let f = f1 + span * fraction;
        prop_assume!(f > f1 && f < f2);

        let mut octave = OctaveUnit::new("oct1");
        octave.add_calibration(hertz(f1), g1, 0.0, (0.0, 0.0)).unwrap();
        octave.add_calibration(hertz(f2), g2, 0.0, (0.0, 0.0)).unwrap();
        let gain = octave.resolve_calibration(hertz(f)).unwrap().gain;
        let tolerance = 1e-12;
        prop_assert!(gain >= g1.min(g2) - tolerance && gain <= g1.max(g2) + tolerance);
    }

    #[test]
    fn no_extrapolation_beyond_span(
        f1 in -300e6_f64..0.0,
        span in 1e3_f64..300e6,
        beyond in 1.0_f64..100e6,
    ) {
        let mut octave = OctaveUnit::new("oct1");
        octave.add_calibration(hertz(f1), 1.0, 0.0, (0.0, 0.0)).unwrap();
        octave.add_calibration(hertz(f1 + span), 1.1, 0.0, (0.0, 0.0)).unwrap();
        prop_assert!(octave.resolve_calibration(hertz(f1 - beyond)).is_err());
        prop_assert!(octave.resolve_calibration(hertz(f1 + span + beyond)).is_err());
    }
}
