// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! Named collections of pulse templates.
//!
//! A pulse set lives at `<scope>/<name>` in the component tree. Relative
//! references of its templates (`#./sigma`) are resolved from that node.

use std::f64::consts::FRAC_PI_2;

use indexmap::IndexMap;

use squid_common::device_traits::DeviceTraits;

use crate::error::{Component, Error, Result, Violation};
use crate::parameter_resolver::{ParameterResolver, ValueOrParameter};
use crate::pulse::{FlatTopPart, PulseShape, PulseTemplate, ResolvedPulse, resolve_template};
use crate::tree::{ComponentTree, NodePath, ParameterTree};
use crate::uid::PulseUid;

/// Everything a pulse set needs to check and resolve its templates.
pub struct PulseSetContext<'a, T: ComponentTree + ?Sized> {
    pub resolver: ParameterResolver<'a, T>,
    pub traits: &'a DeviceTraits,
    pub check_waveform_peak: bool,
}

impl<'a, T: ComponentTree + ?Sized> PulseSetContext<'a, T> {
    pub fn new(tree: &'a T, traits: &'a DeviceTraits, max_reference_depth: usize) -> Self {
        PulseSetContext {
            resolver: ParameterResolver::new(tree, max_reference_depth),
            traits,
            check_waveform_peak: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PulseSet {
    name: String,
    scope: NodePath,
    templates: IndexMap<PulseUid, PulseTemplate>,
}

impl PulseSet {
    pub fn new(name: &str, scope: impl Into<NodePath>) -> Self {
        PulseSet {
            name: name.to_string(),
            scope: scope.into(),
            templates: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &NodePath {
        &self.scope
    }

    /// Node of the set in the component tree.
    pub fn path(&self) -> NodePath {
        self.scope.join(&self.name)
    }

    pub fn add_template(&mut self, template: PulseTemplate) -> Result<()> {
        if self.templates.contains_key(&template.id) {
            return Err(Error::DuplicateId {
                scope: format!("pulse set '{}'", self.path()),
                id: template.id.to_string(),
            });
        }
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    pub fn remove_template(&mut self, id: &PulseUid) -> Option<PulseTemplate> {
        self.templates.shift_remove(id)
    }

    pub fn template(&self, id: &PulseUid) -> Option<&PulseTemplate> {
        self.templates.get(id)
    }

    pub fn templates(&self) -> impl Iterator<Item = &PulseTemplate> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Check every template and report all broken constraints.
    ///
    /// Does not modify the set; repeated calls return the same list.
    pub fn validate<T: ComponentTree + ?Sized>(&self, ctx: &PulseSetContext<'_, T>) -> Vec<Violation> {
        let path = self.path();
        let mut violations = vec![];
        for template in self.templates.values() {
            let component = || Component::Template {
                pulse_set: path.to_string(),
                pulse: template.id.clone(),
            };
            let errors = match template.resolve_parameters(&path, &ctx.resolver) {
                Ok(parameters) => parameters.check(ctx.traits, ctx.check_waveform_peak),
                Err(errors) => errors,
            };
            violations.extend(errors.into_iter().map(|e| Violation::new(component(), e)));
        }
        violations
    }

    /// Resolve every template into concrete numbers and sampled envelopes.
    pub fn resolve<T: ComponentTree + ?Sized>(
        &self,
        ctx: &PulseSetContext<'_, T>,
    ) -> Result<IndexMap<PulseUid, ResolvedPulse>> {
        let path = self.path();
        self.templates
            .values()
            .map(|template| {
                let pulse = resolve_template(template, &path, &ctx.resolver, ctx.traits)?;
                Ok((template.id.clone(), pulse))
            })
            .collect()
    }

    /// DRAG Gaussian single-qubit gates x90, x180, y90, y180, -x90 and -y90.
    ///
    /// All gates share `length`, `sigma`, `alpha`, `anharmonicity`,
    /// `detuning`, `subtracted` and `digital_marker` of the set node.
    /// Amplitudes come from `amplitude_90` or `amplitude_180` and the
    /// rotation axis from `phase_x` or `phase_y`.
    pub fn drag_gaussian(name: &str, scope: impl Into<NodePath>) -> Self {
        let shape = PulseShape::Drag {
            sigma: ValueOrParameter::parameter("#./sigma"),
            alpha: ValueOrParameter::parameter("#./alpha"),
            anharmonicity: ValueOrParameter::parameter("#./anharmonicity"),
            detuning: ValueOrParameter::parameter("#./detuning"),
            subtracted: ValueOrParameter::parameter("#./subtracted"),
        };
        let gates = [
            ("x90", "amplitude_90", "phase_x", 1.0),
            ("x180", "amplitude_180", "phase_x", 1.0),
            ("y90", "amplitude_90", "phase_y", 1.0),
            ("y180", "amplitude_180", "phase_y", 1.0),
            ("-x90", "amplitude_90", "phase_x", -1.0),
            ("-y90", "amplitude_90", "phase_y", -1.0),
        ];
        let mut set = PulseSet::new(name, scope);
        for (gate, amplitude, phase, scale) in gates {
            let template = PulseTemplate::new(
                gate,
                shape.clone(),
                ValueOrParameter::parameter("#./length"),
                ValueOrParameter::parameter(&format!("#./{amplitude}")),
            )
            .with_axis_angle(ValueOrParameter::parameter(&format!("#./{phase}")))
            .with_amplitude_scale(scale)
            .with_digital_marker(ValueOrParameter::parameter("#./digital_marker"));
            set.templates.insert(template.id.clone(), template);
        }
        set
    }

    /// Rise and fall edges of a flat-top cosine pulse for a sticky channel.
    ///
    /// Both edges last `rise_fall_time`. `rise` climbs from zero to
    /// `amplitude` and the channel holds the last sample as the plateau.
    /// `fall` is the same rise played at `-amplitude`, which the sticky
    /// channel adds onto the held plateau to return to zero.
    pub fn flattop_cosine(name: &str, scope: impl Into<NodePath>) -> Self {
        let mut set = PulseSet::new(name, scope);
        for (gate, scale) in [("rise", 1.0), ("fall", -1.0)] {
            let template = PulseTemplate::new(
                gate,
                PulseShape::FlatTopCosine {
                    flat_length: ValueOrParameter::Value(0),
                    part: FlatTopPart::Rise,
                },
                ValueOrParameter::parameter("#./rise_fall_time"),
                ValueOrParameter::parameter("#./amplitude"),
            )
            .with_amplitude_scale(scale);
            set.templates.insert(template.id.clone(), template);
        }
        set
    }
}

/// Parameters read by [`PulseSet::drag_gaussian`].
#[derive(Debug, Clone, PartialEq)]
pub struct DragGaussianParameters {
    pub amplitude_90: f64,
    pub amplitude_180: f64,
    pub length: i64,
    pub sigma: f64,
    pub alpha: f64,
    pub anharmonicity: f64,
    pub detuning: f64,
    /// Axis angles in radians.
    pub phase_x: f64,
    pub phase_y: f64,
    pub subtracted: bool,
    /// Shared digital marker; empty for none.
    pub digital_marker: Vec<(i64, i64)>,
}

impl DragGaussianParameters {
    pub fn new(amplitude_90: f64, amplitude_180: f64, length: i64, sigma: f64, anharmonicity: f64) -> Self {
        DragGaussianParameters {
            amplitude_90,
            amplitude_180,
            length,
            sigma,
            alpha: 0.0,
            anharmonicity,
            detuning: 0.0,
            phase_x: 0.0,
            phase_y: FRAC_PI_2,
            subtracted: true,
            digital_marker: vec![],
        }
    }

    /// Store the parameters as literals on `node`.
    pub fn write_to(&self, tree: &mut ParameterTree, node: &NodePath) {
        tree.set(node.clone(), "amplitude_90", self.amplitude_90);
        tree.set(node.clone(), "amplitude_180", self.amplitude_180);
        tree.set(node.clone(), "length", self.length);
        tree.set(node.clone(), "sigma", self.sigma);
        tree.set(node.clone(), "alpha", self.alpha);
        tree.set(node.clone(), "anharmonicity", self.anharmonicity);
        tree.set(node.clone(), "detuning", self.detuning);
        tree.set(node.clone(), "phase_x", self.phase_x);
        tree.set(node.clone(), "phase_y", self.phase_y);
        tree.set(node.clone(), "subtracted", self.subtracted);
        tree.set(node.clone(), "digital_marker", self.digital_marker.clone());
    }
}
