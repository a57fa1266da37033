// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! Pulse templates and their waveform envelopes.

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::Serialize;

use squid_common::device_traits::DeviceTraits;
use squid_units::nanoseconds;

use crate::error::{Error, Result};
use crate::parameter_resolver::{ParameterResolver, ValueOrParameter};
use crate::tree::{ComponentTree, NodePath};
use crate::uid::PulseUid;

/// Which part of a flat-top cosine envelope a template plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlatTopPart {
    #[default]
    All,
    Rise,
    Fall,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PulseShape {
    Constant,
    /// Gaussian, optionally shifted so that both end points are zero.
    Gaussian {
        sigma: ValueOrParameter<f64>,
        subtracted: ValueOrParameter<bool>,
    },
    /// Gaussian with a DRAG derivative term on the quadrature.
    Drag {
        sigma: ValueOrParameter<f64>,
        alpha: ValueOrParameter<f64>,
        anharmonicity: ValueOrParameter<f64>,
        detuning: ValueOrParameter<f64>,
        subtracted: ValueOrParameter<bool>,
    },
    FlatTopCosine {
        flat_length: ValueOrParameter<i64>,
        part: FlatTopPart,
    },
    /// Samples normalized to unit amplitude, scaled by the template amplitude.
    Arbitrary { samples: ValueOrParameter<Vec<f64>> },
}

impl PulseShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            PulseShape::Constant => ShapeKind::Constant,
            PulseShape::Gaussian { .. } => ShapeKind::Gaussian,
            PulseShape::Drag { .. } => ShapeKind::Drag,
            PulseShape::FlatTopCosine { .. } => ShapeKind::FlatTopCosine,
            PulseShape::Arbitrary { .. } => ShapeKind::Arbitrary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Constant,
    Gaussian,
    Drag,
    FlatTopCosine,
    Arbitrary,
}

/// Waveform template owned by a pulse set.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseTemplate {
    pub id: PulseUid,
    pub shape: PulseShape,
    /// Length in ns.
    pub duration: ValueOrParameter<i64>,
    /// Peak amplitude in V.
    pub amplitude: ValueOrParameter<f64>,
    /// Factor applied to the resolved amplitude, e.g. -1 for a negative rotation.
    pub amplitude_scale: f64,
    /// IQ rotation in radians. `None` plays on the I quadrature only.
    pub axis_angle: Option<ValueOrParameter<f64>>,
    /// Digital marker as (level, length in ns); length 0 spans the whole pulse.
    /// An empty marker resolves to no marker.
    pub digital_marker: Option<ValueOrParameter<Vec<(i64, i64)>>>,
}

impl PulseTemplate {
    pub fn new(
        id: impl Into<PulseUid>,
        shape: PulseShape,
        duration: impl Into<ValueOrParameter<i64>>,
        amplitude: impl Into<ValueOrParameter<f64>>,
    ) -> Self {
        PulseTemplate {
            id: id.into(),
            shape,
            duration: duration.into(),
            amplitude: amplitude.into(),
            amplitude_scale: 1.0,
            axis_angle: None,
            digital_marker: None,
        }
    }

    pub fn constant(
        id: impl Into<PulseUid>,
        duration: impl Into<ValueOrParameter<i64>>,
        amplitude: impl Into<ValueOrParameter<f64>>,
    ) -> Self {
        Self::new(id, PulseShape::Constant, duration, amplitude)
    }

    pub fn gaussian(
        id: impl Into<PulseUid>,
        duration: impl Into<ValueOrParameter<i64>>,
        amplitude: impl Into<ValueOrParameter<f64>>,
        sigma: impl Into<ValueOrParameter<f64>>,
    ) -> Self {
        let shape = PulseShape::Gaussian {
            sigma: sigma.into(),
            subtracted: ValueOrParameter::Value(true),
        };
        Self::new(id, shape, duration, amplitude)
    }

    pub fn arbitrary(
        id: impl Into<PulseUid>,
        duration: impl Into<ValueOrParameter<i64>>,
        amplitude: impl Into<ValueOrParameter<f64>>,
        samples: impl Into<ValueOrParameter<Vec<f64>>>,
    ) -> Self {
        let shape = PulseShape::Arbitrary {
            samples: samples.into(),
        };
        Self::new(id, shape, duration, amplitude)
    }

    pub fn with_axis_angle(mut self, axis_angle: impl Into<ValueOrParameter<f64>>) -> Self {
        self.axis_angle = Some(axis_angle.into());
        self
    }

    pub fn with_amplitude_scale(mut self, scale: f64) -> Self {
        self.amplitude_scale = scale;
        self
    }

    pub fn with_digital_marker(
        mut self,
        marker: impl Into<ValueOrParameter<Vec<(i64, i64)>>>,
    ) -> Self {
        self.digital_marker = Some(marker.into());
        self
    }

    /// Resolve every parameter of the template from `scope`.
    ///
    /// All resolution failures of the template are returned, not only the first.
    pub fn resolve_parameters<T: ComponentTree + ?Sized>(
        &self,
        scope: &NodePath,
        resolver: &ParameterResolver<'_, T>,
    ) -> Result<PulseParameters, Vec<Error>> {
        let mut errors = vec![];
        let mut take = Collector(&mut errors);

        let duration = take.ok(resolver.resolve_value(scope, &self.duration));
        let amplitude = take
            .ok(resolver.resolve_value(scope, &self.amplitude))
            .map(|amplitude: f64| amplitude * self.amplitude_scale);
        let axis_angle = match &self.axis_angle {
            Some(angle) => take.ok(resolver.resolve_value(scope, angle)).map(Some),
            None => Some(None),
        };
        let shape = match &self.shape {
            PulseShape::Constant => Some(ResolvedShape::Constant),
            PulseShape::Gaussian { sigma, subtracted } => {
                let sigma = take.ok(resolver.resolve_value(scope, sigma));
                let subtracted = take.ok(resolver.resolve_value(scope, subtracted));
                sigma
                    .zip(subtracted)
                    .map(|(sigma, subtracted)| ResolvedShape::Gaussian { sigma, subtracted })
            }
            PulseShape::Drag {
                sigma,
                alpha,
                anharmonicity,
                detuning,
                subtracted,
            } => {
                let sigma = take.ok(resolver.resolve_value(scope, sigma));
                let alpha = take.ok(resolver.resolve_value(scope, alpha));
                let anharmonicity = take.ok(resolver.resolve_value(scope, anharmonicity));
                let detuning = take.ok(resolver.resolve_value(scope, detuning));
                let subtracted = take.ok(resolver.resolve_value(scope, subtracted));
                match (sigma, alpha, anharmonicity, detuning, subtracted) {
                    (
                        Some(sigma),
                        Some(alpha),
                        Some(anharmonicity),
                        Some(detuning),
                        Some(subtracted),
                    ) => Some(ResolvedShape::Drag {
                        sigma,
                        alpha,
                        anharmonicity,
                        detuning,
                        subtracted,
                    }),
                    _ => None,
                }
            }
            PulseShape::FlatTopCosine { flat_length, part } => {
                take.ok(resolver.resolve_value(scope, flat_length)).map(|flat_length| {
                    ResolvedShape::FlatTopCosine {
                        flat_length,
                        part: *part,
                    }
                })
            }
            PulseShape::Arbitrary { samples } => take.ok(resolver.resolve_value(scope, samples))
                .map(|samples| ResolvedShape::Arbitrary { samples }),
        };

        let digital_marker = match &self.digital_marker {
            Some(marker) => take
                .ok(resolver.resolve_value(scope, marker))
                .map(|marker: Vec<(i64, i64)>| (!marker.is_empty()).then_some(marker)),
            None => Some(None),
        };

        match (duration, amplitude, axis_angle, shape, digital_marker) {
            (Some(duration), Some(amplitude), Some(axis_angle), Some(shape), Some(digital_marker)) => {
                Ok(PulseParameters {
                    duration,
                    amplitude,
                    axis_angle,
                    shape,
                    digital_marker,
                })
            }
            _ => Err(errors),
        }
    }
}

struct Collector<'a>(&'a mut Vec<Error>);

impl Collector<'_> {
    fn ok<V>(&mut self, result: Result<V>) -> Option<V> {
        result.map_err(|e| self.0.push(e)).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedShape {
    Constant,
    Gaussian {
        sigma: f64,
        subtracted: bool,
    },
    Drag {
        sigma: f64,
        alpha: f64,
        anharmonicity: f64,
        detuning: f64,
        subtracted: bool,
    },
    FlatTopCosine {
        flat_length: i64,
        part: FlatTopPart,
    },
    Arbitrary {
        samples: Vec<f64>,
    },
}

/// Template with every parameter replaced by a concrete number.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseParameters {
    pub duration: i64,
    pub amplitude: f64,
    pub axis_angle: Option<f64>,
    pub shape: ResolvedShape,
    pub digital_marker: Option<Vec<(i64, i64)>>,
}

impl PulseParameters {
    /// Check the local constraints of the pulse against the controller limits.
    pub fn check(&self, traits: &DeviceTraits, check_waveform_peak: bool) -> Vec<Error> {
        let mut errors = vec![];
        let resolution = traits.clock_resolution.value();
        let duration = nanoseconds(self.duration);
        if self.duration <= 0 || !duration.is_aligned_to(resolution) {
            errors.push(Error::DurationNotAligned {
                duration: self.duration,
                resolution,
            });
        } else if duration < traits.min_pulse_duration {
            errors.push(Error::DurationTooShort {
                duration: self.duration,
                minimum: traits.min_pulse_duration.value(),
            });
        }
        if !traits.accepts_amplitude(self.amplitude) {
            errors.push(Error::AmplitudeOutOfRange {
                amplitude: self.amplitude,
                limit: traits.max_amplitude(),
            });
        }
        if let Some(angle) = self.axis_angle
            && !angle.is_finite()
        {
            errors.push(Error::InvalidShapeParameter {
                parameter: "axis_angle",
                value: angle,
            });
        }
        for &(level, length) in self.digital_marker.iter().flatten() {
            if !(0..=1).contains(&level) || length < 0 {
                errors.push(Error::InvalidDigitalMarker { level, length });
            }
        }

        let shape_errors = self.check_shape(traits);
        let shape_ok = shape_errors.is_empty();
        errors.extend(shape_errors);

        if check_waveform_peak
            && shape_ok
            && errors.is_empty()
            && let Some(samples) = self.sample(traits.sampling_rate)
        {
            let peak = samples
                .iter()
                .map(|z| z.re.abs().max(z.im.abs()))
                .fold(0.0, f64::max);
            if !traits.accepts_amplitude(peak) {
                errors.push(Error::AmplitudeOutOfRange {
                    amplitude: peak,
                    limit: traits.max_amplitude(),
                });
            }
        }
        errors
    }

    fn check_shape(&self, traits: &DeviceTraits) -> Vec<Error> {
        let mut errors = vec![];
        let positive = |parameter: &'static str, value: f64, errors: &mut Vec<Error>| {
            if !(value.is_finite() && value > 0.0) {
                errors.push(Error::InvalidShapeParameter { parameter, value });
            }
        };
        match &self.shape {
            ResolvedShape::Constant => {}
            ResolvedShape::Gaussian { sigma, .. } => positive("sigma", *sigma, &mut errors),
            ResolvedShape::Drag {
                sigma,
                alpha,
                anharmonicity,
                detuning,
                ..
            } => {
                positive("sigma", *sigma, &mut errors);
                if *alpha != 0.0 && anharmonicity == detuning {
                    errors.push(Error::InvalidShapeParameter {
                        parameter: "anharmonicity",
                        value: *anharmonicity,
                    });
                }
            }
            ResolvedShape::FlatTopCosine { flat_length, part } => {
                let in_range = (0..=self.duration).contains(flat_length);
                // Both edges need at least two samples.
                let valid = in_range
                    && match part {
                        FlatTopPart::All => {
                            let edges = self.duration - flat_length;
                            edges % 2 == 0 && edges / 2 >= 2
                        }
                        FlatTopPart::Rise | FlatTopPart::Fall => self.duration >= 2,
                    };
                if !valid {
                    errors.push(Error::InvalidShapeParameter {
                        parameter: "flat_length",
                        value: *flat_length as f64,
                    });
                }
            }
            ResolvedShape::Arbitrary { samples } => {
                let expected = nanoseconds(self.duration).to_samples(traits.sampling_rate);
                if samples.len() as i64 != expected {
                    errors.push(Error::SampleCountMismatch {
                        expected,
                        actual: samples.len() as i64,
                    });
                }
                if let Some(bad) = samples.iter().find(|s| !s.is_finite()) {
                    errors.push(Error::InvalidShapeParameter {
                        parameter: "samples",
                        value: *bad,
                    });
                }
            }
        }
        errors
    }

    /// Sample the envelope at `sampling_rate`.
    ///
    /// Constant pulses have no sample list; they are emitted as a single level.
    pub fn sample(&self, sampling_rate: f64) -> Option<Vec<Complex64>> {
        let length = nanoseconds(self.duration).to_samples(sampling_rate).max(0) as usize;
        let per_ns = sampling_rate * 1e-9;
        let envelope: Vec<Complex64> = match &self.shape {
            ResolvedShape::Constant => return None,
            ResolvedShape::Gaussian { sigma, subtracted } => {
                gaussian(self.amplitude, length, sigma * per_ns, *subtracted)
                    .into_iter()
                    .map(|v| Complex64::new(v, 0.0))
                    .collect()
            }
            ResolvedShape::Drag {
                sigma,
                alpha,
                anharmonicity,
                detuning,
                subtracted,
            } => drag(
                self.amplitude,
                length,
                sigma * per_ns,
                *alpha,
                anharmonicity - detuning,
                *subtracted,
                sampling_rate,
            ),
            ResolvedShape::FlatTopCosine { flat_length, part } => {
                let flat = nanoseconds(*flat_length).to_samples(sampling_rate).max(0) as usize;
                flattop_cosine(self.amplitude, length, flat, *part)
                    .into_iter()
                    .map(|v| Complex64::new(v, 0.0))
                    .collect()
            }
            ResolvedShape::Arbitrary { samples } => samples
                .iter()
                .map(|s| Complex64::new(self.amplitude * s, 0.0))
                .collect(),
        };
        Some(match self.axis_angle {
            Some(angle) => {
                let rotation = Complex64::from_polar(1.0, angle);
                envelope.into_iter().map(|z| z * rotation).collect()
            }
            None => envelope,
        })
    }

    pub fn into_resolved(self, id: PulseUid, kind: ShapeKind, sampling_rate: f64) -> ResolvedPulse {
        let samples = self.sample(sampling_rate).map(|samples| {
            let iq = self.axis_angle.is_some() || samples.iter().any(|z| z.im != 0.0);
            Waveform {
                i: samples.iter().map(|z| z.re).collect(),
                q: iq.then(|| samples.iter().map(|z| z.im).collect()),
            }
        });
        ResolvedPulse {
            id,
            shape: kind,
            duration: self.duration,
            amplitude: self.amplitude,
            samples,
            digital_marker: self.digital_marker,
        }
    }
}

fn gaussian(amplitude: f64, length: usize, sigma: f64, subtracted: bool) -> Vec<f64> {
    let center = (length as f64 - 1.0) / 2.0;
    let mut wave: Vec<f64> = (0..length)
        .map(|t| {
            let x = t as f64 - center;
            amplitude * (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    // Pull both end points to zero.
    if subtracted && let Some(&edge) = wave.last() {
        wave.iter_mut().for_each(|v| *v -= edge);
    }
    wave
}

fn drag(
    amplitude: f64,
    length: usize,
    sigma: f64,
    alpha: f64,
    detuned_anharmonicity: f64,
    subtracted: bool,
    sampling_rate: f64,
) -> Vec<Complex64> {
    let in_phase = gaussian(amplitude, length, sigma, subtracted);
    if alpha == 0.0 {
        return in_phase.into_iter().map(|v| Complex64::new(v, 0.0)).collect();
    }
    let center = (length as f64 - 1.0) / 2.0;
    let scale = alpha / (2.0 * PI * detuned_anharmonicity);
    (0..length)
        .map(|t| {
            let x = t as f64 - center;
            // Derivative of the Gaussian in V/s.
            let derivative = -amplitude * sampling_rate * x / (sigma * sigma)
                * (-x * x / (2.0 * sigma * sigma)).exp();
            Complex64::new(in_phase[t], scale * derivative)
        })
        .collect()
}

fn flattop_cosine(amplitude: f64, length: usize, flat: usize, part: FlatTopPart) -> Vec<f64> {
    let rise_fall = match part {
        FlatTopPart::All => length.saturating_sub(flat) / 2,
        FlatTopPart::Rise | FlatTopPart::Fall => length,
    };
    let denominator = rise_fall.saturating_sub(1).max(1) as f64;
    let rise: Vec<f64> = (0..rise_fall)
        .map(|k| amplitude * 0.5 * (1.0 - (PI * k as f64 / denominator).cos()))
        .collect();
    match part {
        FlatTopPart::Rise => rise,
        FlatTopPart::Fall => rise.into_iter().rev().collect(),
        FlatTopPart::All => {
            let mut wave = rise.clone();
            wave.extend(std::iter::repeat_n(amplitude, flat));
            wave.extend(rise.into_iter().rev());
            wave
        }
    }
}

/// I/Q sample lists in V at the controller sampling rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
    pub i: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<Vec<f64>>,
}

/// Pulse with all parameters resolved, as emitted into the configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPulse {
    #[serde(skip)]
    pub id: PulseUid,
    pub shape: ShapeKind,
    pub duration: i64,
    pub amplitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<Waveform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital_marker: Option<Vec<(i64, i64)>>,
}

/// Resolve a template and check it, returning the first problem found.
pub fn resolve_template<T: ComponentTree + ?Sized>(
    template: &PulseTemplate,
    scope: &NodePath,
    resolver: &ParameterResolver<'_, T>,
    traits: &DeviceTraits,
) -> Result<ResolvedPulse> {
    let parameters = template
        .resolve_parameters(scope, resolver)
        .map_err(|errors| {
            errors.into_iter().next().unwrap_or_else(|| {
                Error::CorruptedTree(format!("pulse '{}' failed to resolve", template.id))
            })
        })?;
    Ok(parameters.into_resolved(
        template.id.clone(),
        template.shape.kind(),
        traits.sampling_rate,
    ))
}
