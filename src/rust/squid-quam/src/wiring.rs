// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! Cabling between controller ports and Octave RF ports.

use serde::{Deserialize, Serialize};

use squid_common::device_traits::{DeviceTraits, OCTAVE_TRAITS};

use crate::error::{Error, Result};

/// Analog port of a controller as (controller name, port number).
pub type ControllerPort = (String, u8);

/// Pair of controller outputs carrying the I and Q baseband signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IqWiring {
    pub port_i: ControllerPort,
    pub port_q: ControllerPort,
}

impl IqWiring {
    pub fn new(controller: &str, port_i: u8, port_q: u8) -> Self {
        IqWiring {
            port_i: (controller.to_string(), port_i),
            port_q: (controller.to_string(), port_q),
        }
    }

    pub fn default_octave_port(&self) -> Result<u8> {
        default_octave_port(&self.port_i, &self.port_q)
    }
}

/// Readout line: controller outputs drive an Octave RF output, and the IF
/// outputs of a down-converter return on controller inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedLineWiring {
    pub output_i: ControllerPort,
    pub output_q: ControllerPort,
    pub input_i: ControllerPort,
    pub input_q: ControllerPort,
}

impl FeedLineWiring {
    pub fn new(controller: &str, outputs: (u8, u8), inputs: (u8, u8)) -> Self {
        let port = |number| (controller.to_string(), number);
        FeedLineWiring {
            output_i: port(outputs.0),
            output_q: port(outputs.1),
            input_i: port(inputs.0),
            input_q: port(inputs.1),
        }
    }

    /// Octave RF output driven by the controller outputs.
    pub fn default_octave_port_in(&self) -> Result<u8> {
        default_octave_port(&self.output_i, &self.output_q)
    }

    /// Octave RF input whose IF outputs return on the controller inputs.
    ///
    /// Inputs (1, 2) read RF input 1.
    pub fn default_octave_port_out(&self) -> Result<u8> {
        paired_port(&self.input_i, &self.input_q, OCTAVE_TRAITS.rf_inputs, "RF input")
    }
}

/// Cabling of a bound channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelWiring {
    Iq(IqWiring),
    FeedLine(FeedLineWiring),
}

impl From<IqWiring> for ChannelWiring {
    fn from(wiring: IqWiring) -> Self {
        ChannelWiring::Iq(wiring)
    }
}

impl From<FeedLineWiring> for ChannelWiring {
    fn from(wiring: FeedLineWiring) -> Self {
        ChannelWiring::FeedLine(wiring)
    }
}

impl ChannelWiring {
    /// Octave RF output the channel drives.
    pub fn rf_output(&self) -> Result<u8> {
        match self {
            ChannelWiring::Iq(wiring) => wiring.default_octave_port(),
            ChannelWiring::FeedLine(wiring) => wiring.default_octave_port_in(),
        }
    }

    /// Octave RF input the channel reads back, if any.
    pub fn rf_input(&self) -> Result<Option<u8>> {
        match self {
            ChannelWiring::Iq(_) => Ok(None),
            ChannelWiring::FeedLine(wiring) => wiring.default_octave_port_out().map(Some),
        }
    }

    pub fn feed_line(&self) -> Option<&FeedLineWiring> {
        match self {
            ChannelWiring::FeedLine(wiring) => Some(wiring),
            ChannelWiring::Iq(_) => None,
        }
    }

    /// Check that every port exists on a controller with `traits`.
    pub fn check_ports(&self, traits: &DeviceTraits) -> Result<()> {
        let (outputs, inputs) = match self {
            ChannelWiring::Iq(w) => (vec![&w.port_i, &w.port_q], vec![]),
            ChannelWiring::FeedLine(w) => (
                vec![&w.output_i, &w.output_q],
                vec![&w.input_i, &w.input_q],
            ),
        };
        let ports = outputs
            .into_iter()
            .map(|port| (port, "output", traits.analog_outputs))
            .chain(inputs.into_iter().map(|port| (port, "input", traits.analog_inputs)));
        for ((controller, number), kind, available) in ports {
            if !(1..=available).contains(number) {
                return Err(Error::InvalidWiring(format!(
                    "Controller '{controller}' has no analog {kind} {number}; valid ports are 1 to {available}."
                )));
            }
        }
        Ok(())
    }
}

/// Octave RF output fed by the default cabling of an I/Q output pair.
///
/// Outputs (1, 2) feed RF 1, (3, 4) feed RF 2 and so on up to (9, 10).
pub fn default_octave_port(port_i: &ControllerPort, port_q: &ControllerPort) -> Result<u8> {
    paired_port(port_i, port_q, OCTAVE_TRAITS.rf_outputs, "RF output")
}

fn paired_port(
    port_i: &ControllerPort,
    port_q: &ControllerPort,
    available: u8,
    octave_port: &str,
) -> Result<u8> {
    if port_i.0 != port_q.0 {
        return Err(Error::InvalidWiring(format!(
            "IQ ports must be on the same controller to use default Octave wiring, got '{}' and '{}'.",
            port_i.0, port_q.0
        )));
    }
    let (i, q) = (port_i.1, port_q.1);
    if i % 2 != 1 || i.checked_add(1) != Some(q) {
        return Err(Error::InvalidWiring(format!(
            "IQ ports must be consecutive with I on an odd port to use default Octave wiring, got {i} and {q}."
        )));
    }
    let port = q / 2;
    if port > available {
        return Err(Error::InvalidWiring(format!(
            "IQ ports ({i}, {q}) have no default Octave {octave_port}."
        )));
    }
    Ok(port)
}
