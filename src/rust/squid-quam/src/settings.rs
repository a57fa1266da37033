// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use serde::{Deserialize, Serialize};

use squid_common::device_traits::DeviceTraits;
use squid_common::types::ControllerKind;

use crate::parameter_resolver::DEFAULT_MAX_REFERENCE_DEPTH;

const MAX_REFERENCE_DEPTH_LIMIT: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct SanitizationChange {
    pub field: &'static str,
    pub original: String,
    pub sanitized: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderSettings {
    pub controller: ControllerKind,
    /// Maximum number of reference hops when resolving one attribute.
    pub max_reference_depth: usize,
    /// Check the peak of sampled envelopes against the output range.
    pub check_waveform_peak: bool,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        BuilderSettings {
            controller: ControllerKind::default(),
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
            check_waveform_peak: true,
        }
    }
}

impl BuilderSettings {
    pub fn from_json(source: &str) -> anyhow::Result<Self> {
        serde_json::from_str(source).context("Failed to parse config builder settings")
    }

    pub fn traits(&self) -> &'static DeviceTraits {
        self.controller.traits()
    }

    pub fn sanitize(&mut self) -> Vec<SanitizationChange> {
        let mut changes = vec![];
        let depth = self.max_reference_depth.clamp(1, MAX_REFERENCE_DEPTH_LIMIT);
        if depth != self.max_reference_depth {
            changes.push(SanitizationChange {
                field: "max_reference_depth",
                original: self.max_reference_depth.to_string(),
                sanitized: depth.to_string(),
                reason: format!("Must lie in [1, {MAX_REFERENCE_DEPTH_LIMIT}]."),
            });
            self.max_reference_depth = depth;
        }
        changes
    }
}
