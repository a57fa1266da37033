// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! Unit-typed quantities used across the hardware description.
//!
//! # Examples
//! ```rust
//! use squid_units::{gigahertz, megahertz, Frequency, Hertz};
//!
//! let lo: Frequency<Hertz> = gigahertz(5.0);
//! let rf = lo + megahertz(100.0);
//! assert_eq!(rf.value(), 5.1e9);
//! ```

use std::fmt::{self, Display, Formatter};

pub mod unit;

unit::quantity! {
    /// Frequency; negative values are valid intermediate frequencies.
    Frequency
}
unit::quantity! {
    /// Voltage at a controller output.
    Voltage
}
unit::quantity! {
    /// Duration on the controller clock.
    Duration
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hertz;

impl Display for Hertz {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Hz")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Volt;

impl Display for Volt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "V")
    }
}

/// Durations on the controller are counted in whole nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Nanosecond;

impl Display for Nanosecond {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ns")
    }
}

pub const fn hertz<T>(value: T) -> Frequency<Hertz, T> {
    Frequency { value, unit: Hertz }
}

pub fn megahertz(value: f64) -> Frequency<Hertz> {
    hertz(value * 1e6)
}

pub fn gigahertz(value: f64) -> Frequency<Hertz> {
    hertz(value * 1e9)
}

pub const fn volts<T>(value: T) -> Voltage<Volt, T> {
    Voltage { value, unit: Volt }
}

pub const fn nanoseconds(value: i64) -> Duration<Nanosecond, i64> {
    Duration {
        value,
        unit: Nanosecond,
    }
}

impl Duration<Nanosecond, i64> {
    /// Whether the duration lies on a grid of `resolution` nanoseconds.
    pub fn is_aligned_to(self, resolution: i64) -> bool {
        resolution > 0 && self.value % resolution == 0
    }

    /// Number of samples covered by this duration at `sampling_rate` (Sa/s).
    pub fn to_samples(self, sampling_rate: f64) -> i64 {
        (self.value as f64 * 1e-9 * sampling_rate).round() as i64
    }
}
