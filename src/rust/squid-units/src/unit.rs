// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! The generic quantity behind [`Frequency`](crate::Frequency),
//! [`Voltage`](crate::Voltage) and [`Duration`](crate::Duration).

pub(crate) fn round_to_significant_digits(x: f64, n: u32) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let order = x.abs().log10().floor();
    let scale = 10f64.powf((n as f64) - 1.0 - order);
    (x * scale).round() / scale
}

/// Declare a quantity type `$ident<U, T = f64>`.
///
/// Values of different units never mix. Quantities of one unit can be added
/// and subtracted, compared and sorted; they serialize as their bare number.
macro_rules! quantity {
    ($(#[$meta:meta])* $ident:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, Debug)]
        pub struct $ident<U, T = f64> {
            pub(crate) value: T,
            pub(crate) unit: U,
        }

        impl<U, T> $ident<U, T> {
            pub fn value(self) -> T {
                self.value
            }
        }

        impl<U, T: num_traits::Float> $ident<U, T> {
            pub fn is_finite(self) -> bool {
                self.value.is_finite()
            }
        }

        // Total order on the value; zero and negative zero compare equal.
        impl<U, T: PartialOrd> Ord for $ident<U, T> {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.value
                    .partial_cmp(&other.value)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }
        }

        impl<U, T: PartialOrd> PartialOrd for $ident<U, T> {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl<U, T: PartialOrd> PartialEq for $ident<U, T> {
            fn eq(&self, other: &Self) -> bool {
                self.cmp(other).is_eq()
            }
        }

        impl<U, T: PartialOrd> Eq for $ident<U, T> {}

        impl<U, T: std::ops::Add<Output = T>> std::ops::Add for $ident<U, T> {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                $ident {
                    value: self.value + rhs.value,
                    unit: self.unit,
                }
            }
        }

        impl<U, T: std::ops::Sub<Output = T>> std::ops::Sub for $ident<U, T> {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                $ident {
                    value: self.value - rhs.value,
                    unit: self.unit,
                }
            }
        }

        impl<U: std::fmt::Display> std::fmt::Display for $ident<U, f64> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                // 15 digits hide the noise of unit conversions.
                let value = $crate::unit::round_to_significant_digits(self.value, 15);
                write!(f, "{value:?} {}", self.unit)
            }
        }

        impl<U: std::fmt::Display> std::fmt::Display for $ident<U, i64> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", self.value, self.unit)
            }
        }

        impl<U, T: serde::Serialize> serde::Serialize for $ident<U, T> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.value.serialize(serializer)
            }
        }
    };
}

pub(crate) use quantity;
