// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! Logging front-end shared by the SQuID Lab QuAM crates.
//!
//! Records go through the [`log`] facade with a target of the form
//! `squid_lab_quam.rust::<module path>`, so a host application can filter
//! the whole family with one directive. No logger is installed here.
//!
//! Build progress is logged at info level, recoverable problems at warn
//! level. Per-step traces use [`diagnostic!`] and cost a relaxed atomic
//! load unless [`init_logging`] switched them on.

use std::sync::atomic::{AtomicBool, Ordering};

#[doc(hidden)]
pub use log as _log;

/// Target prefix of every record.
pub const TARGET_PREFIX: &str = "squid_lab_quam.rust";

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($level:ident, $($arg:tt)+) => {
        $crate::_log::$level!(
            target: concat!("squid_lab_quam.rust::", module_path!()),
            $($arg)+
        )
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::__emit!(info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::__emit!(warn, $($arg)+)
    };
}

/// Debug record, dropped before formatting unless diagnostics are enabled.
#[macro_export]
macro_rules! diagnostic {
    ($($arg:tt)+) => {
        if $crate::diagnostics_enabled() {
            $crate::__emit!(debug, $($arg)+)
        }
    };
}

static DIAGNOSTICS: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn diagnostics_enabled() -> bool {
    DIAGNOSTICS.load(Ordering::Relaxed)
}

/// Switch diagnostic records on or off.
///
/// Routing and filtering of the records is up to the `log` implementation
/// installed by the host application.
pub fn init_logging(with_diagnostics: bool) {
    DIAGNOSTICS.store(with_diagnostics, Ordering::Relaxed);
}
