//! Logging macros.
//!
//! This module re-exports `log` or `defmt` macros depending on which feature
//! is active, falling back to no-ops when neither is enabled. It must be the
//! first `mod` in `lib.rs` so the macros are visible to every other module.

#![allow(unused_macros)]

#[cfg(all(feature = "log", feature = "defmt"))]
compile_error!("features `log` and `defmt` are mutually exclusive");

macro_rules! error {
    ($($arg:tt)*) => {
        cfg_if::cfg_if! {
            if #[cfg(feature = "log")] {
                ::log::error!($($arg)*);
            } else if #[cfg(feature = "defmt")] {
                ::defmt::error!($($arg)*);
            } else {
                let _ = ($($arg)*);
            }
        }
    };
}

macro_rules! warn_ {
    ($($arg:tt)*) => {
        cfg_if::cfg_if! {
            if #[cfg(feature = "log")] {
                ::log::warn!($($arg)*);
            } else if #[cfg(feature = "defmt")] {
                ::defmt::warn!($($arg)*);
            } else {
                let _ = ($($arg)*);
            }
        }
    };
}

macro_rules! info {
    ($($arg:tt)*) => {
        cfg_if::cfg_if! {
            if #[cfg(feature = "log")] {
                ::log::info!($($arg)*);
            } else if #[cfg(feature = "defmt")] {
                ::defmt::info!($($arg)*);
            } else {
                let _ = ($($arg)*);
            }
        }
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        cfg_if::cfg_if! {
            if #[cfg(feature = "log")] {
                ::log::debug!($($arg)*);
            } else if #[cfg(feature = "defmt")] {
                ::defmt::debug!($($arg)*);
            } else {
                let _ = ($($arg)*);
            }
        }
    };
}

macro_rules! trace {
    ($($arg:tt)*) => {
        cfg_if::cfg_if! {
            if #[cfg(feature = "log")] {
                ::log::trace!($($arg)*);
            } else if #[cfg(feature = "defmt")] {
                ::defmt::trace!($($arg)*);
            } else {
                let _ = ($($arg)*);
            }
        }
    };
}

pub(crate) use debug;
pub(crate) use error;
pub(crate) use info;
pub(crate) use trace;
pub(crate) use warn_ as warn;
