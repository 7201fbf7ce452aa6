//! Logging macros shared by the link core.
//!
//! Target builds log through `defmt`, host builds through `log`. With
//! neither feature enabled every macro evaluates its arguments and
//! discards them.

#[cfg(feature = "embedded")]
pub(crate) use defmt::{debug, info, trace, warn};

#[cfg(all(feature = "std", not(feature = "embedded")))]
pub(crate) use log::{debug, info, trace, warn};

#[cfg(not(any(feature = "std", feature = "embedded")))]
macro_rules! trace_noop {
    ($($arg:tt)*) => {{
        let _ = ($($arg)*);
    }};
}

#[cfg(not(any(feature = "std", feature = "embedded")))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {{
        let _ = ($($arg)*);
    }};
}

#[cfg(not(any(feature = "std", feature = "embedded")))]
macro_rules! info_noop {
    ($($arg:tt)*) => {{
        let _ = ($($arg)*);
    }};
}

#[cfg(not(any(feature = "std", feature = "embedded")))]
macro_rules! warn_noop {
    ($($arg:tt)*) => {{
        let _ = ($($arg)*);
    }};
}

#[cfg(not(any(feature = "std", feature = "embedded")))]
pub(crate) use debug_noop as debug;
#[cfg(not(any(feature = "std", feature = "embedded")))]
pub(crate) use info_noop as info;
#[cfg(not(any(feature = "std", feature = "embedded")))]
pub(crate) use trace_noop as trace;
#[cfg(not(any(feature = "std", feature = "embedded")))]
pub(crate) use warn_noop as warn;
