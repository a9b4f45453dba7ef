//! Verbosity-gated diagnostics.
//!
//! Mirrors the reference simulator's habit of printing warnings directly to
//! stderr rather than routing them through a logging framework: a process-wide
//! level gate plus a couple of macros. 0 = silent, 1 = errors only, 2 = normal
//! (the default), 3 = verbose.

use std::sync::atomic::{AtomicU32, Ordering};

pub static DISPLAY_LEVEL: AtomicU32 = AtomicU32::new(2);

/// Returns the current diagnostic verbosity level.
#[inline]
pub fn display_level() -> u32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Sets the diagnostic verbosity level.
#[inline]
pub fn set_display_level(level: u32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Print to stderr unconditionally — equivalent to the reference `DISPLAY(...)`.
#[macro_export]
macro_rules! display {
    ($($arg:tt)*) => { eprintln!($($arg)*) };
}

/// Conditionally print to stderr at or above `level` — equivalent to the
/// reference `DISPLAYLEVEL(l, ...)`.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::diag::display_level() >= $level {
            eprintln!($($arg)*);
        }
    };
}

/// Report a codec invariant violation and abort the process.
///
/// `CodecInvariantViolation`s are developer bugs, not runtime conditions: the
/// BDI round-trip either holds or the codec itself is broken. There is no
/// sensible recovery, so this prints the fields a maintainer needs and panics
/// rather than returning a `Result` a caller could silently swallow.
#[macro_export]
macro_rules! codec_bug {
    ($($arg:tt)*) => {{
        eprintln!("BDI codec invariant violation:");
        eprintln!($($arg)*);
        panic!("BDI codec invariant violation");
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_level_round_trips() {
        let prev = display_level();
        set_display_level(3);
        assert_eq!(display_level(), 3);
        set_display_level(prev);
    }

    #[test]
    fn display_level_default_is_normal() {
        // Other tests in this process may have mutated the global; just check range.
        assert!(display_level() <= 3);
    }
}
