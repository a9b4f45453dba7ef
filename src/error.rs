//! Error types for the facade and its collaborators.
//!
//! The codec core (`bdi`, `flip`) never returns a `Result` for invariant
//! violations — see [`crate::codec_bug`] — so the types here cover the
//! outer layers: why a controller refused a request, and what went wrong
//! parsing a [`crate::config::MemoryConfig`].

use std::fmt;

/// Why [`crate::controller::MemoryController::is_issuable`] refused a request.
///
/// Carried purely for diagnostics; the facade only ever inspects the paired
/// boolean, never branches on the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// The facade has not been configured yet.
    Unconfigured,
    /// The target bank's row buffer holds a different row and the
    /// controller has no free entry to track the conflict.
    RowBufferConflict,
    /// The channel has no controller associated with it.
    ChannelBusy,
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FailReason::Unconfigured => "memory system not configured",
            FailReason::RowBufferConflict => "row buffer conflict",
            FailReason::ChannelBusy => "channel busy",
        };
        f.write_str(msg)
    }
}

/// Errors raised while parsing a [`crate::config::MemoryConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A non-blank, non-comment line was not of the form `key = value`.
    MalformedLine { line_no: usize, line: String },
    /// A field expected to be numeric could not be parsed as one.
    InvalidNumber { key: String, value: String },
    /// A required field was absent and has no default.
    MissingField(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MalformedLine { line_no, line } => {
                write!(f, "malformed config line {line_no}: {line:?}")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "field {key} expected a number, got {value:?}")
            }
            ConfigError::MissingField(key) => write!(f, "missing required field {key}"),
        }
    }
}

impl std::error::Error for ConfigError {}
