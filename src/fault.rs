//! # Fault: the operator-facing error record.
//!
//! A [`Fault`] bundles a numeric classification code, the underlying cause,
//! and a free-text comment. It exists purely to give operators context in
//! logs and escalation messages; the coordinator never branches on its
//! contents — only the installed [`Policy`](crate::Policy) does.
//!
//! ## Example
//! ```rust
//! use errvisor::Fault;
//!
//! let fault = Fault::new(42, "connection refused", "dial to upstream");
//! assert_eq!(fault.to_string(), "42: connection refused: dial to upstream");
//! ```

use thiserror::Error;

/// Immutable record describing a reported error.
///
/// Formatting is direct: `"{code}: {cause}: {comment}"`. The record is
/// cheap to clone and travels by value through the report channel.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{code}: {cause}: {comment}")]
pub struct Fault {
    /// Numeric classification code (operator convention, not interpreted).
    pub code: i32,
    /// Underlying cause, rendered as text.
    pub cause: String,
    /// Free-text comment adding context.
    pub comment: String,
}

impl Fault {
    /// Creates a fault from its three parts.
    pub fn new(code: i32, cause: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            code,
            cause: cause.into(),
            comment: comment.into(),
        }
    }

    /// Creates a bare fault carrying only a cause message (code 0, no comment).
    ///
    /// ## Example
    /// ```rust
    /// use errvisor::Fault;
    ///
    /// let fault = Fault::message("boom");
    /// assert_eq!(fault.code, 0);
    /// assert_eq!(fault.cause, "boom");
    /// ```
    pub fn message(cause: impl Into<String>) -> Self {
        Self::new(0, cause, "")
    }

    /// Wraps any error value as the cause of a fault.
    pub fn from_error<E: std::fmt::Display>(code: i32, error: &E, comment: impl Into<String>) -> Self {
        Self::new(code, error.to_string(), comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_direct() {
        let fault = Fault::new(7, "disk full", "while flushing journal");
        assert_eq!(fault.to_string(), "7: disk full: while flushing journal");
    }

    #[test]
    fn test_from_error_renders_cause() {
        let io = std::io::Error::other("nope");
        let fault = Fault::from_error(1, &io, "open config");
        assert_eq!(fault.cause, "nope");
        assert_eq!(fault.comment, "open config");
    }
}
