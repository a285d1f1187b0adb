//! Structured errors carried by failed futures.
//!
//! Error handling follows these principles:
//!
//! - Failures are explicit and structured: a domain string, an integer
//!   code, and a key/value payload ([`ErrorInfo`]), never stringly-typed.
//! - Cancellation is a state, not an error value; it only surfaces as an
//!   error at the blocking boundary ([`WaitError::Cancelled`]).
//! - Panics in user-supplied closures are isolated and converted into
//!   failures in the [`PANIC_DOMAIN`] domain.

use core::fmt;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Domain for errors produced by user code without an explicit domain.
pub const USER_DOMAIN: &str = "settle.user";

/// Domain for deadline expiry raised by the timeout combinator.
pub const TIMEOUT_DOMAIN: &str = "settle.timeout";

/// Domain for invalid combinator input, such as racing an empty list.
pub const INVALID_DOMAIN: &str = "settle.invalid";

/// Domain for panics caught in user-supplied closures.
pub const PANIC_DOMAIN: &str = "settle.panic";

/// A structured error: domain, code, optional description, and a
/// key/value payload.
///
/// `ErrorInfo` is deliberately opaque to the state machine; it is stored
/// and propagated, never interpreted. Payload values are
/// [`serde_json::Value`] so arbitrary structured context can travel with
/// the error and serialize cleanly into logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    domain: String,
    code: i64,
    description: Option<String>,
    info: BTreeMap<String, Value>,
}

impl ErrorInfo {
    /// Creates an error in the given domain with the given code.
    #[must_use]
    pub fn new(domain: impl Into<String>, code: i64) -> Self {
        Self {
            domain: domain.into(),
            code,
            description: None,
            info: BTreeMap::new(),
        }
    }

    /// Creates a user-domain error from a bare description.
    #[must_use]
    pub fn msg(description: impl Into<String>) -> Self {
        Self::new(USER_DOMAIN, 0).with_description(description)
    }

    /// Creates a timeout error carrying a human-readable description of
    /// what timed out.
    #[must_use]
    pub fn timeout(description: impl Into<String>, waited: Duration) -> Self {
        Self::new(TIMEOUT_DOMAIN, 0)
            .with_description(description)
            .with_info("waited_ms", waited.as_millis() as u64)
    }

    /// Creates an invalid-input error.
    #[must_use]
    pub fn invalid(description: impl Into<String>) -> Self {
        Self::new(INVALID_DOMAIN, 0).with_description(description)
    }

    /// Creates an error from a caught panic message.
    #[must_use]
    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(PANIC_DOMAIN, 0).with_description(message)
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a payload entry.
    #[must_use]
    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }

    /// Returns the domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the payload.
    #[must_use]
    pub const fn info(&self) -> &BTreeMap<String, Value> {
        &self.info
    }

    /// Returns true if this error came out of the timeout combinator or
    /// the blocking await adapter.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.domain == TIMEOUT_DOMAIN
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.domain, self.code)?;
        if let Some(desc) = &self.description {
            write!(f, ": {desc}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorInfo {}

/// Error returned by the blocking await adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WaitError {
    /// The future resolved with an error.
    #[error("future failed: {0}")]
    Failed(ErrorInfo),
    /// The future was cancelled.
    #[error("future was cancelled")]
    Cancelled,
    /// The future did not reach a terminal state in time.
    #[error("wait timed out after {elapsed:?}")]
    Timeout {
        /// How long the caller waited.
        elapsed: Duration,
    },
}

impl WaitError {
    /// Returns the structured error for the `Failed` variant.
    #[must_use]
    pub fn into_error_info(self) -> Option<ErrorInfo> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_description() {
        let err = ErrorInfo::new("example.io", 4);
        assert_eq!(err.to_string(), "example.io(4)");
    }

    #[test]
    fn display_with_description() {
        let err = ErrorInfo::new("example.io", 4).with_description("read failed");
        assert_eq!(err.to_string(), "example.io(4): read failed");
    }

    #[test]
    fn payload_round_trips_values() {
        let err = ErrorInfo::msg("boom")
            .with_info("attempt", 3u64)
            .with_info("path", "/tmp/x");
        assert_eq!(err.info().get("attempt"), Some(&Value::from(3u64)));
        assert_eq!(err.info().get("path"), Some(&Value::from("/tmp/x")));
    }

    #[test]
    fn timeout_constructor_sets_domain() {
        let err = ErrorInfo::timeout("slow producer", Duration::from_millis(250));
        assert!(err.is_timeout());
        assert_eq!(err.domain(), TIMEOUT_DOMAIN);
        assert_eq!(err.info().get("waited_ms"), Some(&Value::from(250u64)));
    }

    #[test]
    fn wait_error_exposes_error_info() {
        let err = WaitError::Failed(ErrorInfo::msg("boom"));
        assert!(err.into_error_info().is_some());
        assert_eq!(WaitError::Cancelled.into_error_info(), None);
    }

    #[test]
    fn serializes_for_structured_logs() {
        let err = ErrorInfo::new("example.io", 4)
            .with_description("read failed")
            .with_info("fd", 7u64);
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["domain"], "example.io");
        assert_eq!(json["code"], 4);
        assert_eq!(json["info"]["fd"], 7);
    }
}
