//! The single error kind produced by the binding engine.
//!
//! Every failure is attributable to exactly one key/value pair: the key that
//! no binding claimed, the key a dictionary rejected, or the key whose value
//! had the wrong shape. Nested failures are never wrapped, so the error
//! always names the deepest offending key.

use thiserror::Error;

/// A binding failure for one key/value pair.
///
/// Carries the offending key and a human-readable cause. Root-shape failures
/// (a root value that is not a tree node) carry an empty key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("binding failed for key `{key}`: {cause}")]
pub struct BindError {
    key: String,
    cause: String,
}

impl BindError {
    /// Create an error attributed to `key`.
    pub fn new(key: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cause: cause.into(),
        }
    }

    /// The error synthesized when a pair matches none of a target's declared
    /// bindings. This is the mechanism that turns typos into failures.
    pub fn unmatched(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cause: "no binding declared for this key".to_string(),
        }
    }

    /// The key the failure is attributed to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Human-readable description of what went wrong with the pair.
    pub fn cause(&self) -> &str {
        &self.cause
    }
}
