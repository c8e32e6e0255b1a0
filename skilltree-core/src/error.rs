//! Error Types
//!
//! Two failure families exist in the engine:
//!
//! - [`TreeError::NotFound`] means a caller named a skill the graph does not
//!   contain. It signals a corrupt graph or a bad caller and is propagated
//!   untouched up to whoever drives the session.
//! - [`CodecError`] covers every way an encoded tree can be rejected. Decoding
//!   completes before any allocation changes, so a rejected import leaves the
//!   session as it was.

use thiserror::Error;

use crate::graph::SkillId;

/// Errors produced by the graph store, loader and allocation session.
#[derive(Debug, Error)]
pub enum TreeError {
    /// An operation referenced a skill id that is not in the graph.
    #[error("skill not found: {0}")]
    NotFound(SkillId),

    /// An encoded tree could not be decoded.
    #[error("invalid tree encoding: {0}")]
    InvalidEncoding(#[from] CodecError),

    /// The tree definition is structurally unusable.
    #[error("invalid tree definition: {0}")]
    InvalidDefinition(String),

    /// The tree definition or configuration is not valid JSON.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons an exported tree string is rejected.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload is not valid base64url.
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The leading version number does not match the supported one.
    #[error("unsupported tree version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// The class byte is not zero.
    #[error("unexpected class index {0}")]
    InvalidClass(u8),

    /// The ascendancy byte is not zero.
    #[error("unexpected ascendancy index {0}")]
    InvalidAscendancy(u8),

    /// The byte stream ended before the layout was complete.
    #[error("payload truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// The node section disagrees with the declared count or the trailer is
    /// not empty.
    #[error("malformed payload: {0}")]
    TrailingData(String),

    /// A skill id does not fit the two-byte slot of the format.
    #[error("skill {0} cannot be encoded")]
    SkillOutOfRange(SkillId),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TreeError>;
