//! Error types for the Pocket client.
//!
//! # Design
//! The two token endpoints share `Authentication`; which stage failed is
//! carried in `stage` rather than in separate variants. `Precondition` marks
//! a sequencing defect in the caller and is raised before any request is
//! built, so it never coexists with a network side effect.

use std::fmt;

use thiserror::Error;

/// The token endpoint that rejected a handshake step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    /// `v3/oauth/request` refused to issue a request token.
    RequestToken,
    /// `v3/oauth/authorize` refused to exchange the request token.
    AccessToken,
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStage::RequestToken => f.write_str("request token"),
            AuthStage::AccessToken => f.write_str("access token exchange"),
        }
    }
}

/// Errors returned by `PocketClient` parsers and `SavesRetriever` stages.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A token endpoint answered with a non-200 status.
    #[error("{stage} denied (HTTP {status}): {reason}")]
    Authentication {
        stage: AuthStage,
        status: u16,
        reason: String,
    },

    /// The retrieval endpoint answered with a non-200 status.
    #[error("retrieving saved items failed (HTTP {status}): {reason}")]
    Retrieval { status: u16, reason: String },

    /// A stage was invoked before the stage it depends on completed.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),

    /// The user-facing authorization step could not be completed.
    #[error("authorization step failed: {0}")]
    Authorization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The host could not complete the HTTP round-trip.
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication { status, .. } | ApiError::Retrieval { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
