// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.
//!
//! Three layers, each a closed enumeration:
//!
//! - [`KeyResolutionError`] - produced by the key resolver
//! - [`VerifyError`] - produced by the token verifier
//! - [`AuthError`] - produced by the gates, and the only type that knows
//!   about HTTP status codes and public reason strings

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Failure to turn a key identifier into verification key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyResolutionError {
    /// Network failure, non-success status, malformed key set JSON or timeout.
    #[error("key set fetch failed: {0}")]
    Fetch(String),

    /// The matching entry carries key material that does not parse.
    #[error("key material could not be parsed: {0}")]
    Parse(String),

    /// The fetched key set has no entry with the requested identifier.
    #[error("no key with id '{0}' in the published key set")]
    NotFound(String),
}

/// Failure to verify a raw bearer token.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("token is not a well-formed JWT")]
    InvalidFormat,

    #[error("token header has no kid")]
    MissingKeyId,

    #[error("verification key unavailable: {0}")]
    KeyUnavailable(#[from] KeyResolutionError),

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token is not yet valid")]
    NotYetValid,

    #[error("token issuer or audience rejected")]
    ClaimRejected,
}

/// Coarse classification used for logging and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Header or token shape violation (client fault).
    Format,
    /// Key set fetch or parse failure (outage or misconfiguration).
    KeyResolution,
    /// Signature or claim mismatch.
    Crypto,
    /// Expired or not-yet-valid token.
    Temporal,
    /// Valid identity lacking the required role.
    Authorization,
}

/// Gate-level error. Converted into an HTTP response in exactly one place.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("authorization header is missing")]
    MissingAuthHeader,
    /// Header present but not of the form `Bearer <token>`
    #[error("authorization header is not a bearer credential")]
    InvalidAuthHeader,
    /// Token verification failed
    #[error(transparent)]
    Token(#[from] VerifyError),
    /// Authorization stage reached without an authenticated identity
    #[error("no authenticated identity on request")]
    Unauthorized,
    /// Identity lacks the required role
    #[error("required role not present")]
    InsufficientPermissions,
}

impl AuthError {
    /// Public-facing reason string placed in the response body.
    ///
    /// Deliberately coarse: signature failures and claim mismatches share a
    /// reason so callers cannot probe which check failed.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "Missing authorization header",
            AuthError::InvalidAuthHeader => {
                "Invalid authorization format. Expected: Bearer <token>"
            }
            AuthError::Token(err) => match err {
                VerifyError::InvalidFormat => "Invalid token format",
                VerifyError::MissingKeyId => "Token missing kid claim",
                VerifyError::KeyUnavailable(KeyResolutionError::Fetch(_)) => {
                    "Failed to fetch public keys"
                }
                VerifyError::KeyUnavailable(KeyResolutionError::Parse(_)) => {
                    "Failed to parse public key"
                }
                VerifyError::KeyUnavailable(KeyResolutionError::NotFound(_)) => {
                    "Public key not found for token"
                }
                VerifyError::SignatureInvalid
                | VerifyError::NotYetValid
                | VerifyError::ClaimRejected => "Invalid or expired token",
                VerifyError::Expired => "Token expired",
            },
            AuthError::Unauthorized => "Unauthorized",
            AuthError::InsufficientPermissions => "Insufficient permissions",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader => ErrorClass::Format,
            AuthError::Token(err) => match err {
                VerifyError::InvalidFormat | VerifyError::MissingKeyId => ErrorClass::Format,
                VerifyError::KeyUnavailable(_) => ErrorClass::KeyResolution,
                VerifyError::SignatureInvalid | VerifyError::ClaimRejected => ErrorClass::Crypto,
                VerifyError::Expired | VerifyError::NotYetValid => ErrorClass::Temporal,
            },
            AuthError::Unauthorized | AuthError::InsufficientPermissions => {
                ErrorClass::Authorization
            }
        }
    }

    /// Emit one log line for a rejected request.
    ///
    /// Key resolution failures carry their internal cause since they point
    /// at an outage or misconfiguration. Crypto failures never log detail.
    pub(crate) fn log_rejection(&self) {
        match self.class() {
            ErrorClass::KeyResolution => {
                tracing::warn!(error = %self, reason = self.reason(), "key resolution failed");
            }
            ErrorClass::Crypto => {
                tracing::debug!(reason = self.reason(), "token rejected");
            }
            class => {
                tracing::debug!(?class, reason = self.reason(), "request rejected");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(&self).into_response()
    }
}
