// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization middleware for Axum.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let admin = Router::new()
//!     .route("/admin/overview", get(overview))
//!     .route_layer(middleware::from_fn_with_state(RequiredRole::default(), authorize));
//!
//! let protected = Router::new()
//!     .route("/me", get(me))
//!     .merge(admin)
//!     .route_layer(middleware::from_fn_with_state(gate, authenticate));
//! ```
//!
//! `authorize` must sit inside `authenticate`: it only reads the
//! [`AuthContext`] that `authenticate` leaves in the request extensions.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::claims::AuthContext;
use super::error::{AuthError, KeyResolutionError, VerifyError};
use super::roles::RequiredRole;
use super::verifier::TokenVerifier;

/// Upper bound on verification per request (10 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const BEARER_PREFIX: &str = "Bearer ";

/// State for the [`authenticate`] middleware.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<TokenVerifier>,
    request_timeout: Duration,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Authenticate a request from its headers.
    ///
    /// Verification is bounded by the request timeout; on expiry the request
    /// fails as a key fetch failure while any in-flight fetch carries on in
    /// the background.
    pub async fn authenticate_headers(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let token = bearer_token(headers)?;

        let claims = tokio::time::timeout(self.request_timeout, self.verifier.verify(token))
            .await
            .map_err(|_| {
                VerifyError::KeyUnavailable(KeyResolutionError::Fetch(format!(
                    "verification exceeded {}ms",
                    self.request_timeout.as_millis()
                )))
            })??;

        Ok(AuthContext::new(claims))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::InvalidAuthHeader)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Authentication gate.
pub async fn authenticate(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let result = gate.authenticate_headers(request.headers()).await;

    match result {
        Ok(context) => {
            tracing::debug!(user_id = %context.user_id, "request authenticated");
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(err) => {
            err.log_rejection();
            err.into_response()
        }
    }
}

/// Authorization gate. Requires the configured role in the claims metadata.
pub async fn authorize(
    State(required): State<RequiredRole>,
    request: Request,
    next: Next,
) -> Response {
    let Some(context) = request.extensions().get::<AuthContext>() else {
        let err = AuthError::Unauthorized;
        err.log_rejection();
        return err.into_response();
    };

    if !required.is_satisfied_by(&context.claims) {
        tracing::debug!(
            user_id = %context.user_id,
            required_role = %required,
            "role requirement not met"
        );
        return AuthError::InsufficientPermissions.into_response();
    }

    next.run(request).await
}
