// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the authenticated identity.
//!
//! Handlers behind the authentication gate take `Auth` to read the
//! [`AuthContext`]:
//!
//! ```rust,ignore
//! async fn me(Auth(context): Auth) -> impl IntoResponse {
//!     // context.user_id, context.claims
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthContext, AuthError};

/// Extractor for the identity attached by the authentication gate.
///
/// Rejects with 401 `Unauthorized` when the route is not behind the gate.
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::Unauthorized)
    }
}
