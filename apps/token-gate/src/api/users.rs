// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;

use crate::auth::{claims::AuthContextView, Auth};

/// Get the current authenticated user's identity and claims.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Authenticated identity", body = AuthContextView),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(context): Auth) -> Json<AuthContextView> {
    Json(context.view())
}
