// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only endpoints.
//!
//! Mounted behind both gates; handlers can assume the required role.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{auth::Auth, state::AppState};

/// Admin overview response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverviewResponse {
    /// Caller's user ID.
    pub user_id: String,
    /// Role the caller was admitted with.
    pub role: String,
    /// Number of signing keys currently cached.
    pub cached_keys: usize,
}

/// Admin overview.
#[utoipa::path(
    get,
    path = "/v1/admin/overview",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Overview", body = AdminOverviewResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Insufficient permissions"),
    )
)]
pub async fn overview(
    Auth(context): Auth,
    State(state): State<AppState>,
) -> Json<AdminOverviewResponse> {
    Json(AdminOverviewResponse {
        user_id: context.user_id,
        role: state.required_role.to_string(),
        cached_keys: state.resolver().cached_key_count().await,
    })
}
