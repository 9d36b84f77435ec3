// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// `ok`: endpoint reachable. `degraded`: endpoint down but cached keys still
/// verify tokens. `unavailable`: neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ok,
    Degraded,
    Unavailable,
}

/// Key set endpoint reachability and local cache size.
#[derive(Debug, Serialize, ToSchema)]
pub struct KeySetReport {
    pub reachable: bool,
    /// Keys published by the endpoint, when it answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_keys: Option<usize>,
    pub cached_keys: usize,
}

impl KeySetReport {
    fn status(&self) -> ProbeStatus {
        match (self.reachable, self.cached_keys > 0) {
            (true, _) => ProbeStatus::Ok,
            (false, true) => ProbeStatus::Degraded,
            (false, false) => ProbeStatus::Unavailable,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessReport {
    pub status: ProbeStatus,
    pub key_set: KeySetReport,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessReport {
    pub status: ProbeStatus,
}

async fn key_set_report(state: &AppState) -> KeySetReport {
    let resolver = state.resolver();
    let published_keys = resolver.recent_probe().await;

    KeySetReport {
        reachable: published_keys.is_some(),
        published_keys,
        cached_keys: resolver.cached_key_count().await,
    }
}

/// Full health report. The key set endpoint is probed at most once per probe
/// interval; 503 only when it is unreachable and no key is cached.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Tokens can be verified", body = ReadinessReport),
        (status = 503, description = "Key set endpoint unreachable and cache empty", body = ReadinessReport)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    let key_set = key_set_report(&state).await;
    let status = key_set.status();
    let code = if status == ProbeStatus::Unavailable {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (code, Json(ReadinessReport { status, key_set }))
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = LivenessReport)
    )
)]
pub async fn liveness() -> Json<LivenessReport> {
    Json(LivenessReport {
        status: ProbeStatus::Ok,
    })
}

/// Readiness probe. Same checks as [`health`].
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to verify tokens", body = ReadinessReport),
        (status = 503, description = "Key set endpoint unreachable and cache empty", body = ReadinessReport)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    health(state).await
}
