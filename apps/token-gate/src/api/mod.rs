// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    auth::{authenticate, authorize, claims::AuthContextView, claims::ClaimsView},
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/overview", get(admin::overview))
        .route_layer(middleware::from_fn_with_state(
            state.required_role.clone(),
            authorize,
        ));

    let v1_routes = Router::new()
        .route("/me", get(users::get_current_user))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            authenticate,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/api-doc/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/v1", v1_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        users::get_current_user,
        admin::overview
    ),
    components(
        schemas(
            AuthContextView,
            ClaimsView,
            admin::AdminOverviewResponse,
            health::ProbeStatus,
            health::KeySetReport,
            health::ReadinessReport,
            health::LivenessReport
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Users", description = "Authenticated identity"),
        (name = "Admin", description = "Privileged operations")
    )
)]
pub struct ApiDoc;
