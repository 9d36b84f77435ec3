// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

#![allow(dead_code)]

mod fixtures;

pub use fixtures::*;

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header::AUTHORIZATION, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use token_gate::api::router;
use token_gate::auth::{AuthGate, KeyResolver, RequiredRole, TokenVerifier, VerifierSettings};
use token_gate::state::AppState;
use tower::ServiceExt;
use wiremock::MockServer;

pub fn state_for(server: &MockServer) -> AppState {
    let resolver = KeyResolver::new(format!("{}{}", server.uri(), JWKS_PATH), Duration::from_secs(5))
        .expect("http client");
    let verifier = TokenVerifier::new(resolver, VerifierSettings::default());
    AppState::new(AuthGate::new(verifier), RequiredRole::default())
}

pub fn app_for(server: &MockServer) -> (Router, AppState) {
    let state = state_for(server);
    (router(state.clone()), state)
}

pub async fn send(app: &Router, uri: &str, authorization: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).expect("request"))
        .await
        .expect("response")
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

pub async fn get_json(app: &Router, uri: &str, authorization: Option<&str>) -> (StatusCode, Value) {
    read_json(send(app, uri, authorization).await).await
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
