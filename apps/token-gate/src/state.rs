// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::auth::{AuthGate, KeyResolver, RequiredRole, TokenVerifier};
use crate::config::GateConfig;

#[derive(Clone)]
pub struct AppState {
    pub gate: AuthGate,
    pub required_role: RequiredRole,
}

impl AppState {
    pub fn new(gate: AuthGate, required_role: RequiredRole) -> Self {
        Self {
            gate,
            required_role,
        }
    }

    /// Wire resolver, verifier and gates from configuration.
    pub fn from_config(config: &GateConfig) -> Result<Self, reqwest::Error> {
        let mut resolver = KeyResolver::new(config.jwks_url.as_str(), config.jwks_timeout)?
            .with_probe_interval(config.probe_interval);
        if let Some(ttl) = config.key_cache_ttl {
            resolver = resolver.with_cache_ttl(ttl);
        }

        let verifier = TokenVerifier::new(resolver, config.verifier_settings());
        let gate = AuthGate::new(verifier).with_request_timeout(config.request_timeout);

        Ok(Self::new(gate, RequiredRole::new(config.required_role.clone())))
    }

    pub fn resolver(&self) -> &KeyResolver {
        self.gate.verifier().resolver()
    }
}
