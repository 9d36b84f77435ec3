// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role requirement enforced by the authorization gate.

use std::sync::Arc;

use super::claims::Claims;

/// Role value required when none is configured.
pub const DEFAULT_REQUIRED_ROLE: &str = "admin";

/// The privileged role a route subtree requires.
///
/// Matching is exact: `"Admin"` does not satisfy a requirement of `"admin"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredRole(Arc<str>);

impl RequiredRole {
    pub fn new(role: impl Into<String>) -> Self {
        Self(Arc::from(role.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the claims carry this role in their metadata.
    pub fn is_satisfied_by(&self, claims: &Claims) -> bool {
        claims.role() == Some(self.as_str())
    }
}

impl Default for RequiredRole {
    fn default() -> Self {
        Self::new(DEFAULT_REQUIRED_ROLE)
    }
}

impl std::fmt::Display for RequiredRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
