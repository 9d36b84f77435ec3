// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the per-request authenticated context.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Application-specific claim fields (email, role, ...).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key holding the caller's role.
pub const ROLE_KEY: &str = "role";

/// Claims decoded from a verified token.
///
/// The fields this crate inspects (`sub`, `exp`, `nbf`) are typed; anything
/// provider-specific lives in the `metadata` claim object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,

    /// Not before timestamp (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issued at timestamp (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer
    #[serde(default)]
    pub iss: String,

    /// Session ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    /// Provider metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl Claims {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Expiration as a UTC instant. Out-of-range values clamp to the epoch.
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp_to_utc(self.exp)
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.nbf.map(timestamp_to_utc)
    }

    /// Role carried in metadata, if it is a string.
    pub fn role(&self) -> Option<&str> {
        self.metadata.get(ROLE_KEY).and_then(|v| v.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.metadata.get("email").and_then(|v| v.as_str())
    }

    /// True when `exp` is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

fn timestamp_to_utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// Identity attached to a request after the authentication gate succeeds.
///
/// Lives in the request extensions for the rest of that request. Claims are
/// shared behind an `Arc` and never mutated.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub claims: Arc<Claims>,
}

impl AuthContext {
    pub fn new(claims: Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            claims: Arc::new(claims),
        }
    }

    pub fn view(&self) -> AuthContextView {
        AuthContextView {
            user_id: self.user_id.clone(),
            claims: ClaimsView::from(self.claims.as_ref()),
        }
    }
}

/// Serialized form of [`AuthContext`] handed to downstream consumers.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthContextView {
    pub user_id: String,
    pub claims: ClaimsView,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsView {
    pub subject: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    pub issuer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
}

impl From<&Claims> for ClaimsView {
    fn from(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            expires_at: claims.expires_at(),
            not_before: claims.not_before(),
            issuer: claims.iss.clone(),
            session_id: claims.sid.clone(),
            metadata: claims.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_claims() -> Claims {
        serde_json::from_value(json!({
            "sub": "user_123",
            "exp": 1700003600,
            "iat": 1700000000,
            "iss": "https://idp.example.com",
            "sid": "sess_abc",
            "metadata": { "role": "admin", "email": "a@example.com" }
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_required_and_optional_fields() {
        let claims = sample_claims();
        assert_eq!(claims.subject(), "user_123");
        assert_eq!(claims.sid.as_deref(), Some("sess_abc"));
        assert_eq!(claims.nbf, None);
        assert_eq!(claims.role(), Some("admin"));
        assert_eq!(claims.email(), Some("a@example.com"));
    }

    #[test]
    fn missing_sub_or_exp_is_rejected() {
        assert!(serde_json::from_value::<Claims>(json!({ "exp": 1 })).is_err());
        assert!(serde_json::from_value::<Claims>(json!({ "sub": "u" })).is_err());
    }

    #[test]
    fn non_string_role_is_ignored() {
        let mut claims = sample_claims();
        claims.metadata.insert(ROLE_KEY.into(), json!(["admin"]));
        assert_eq!(claims.role(), None);
    }

    #[test]
    fn expiry_is_inclusive_of_now() {
        let claims = sample_claims();
        let at_exp = Utc.timestamp_opt(claims.exp, 0).unwrap();
        assert!(claims.is_expired_at(at_exp));
        assert!(!claims.is_expired_at(at_exp - chrono::Duration::seconds(1)));
    }

    #[test]
    fn context_view_uses_camel_case() {
        let ctx = AuthContext::new(sample_claims());
        assert_eq!(ctx.user_id, "user_123");

        let value = serde_json::to_value(ctx.view()).unwrap();
        assert_eq!(value["userId"], "user_123");
        assert_eq!(value["claims"]["subject"], "user_123");
        assert_eq!(value["claims"]["expiresAt"], "2023-11-14T23:13:20Z");
        assert_eq!(value["claims"]["metadata"]["role"], "admin");
    }
}
