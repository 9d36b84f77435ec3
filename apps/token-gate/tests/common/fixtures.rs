// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key fixtures and token helpers shared by unit and integration tests.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const JWKS_PATH: &str = "/.well-known/jwks.json";

pub fn primary_pem() -> &'static str {
    include_str!("../fixtures/primary_rsa.pem")
}

pub fn rogue_pem() -> &'static str {
    include_str!("../fixtures/rogue_rsa.pem")
}

/// Public JWK for the key in `pem`.
pub fn jwk(kid: &str, pem: &str) -> Value {
    let private_key = RsaPrivateKey::from_pkcs1_pem(pem).expect("fixture key");
    let public_key = RsaPublicKey::from(&private_key);
    json!({
        "kid": kid,
        "kty": "RSA",
        "use": "sig",
        "alg": "RS256",
        "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
        "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
    })
}

/// Sign `claims` with the key in `pem`, setting `kid` when given.
pub fn sign(kid: Option<&str>, claims: &Value, pem: &str) -> String {
    sign_with(Algorithm::RS256, kid, claims, pem)
}

pub fn sign_with(alg: Algorithm, kid: Option<&str>, claims: &Value, pem: &str) -> String {
    let mut header = Header::new(alg);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("encoding key");
    encode(&header, claims, &key).expect("sign token")
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims valid for the next hour.
pub fn valid_claims(sub: &str, role: Option<&str>) -> Value {
    let mut claims = json!({
        "sub": sub,
        "exp": now() + 3600,
        "iat": now(),
        "iss": "https://idp.example.com",
        "sid": "sess_1",
        "metadata": { "email": format!("{sub}@example.com") }
    });
    if let Some(role) = role {
        claims["metadata"]["role"] = json!(role);
    }
    claims
}

/// Serve `keys` at [`JWKS_PATH`], expecting exactly `calls` fetches.
pub async fn mock_jwks(keys: Vec<Value>, calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
        .expect(calls)
        .mount(&server)
        .await;
    server
}
