// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! ## Steps
//!
//! 1. Check the three segments: header and payload decode without verifying,
//!    and the signature is non-empty base64url
//! 2. Read `kid` from the header
//! 3. Resolve the key through [`KeyResolver`]
//! 4. Verify the signature, restricted to RSA algorithms
//! 5. Re-check `exp` against the clock with no leeway
//!
//! Step 5 is independent of the library's own expiry check: a token is
//! never accepted at or after its `exp`, whatever leeway is configured.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, Validation};

use super::claims::Claims;
use super::error::VerifyError;
use super::jwks::KeyResolver;

/// Clock skew tolerance (60 seconds).
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// Signing algorithms accepted. Anything outside the RSA family is rejected
/// whatever the token header claims.
pub const RSA_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Optional claim checks layered on top of signature verification.
#[derive(Debug, Clone)]
pub struct VerifierSettings {
    /// Expected issuer
    pub issuer: Option<String>,
    /// Expected audience
    pub audience: Option<String>,
    /// Leeway applied to the library `exp`/`nbf` checks
    pub leeway_secs: u64,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            issuer: None,
            audience: None,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }
}

/// Converts raw bearer tokens into verified [`Claims`].
#[derive(Clone)]
pub struct TokenVerifier {
    resolver: KeyResolver,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(resolver: KeyResolver, settings: VerifierSettings) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = RSA_ALGORITHMS.to_vec();
        validation.leeway = settings.leeway_secs;
        validation.validate_nbf = true;

        if let Some(ref issuer) = settings.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(ref audience) = settings.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        Self {
            resolver,
            validation,
        }
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    /// Verify a raw token and return its claims.
    pub async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let signature = match token.split('.').collect::<Vec<_>>().as_slice() {
            [_, _, signature] => *signature,
            _ => return Err(VerifyError::InvalidFormat),
        };
        if !is_signature_segment(signature) {
            return Err(VerifyError::InvalidFormat);
        }

        let unverified = jsonwebtoken::dangerous::insecure_decode::<Claims>(token)
            .map_err(|_| VerifyError::InvalidFormat)?;

        let kid = unverified
            .header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(VerifyError::MissingKeyId)?;

        // Checked again by `decode`; rejecting here avoids a key fetch for a
        // token that cannot pass.
        if !RSA_ALGORITHMS.contains(&unverified.header.alg) {
            return Err(VerifyError::SignatureInvalid);
        }

        let key = self.resolver.resolve(&kid).await?;

        let claims = decode::<Claims>(token, key.decoding_key(), &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                    VerifyError::InvalidFormat
                }
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                ErrorKind::ImmatureSignature => VerifyError::NotYetValid,
                ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::MissingRequiredClaim(_) => VerifyError::ClaimRejected,
                _ => VerifyError::SignatureInvalid,
            })?
            .claims;

        if claims.is_expired_at(Utc::now()) {
            return Err(VerifyError::Expired);
        }

        Ok(claims)
    }
}

fn is_signature_segment(segment: &str) -> bool {
    Base64UrlUnpadded::decode_vec(segment).is_ok_and(|bytes| !bytes.is_empty())
}
