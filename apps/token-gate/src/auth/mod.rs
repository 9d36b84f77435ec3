// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token verification against a remote JWKS endpoint, plus a role
//! gate for privileged routes.
//!
//! ## Auth Flow
//!
//! 1. Caller sends `Authorization: Bearer <JWT>`
//! 2. [`authenticate`] extracts the token and hands it to [`TokenVerifier`]
//! 3. The verifier reads `kid` and asks [`KeyResolver`] for the key
//!    (cache hit, or one fetch of the key set)
//! 4. Signature (RSA family only), `exp`/`nbf` and optional `iss`/`aud`
//!    are checked
//! 5. The resulting [`AuthContext`] is stored in the request extensions
//! 6. [`authorize`] checks the `role` in the claims metadata
//!
//! ## Security
//!
//! - Response bodies carry a coarse reason only; no key material or
//!   internal error detail
//! - `exp` is re-checked without leeway after signature verification
//! - Keys are cached per `kid` for the process lifetime unless a TTL is set

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod roles;
pub mod verifier;

#[cfg(test)]
#[path = "../../tests/common/fixtures.rs"]
pub(crate) mod test_support;

pub use claims::{AuthContext, Claims};
pub use error::{AuthError, ErrorClass, KeyResolutionError, VerifyError};
pub use extractor::Auth;
pub use jwks::{KeyCache, KeyResolver, ResolvedKey};
pub use middleware::{authenticate, authorize, AuthGate};
pub use roles::RequiredRole;
pub use verifier::{TokenVerifier, VerifierSettings};
