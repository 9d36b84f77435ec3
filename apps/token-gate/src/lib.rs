// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token Gate - bearer token verification for backend services
//!
//! Converts an `Authorization: Bearer <JWT>` header into a verified identity
//! using keys from a remote JWKS endpoint, and gates privileged routes on a
//! role claim.
//!
//! ## Modules
//!
//! - `auth` - Key resolution, token verification, authentication and
//!   authorization middleware
//! - `api` - HTTP router, health probes and demo protected handlers (Axum)
//! - `config` - Environment configuration
//! - `logging` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
