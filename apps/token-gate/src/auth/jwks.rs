// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and per-key caching.
//!
//! ## Behaviour
//!
//! - A cache hit returns immediately with no network I/O
//! - A cache miss fetches the whole key set once and parses only the entry
//!   whose `kid` matches
//! - Only successfully parsed keys are cached; a bad entry is refetched and
//!   re-rejected on every attempt
//! - Entries never expire unless a TTL is configured
//! - Health probes share one recent fetch result instead of fetching per call
//!
//! ## Concurrency
//!
//! The cache is shared by every in-flight request. Concurrent misses for the
//! same `kid` may each fetch; the first insert wins and later ones return it.
//! Fetches run on their own task so a cancelled request does not cancel the
//! fetch it started.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::DecodingKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use super::error::KeyResolutionError;

/// Default outbound fetch timeout (5 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a probe result is reused (30 seconds).
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Largest accepted modulus.
pub const MAX_MODULUS_BITS: usize = 8192;

/// Key set as published by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct KeySet {
    pub keys: Vec<KeyEntry>,
}

impl KeySet {
    /// Find the entry with the given key ID.
    pub fn find(&self, kid: &str) -> Option<&KeyEntry> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

/// One published key. Only RSA entries can be resolved; other entries may
/// be present in the set and are ignored unless requested.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyEntry {
    #[serde(default)]
    pub kid: Option<String>,
    pub kty: String,
    #[serde(default, rename = "use")]
    pub usage: Option<String>,
    /// Base64url modulus
    #[serde(default)]
    pub n: Option<String>,
    /// Base64url public exponent
    #[serde(default)]
    pub e: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
}

/// A parsed RSA public key ready for signature verification.
#[derive(Clone)]
pub struct ResolvedKey {
    kid: String,
    public_key: RsaPublicKey,
    decoding_key: DecodingKey,
    resolved_at: Instant,
}

impl std::fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("ResolvedKey")
            .field("kid", &self.kid)
            .field("modulus_bits", &self.public_key.n().bits())
            .finish()
    }
}

impl ResolvedKey {
    /// Parse a key entry into a verification key.
    pub fn from_entry(kid: &str, entry: &KeyEntry) -> Result<Self, KeyResolutionError> {
        if entry.kty != "RSA" {
            return Err(KeyResolutionError::Parse(format!(
                "unsupported key type '{}'",
                entry.kty
            )));
        }

        let n = entry
            .n
            .as_deref()
            .ok_or_else(|| KeyResolutionError::Parse("missing modulus".to_string()))?;
        let e = entry
            .e
            .as_deref()
            .ok_or_else(|| KeyResolutionError::Parse("missing exponent".to_string()))?;

        let modulus = decode_component("modulus", n)?;
        let exponent = exponent_from_be_bytes(&decode_component("exponent", e)?)?;

        let public_key = RsaPublicKey::new_with_max_size(
            BigUint::from_bytes_be(&modulus),
            BigUint::from(exponent),
            MAX_MODULUS_BITS,
        )
        .map_err(|err| KeyResolutionError::Parse(format!("rsa components rejected: {err}")))?;

        let decoding_key = DecodingKey::from_rsa_raw_components(
            &public_key.n().to_bytes_be(),
            &public_key.e().to_bytes_be(),
        );

        Ok(Self {
            kid: kid.to_string(),
            public_key,
            decoding_key,
            resolved_at: Instant::now(),
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        ttl.is_none_or(|ttl| self.resolved_at.elapsed() < ttl)
    }
}

/// Decode a base64url key component. Trailing padding is tolerated.
fn decode_component(name: &str, value: &str) -> Result<Vec<u8>, KeyResolutionError> {
    let bytes = Base64UrlUnpadded::decode_vec(value.trim_end_matches('='))
        .map_err(|err| KeyResolutionError::Parse(format!("{name}: {err}")))?;
    if bytes.is_empty() {
        return Err(KeyResolutionError::Parse(format!("{name}: empty")));
    }
    Ok(bytes)
}

/// Accumulate big-endian exponent bytes into an integer.
fn exponent_from_be_bytes(bytes: &[u8]) -> Result<u64, KeyResolutionError> {
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let significant = &bytes[first_nonzero..];
    if significant.len() > std::mem::size_of::<u64>() {
        return Err(KeyResolutionError::Parse(
            "exponent: wider than 64 bits".to_string(),
        ));
    }
    Ok(significant
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

/// Shared `kid -> ResolvedKey` map.
///
/// Cloning shares the underlying map, so one cache can back several
/// resolvers or be inspected from tests.
#[derive(Clone, Default)]
pub struct KeyCache {
    entries: Arc<RwLock<HashMap<String, Arc<ResolvedKey>>>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key, treating entries older than `ttl` as absent.
    pub async fn get(&self, kid: &str, ttl: Option<Duration>) -> Option<Arc<ResolvedKey>> {
        let entries = self.entries.read().await;
        entries.get(kid).filter(|key| key.is_fresh(ttl)).cloned()
    }

    /// Insert a key unless a fresh entry already exists; returns the entry
    /// that ends up in the cache.
    pub async fn insert(&self, key: ResolvedKey, ttl: Option<Duration>) -> Arc<ResolvedKey> {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.get(&key.kid) {
            if existing.is_fresh(ttl) {
                return Arc::clone(existing);
            }
        }
        let key = Arc::new(key);
        entries.insert(key.kid.clone(), Arc::clone(&key));
        key
    }

    pub async fn remove(&self, kid: &str) -> bool {
        self.entries.write().await.remove(kid).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct ProbeRecord {
    checked_at: Instant,
    published_keys: Option<usize>,
}

/// Resolves key IDs to verification keys, fetching the key set on a miss.
#[derive(Clone)]
pub struct KeyResolver {
    /// JWKS endpoint URL
    jwks_url: Arc<str>,
    /// HTTP client
    client: reqwest::Client,
    /// Resolved keys
    cache: KeyCache,
    /// Optional cache TTL; `None` keeps keys for the process lifetime
    cache_ttl: Option<Duration>,
    /// Last probe outcome, reused for `probe_interval`
    last_probe: Arc<Mutex<Option<ProbeRecord>>>,
    probe_interval: Duration,
}

impl KeyResolver {
    /// Create a resolver with its own HTTP client and an empty cache.
    pub fn new(jwks_url: impl Into<String>, fetch_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(fetch_timeout).build()?;
        Ok(Self::with_client(jwks_url, client))
    }

    pub fn with_client(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: Arc::from(jwks_url.into()),
            client,
            cache: KeyCache::new(),
            cache_ttl: None,
            last_probe: Arc::new(Mutex::new(None)),
            probe_interval: DEFAULT_PROBE_INTERVAL,
        }
    }

    /// Use an externally owned cache.
    pub fn with_cache(mut self, cache: KeyCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub fn cache(&self) -> &KeyCache {
        &self.cache
    }

    /// Resolve a key ID to a verification key.
    pub async fn resolve(&self, kid: &str) -> Result<Arc<ResolvedKey>, KeyResolutionError> {
        if let Some(key) = self.cache.get(kid, self.cache_ttl).await {
            tracing::debug!(kid, "key cache hit");
            return Ok(key);
        }

        // Run the fetch on its own task: if the caller is dropped the fetch
        // still completes and warms the cache.
        let resolver = self.clone();
        let kid = kid.to_string();
        tokio::spawn(async move { resolver.fetch_and_cache(&kid).await })
            .await
            .map_err(|err| KeyResolutionError::Fetch(format!("key fetch task failed: {err}")))?
    }

    async fn fetch_and_cache(&self, kid: &str) -> Result<Arc<ResolvedKey>, KeyResolutionError> {
        let key_set = self.fetch_key_set().await?;

        let entry = key_set
            .find(kid)
            .ok_or_else(|| KeyResolutionError::NotFound(kid.to_string()))?;

        let key = ResolvedKey::from_entry(kid, entry)?;
        let key = self.cache.insert(key, self.cache_ttl).await;
        tracing::info!(kid, "resolved signing key");
        Ok(key)
    }

    /// Fetch the key set from the endpoint.
    pub async fn fetch_key_set(&self) -> Result<KeySet, KeyResolutionError> {
        tracing::info!(url = %self.jwks_url, "fetching key set");

        let response = self
            .client
            .get(self.jwks_url.as_ref())
            .send()
            .await
            .map_err(|err| KeyResolutionError::Fetch(err.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(KeyResolutionError::Fetch(format!(
                "HTTP {} from key set endpoint",
                response.status()
            )));
        }

        response
            .json::<KeySet>()
            .await
            .map_err(|err| KeyResolutionError::Fetch(format!("malformed key set: {err}")))
    }

    /// Fetch the key set without touching the cache; returns its entry count.
    pub async fn probe(&self) -> Result<usize, KeyResolutionError> {
        Ok(self.fetch_key_set().await?.keys.len())
    }

    /// Published key count from a probe no older than the probe interval,
    /// or `None` when the endpoint failed. Concurrent callers wait on the
    /// same fetch.
    pub async fn recent_probe(&self) -> Option<usize> {
        let mut last = self.last_probe.lock().await;
        if let Some(record) = *last {
            if record.checked_at.elapsed() < self.probe_interval {
                return record.published_keys;
            }
        }

        let published_keys = match self.probe().await {
            Ok(count) => Some(count),
            Err(err) => {
                tracing::warn!(error = %err, url = %self.jwks_url, "key set probe failed");
                None
            }
        };
        *last = Some(ProbeRecord {
            checked_at: Instant::now(),
            published_keys,
        });
        published_keys
    }

    /// Drop one cached key so the next request for it refetches.
    pub async fn invalidate(&self, kid: &str) -> bool {
        self.cache.remove(kid).await
    }

    pub async fn clear(&self) {
        self.cache.clear().await;
    }

    pub async fn cached_key_count(&self) -> usize {
        self.cache.len().await
    }
}
