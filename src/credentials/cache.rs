//! Process-wide credential cache.
//!
//! Tokens are cached per [`CredentialRequest::cache_key`] for at most
//! [`CacheConfig::max_age`], or less when the token endpoint reports an
//! earlier expiry. Each key has its own async mutex, so overlapping runs that
//! miss on the same key issue a single token request and share its result.
//! The number of keys is bounded; the least recently used key is evicted.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::{Credential, CredentialError, CredentialProvider, CredentialRequest};

/// A freshly issued token and its reported lifetime.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub credential: Credential,
    /// Lifetime reported by the token endpoint (`expires_in`), if any.
    pub expires_in: Option<Duration>,
}

/// Obtains tokens from an authority. Called only on cache miss.
pub trait TokenLoader: Send + Sync {
    fn load(
        &self,
        request: &CredentialRequest,
    ) -> impl Future<Output = Result<IssuedToken, CredentialError>> + Send;
}

/// Cache tuning.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Upper bound on how long a token is reused.
    pub max_age: Duration,

    /// Maximum number of distinct keys kept.
    pub max_entries: usize,

    /// Subtracted from a reported `expires_in` so a token is never used in
    /// its final moments.
    pub expiry_margin: Duration,
}

impl CacheConfig {
    /// One hour, 100 keys, one minute margin.
    pub const DEFAULT: Self = Self {
        max_age: Duration::from_secs(60 * 60),
        max_entries: 100,
        expiry_margin: Duration::from_secs(60),
    };

    /// Effective time-to-live for a token.
    pub fn ttl_for(&self, issued: &IssuedToken) -> Duration {
        match issued.expires_in {
            Some(lifetime) => self.max_age.min(lifetime.saturating_sub(self.expiry_margin)),
            None => self.max_age,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

struct CachedToken {
    credential: Credential,
    /// `None` when the TTL reaches past the last representable instant.
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

type SlotCell = Arc<tokio::sync::Mutex<Option<CachedToken>>>;

struct Slot {
    last_used: Instant,
    cell: SlotCell,
}

/// A [`CredentialProvider`] that caches tokens from a [`TokenLoader`].
pub struct CachedCredentialProvider<L> {
    loader: L,
    config: CacheConfig,
    slots: Mutex<HashMap<String, Slot>>,
}

impl<L: TokenLoader> CachedCredentialProvider<L> {
    pub fn new(loader: L, config: CacheConfig) -> Self {
        CachedCredentialProvider {
            loader,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cell for `key`, creating it and evicting the least
    /// recently used key if the cache is full.
    fn slot(&self, key: &str) -> SlotCell {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        if let Some(slot) = slots.get_mut(key) {
            slot.last_used = now;
            return slot.cell.clone();
        }

        if slots.len() >= self.config.max_entries.max(1) {
            let oldest = slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!(key = %oldest, "Evicting least recently used credential");
                slots.remove(&oldest);
            }
        }

        let cell = SlotCell::default();
        slots.insert(
            key.to_string(),
            Slot {
                last_used: now,
                cell: cell.clone(),
            },
        );
        cell
    }
}

impl<L: TokenLoader> CredentialProvider for CachedCredentialProvider<L> {
    fn get(
        &self,
        request: &CredentialRequest,
    ) -> impl Future<Output = Result<Credential, CredentialError>> + Send {
        async move {
            let key = request.cache_key();
            let cell = self.slot(&key);

            // Held across the load, so concurrent misses on this key wait here.
            let mut entry = cell.lock().await;

            if let Some(cached) = entry.as_ref()
                && cached.is_fresh(Instant::now())
            {
                debug!(token_url = %request.token_url, "Credential cache hit");
                return Ok(cached.credential.clone());
            }

            debug!(token_url = %request.token_url, "Credential cache miss, requesting token");
            let issued = self.loader.load(request).await?;
            let ttl = self.config.ttl_for(&issued);

            *entry = Some(CachedToken {
                credential: issued.credential.clone(),
                expires_at: Instant::now().checked_add(ttl),
            });

            Ok(issued.credential)
        }
    }
}
