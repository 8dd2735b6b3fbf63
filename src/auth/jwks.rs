use jsonwebtoken::{jwk::JwkSet, DecodingKey};
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum spacing of refetches triggered by unknown key ids.
const FORCED_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
const NEVER: u64 = u64::MAX;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("failed to fetch signing keys: {0}")]
    Fetch(String),

    #[error("no signing key with kid {0}")]
    UnknownKid(String),

    #[error("unusable signing key: {0}")]
    Unusable(String),
}

/// Signing keys of the identity provider. The key set is cached for an hour and
/// refetched early when a token names a key id the cached set does not know, at most once
/// per [`FORCED_REFRESH_INTERVAL`].
pub struct JwksCache {
    keys: Cache<(), Arc<JwkSet>>,
    jwks_url: String,
    started: Instant,
    last_forced_ms: AtomicU64,
    forced_refresh_interval: Duration,
}

impl JwksCache {
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            keys: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(3600))
                .build(),
            jwks_url: jwks_url.into(),
            started: Instant::now(),
            last_forced_ms: AtomicU64::new(NEVER),
            forced_refresh_interval: FORCED_REFRESH_INTERVAL,
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Claims the forced-refresh slot. Only one caller per interval wins.
    fn may_force_refresh(&self) -> bool {
        let now = self.started.elapsed().as_millis() as u64;
        let last = self.last_forced_ms.load(Ordering::Acquire);
        let interval = self.forced_refresh_interval.as_millis() as u64;
        if last != NEVER && now.saturating_sub(last) < interval {
            return false;
        }
        self.last_forced_ms
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    async fn key_set(&self) -> Result<Arc<JwkSet>, KeyError> {
        // Concurrent misses share one fetch
        self.keys
            .try_get_with((), self.fetch())
            .await
            .map_err(|e| KeyError::Fetch(e.to_string()))
    }

    async fn fetch(&self) -> Result<Arc<JwkSet>, reqwest::Error> {
        tracing::debug!(jwks_url = %self.jwks_url, "Fetching signing keys");
        let jwks = reqwest::get(&self.jwks_url)
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        Ok(Arc::new(jwks))
    }

    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, KeyError> {
        let mut jwks = self.key_set().await?;
        if jwks.find(kid).is_none() && self.may_force_refresh() {
            tracing::info!(kid, "Unknown key id, refreshing signing keys");
            self.keys.invalidate(&()).await;
            jwks = self.key_set().await?;
        }

        let jwk = jwks
            .find(kid)
            .ok_or_else(|| KeyError::UnknownKid(kid.to_string()))?;
        DecodingKey::from_jwk(jwk).map_err(|e| KeyError::Unusable(e.to_string()))
    }
}
