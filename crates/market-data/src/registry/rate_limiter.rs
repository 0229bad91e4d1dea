//! Minimum-spacing rate limiter for market data providers.
//!
//! Each provider gets a slot holding the instant of its last call. A caller
//! locks the provider's slot, sleeps until `last_call + min_interval`, records
//! the new call instant and releases the slot. Holding the async lock across
//! the sleep serializes concurrent callers for the same provider.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

use crate::models::ProviderId;

/// Spacing applied to providers that were never configured.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Per-provider pacing state.
#[derive(Debug)]
struct ProviderSlot {
    min_interval: Duration,
    last_call: AsyncMutex<Option<Instant>>,
}

impl ProviderSlot {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: AsyncMutex::new(None),
        }
    }
}

/// Rate limiter for multiple providers.
pub struct RateLimiter {
    slots: Mutex<HashMap<String, Arc<ProviderSlot>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the slots mutex, recovering from poison if necessary.
    ///
    /// The worst case after recovery is slightly incorrect pacing, which is
    /// better than panicking.
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Arc<ProviderSlot>>> {
        self.slots.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter slots mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn slot(&self, provider: &ProviderId) -> Arc<ProviderSlot> {
        let mut slots = self.lock_slots();
        slots
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(ProviderSlot::new(DEFAULT_MIN_INTERVAL)))
            .clone()
    }

    /// Set the minimum spacing for a provider. Replaces any previous state.
    pub fn configure(&self, provider: &ProviderId, min_interval: Duration) {
        let mut slots = self.lock_slots();
        slots.insert(
            provider.to_string(),
            Arc::new(ProviderSlot::new(min_interval)),
        );
    }

    /// Configured spacing for a provider.
    pub fn min_interval(&self, provider: &ProviderId) -> Duration {
        self.slot(provider).min_interval
    }

    /// Wait for the provider's turn and record the call.
    ///
    /// Returns once at least `min_interval` has passed since the previous
    /// call attributed to `provider`.
    pub async fn acquire(&self, provider: &ProviderId) {
        let slot = self.slot(provider);
        let mut last_call = slot.last_call.lock().await;

        if let Some(last) = *last_call {
            let ready_at = last + slot.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(
                    "Rate limiter: waiting {:?} for provider '{}'",
                    ready_at - now,
                    provider
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_call = Some(Instant::now());
        debug!("Rate limiter: granted call for '{}'", provider);
    }

    /// Forget the last call instant for a provider.
    pub async fn reset(&self, provider: &ProviderId) {
        let slot = self.slot(provider);
        *slot.last_call.lock().await = None;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
