//! One check-and-notify pass.

use crate::cache::AddressCache;
use crate::error::Result;
use crate::fetcher::AddressSource;
use crate::notifier::Notifier;

/// How a check ended.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Current address matches the cache.
    Unchanged {
        address: String,
        /// Only set when a notification was forced.
        notification: Option<Result<()>>,
    },
    /// Address differs from the cache (or there was no cache).
    Changed {
        previous: Option<String>,
        current: String,
        cache_written: bool,
        notification: Result<()>,
    },
}

impl CheckOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, CheckOutcome::Changed { .. })
    }
}

/// Snapshot of current vs cached address, without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub current: String,
    pub cached: Option<String>,
}

impl Status {
    pub fn changed(&self) -> bool {
        self.cached.as_deref() != Some(self.current.as_str())
    }
}

/// Display form of a cached value; a missing cache reads as "none".
pub fn display_cached(cached: Option<&str>) -> &str {
    cached.unwrap_or("none")
}

/// Fetch the current address and read the cache. Fails on network or
/// cache read errors; nothing is written.
pub async fn status(source: &dyn AddressSource, cache: &AddressCache) -> Result<Status> {
    let current = source.fetch_current_address().await?;
    tracing::info!("Current external IP: {}", current);

    let cached = cache.read().await?;
    tracing::info!("Cached IP: {}", display_cached(cached.as_deref()));

    Ok(Status { current, cached })
}

/// Drives the fetch, compare, record and notify steps.
pub struct Checker<'a> {
    source: &'a dyn AddressSource,
    cache: &'a AddressCache,
    notifier: &'a dyn Notifier,
}

impl<'a> Checker<'a> {
    pub fn new(
        source: &'a dyn AddressSource,
        cache: &'a AddressCache,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            source,
            cache,
            notifier,
        }
    }

    pub async fn status(&self) -> Result<Status> {
        status(self.source, self.cache).await
    }

    /// Run a full check. With `force`, a notification is sent even when the
    /// address is unchanged.
    ///
    /// Only fetch and cache-read failures are returned as errors. Cache
    /// write and mail failures are logged and recorded in the outcome.
    pub async fn run(&self, force: bool) -> Result<CheckOutcome> {
        let Status { current, cached } = self.status().await?;

        if cached.as_deref() == Some(current.as_str()) {
            tracing::info!("IP unchanged");
            let notification = if force {
                tracing::info!("Sending notification anyway (forced)");
                Some(self.send(&current).await)
            } else {
                None
            };
            return Ok(CheckOutcome::Unchanged {
                address: current,
                notification,
            });
        }

        tracing::info!(
            "IP changed: {} -> {}",
            display_cached(cached.as_deref()),
            current
        );

        let cache_written = match self.cache.write(&current).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed updating cache: {}", e);
                false
            }
        };

        let notification = self.send(&current).await;

        Ok(CheckOutcome::Changed {
            previous: cached,
            current,
            cache_written,
            notification,
        })
    }

    async fn send(&self, address: &str) -> Result<()> {
        let result = self.notifier.notify(address).await;
        match &result {
            Ok(()) => tracing::info!("Mail sent"),
            Err(e) => tracing::error!("Failed sending email: {}", e),
        }
        result
    }
}
