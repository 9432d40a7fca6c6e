use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Invalidation counter shared by the field and response caches.
///
/// A reader takes a token before it loads from the store and may only fill
/// the cache while the counter still matches that token. Invalidations advance
/// the counter and delete their keys under the write lock, so a fill built
/// from data loaded before a write can never land after that write's
/// invalidation.
#[derive(Debug, Default)]
pub struct CacheEpoch {
    current: RwLock<u64>,
}

/// Counter value observed before a store read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochToken(u64);

impl CacheEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn token(&self) -> EpochToken {
        EpochToken(*self.current.read().await)
    }

    /// Shared guard for a cache fill, or `None` when an invalidation ran after
    /// `token` was taken. Hold the guard until the write has finished.
    pub(crate) async fn fill_guard(&self, token: EpochToken) -> Option<RwLockReadGuard<'_, u64>> {
        let current = self.current.read().await;
        if *current != token.0 {
            debug!("Skipping cache fill, invalidated since epoch {}", token.0);
            return None;
        }
        Some(current)
    }

    /// Advance the counter. Pending fills wait until the returned guard is
    /// dropped, so hold it while deleting keys.
    pub(crate) async fn advance(&self) -> RwLockWriteGuard<'_, u64> {
        let mut current = self.current.write().await;
        *current += 1;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fill_allowed_until_advanced() {
        let epoch = CacheEpoch::new();
        let token = epoch.token().await;

        assert!(epoch.fill_guard(token).await.is_some());

        drop(epoch.advance().await);
        assert!(epoch.fill_guard(token).await.is_none());
        assert!(epoch.fill_guard(epoch.token().await).await.is_some());
    }
}
