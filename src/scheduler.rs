use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info};

use crate::cache::InMemoryCache;

/// Start the periodic sweep of expired cache entries.
///
/// `schedule` is a six-field cron expression (seconds first).
pub async fn start_cache_sweeper(cache: Arc<InMemoryCache>, schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let cache = Arc::clone(&cache);

        Box::pin(async move {
            let removed = sweep(&cache).await;
            if removed > 0 {
                info!("Swept {} expired cache entries", removed);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("✓ Cache sweeper scheduled ({})", schedule);

    Ok(scheduler)
}

/// Remove expired entries now, returning how many were dropped.
pub async fn sweep(cache: &InMemoryCache) -> usize {
    let removed = cache.cleanup_expired().await;
    debug!("Cache sweep removed {} entries, {} remain", removed, cache.len().await);
    removed
}
