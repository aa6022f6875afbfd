//! Aggregate statistics service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use storyvault_common::AppResult;
use storyvault_db::repositories::StoryRepository;
use tokio::sync::RwLock;

/// How long a computed snapshot stays fresh.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Aggregate statistics over the story corpus.
///
/// Stale by up to the cache TTL; counts are informational, not
/// transactional.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Stories ever created, expired included.
    pub total: u64,
    /// Active public stories right now.
    pub available: u64,
    /// Active public stories expiring within a day.
    pub expiring_today: u64,
    /// Active public stories expiring within an hour.
    pub expiring_hour: u64,
}

/// Stats service with a short-lived in-process cache.
#[derive(Clone)]
pub struct StatsService {
    story_repo: StoryRepository,
    cache: Arc<RwLock<Option<(Instant, Stats)>>>,
}

impl StatsService {
    /// Create a new stats service.
    #[must_use]
    pub fn new(story_repo: StoryRepository) -> Self {
        Self {
            story_repo,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the current stats snapshot, recomputing if the cache is stale.
    pub async fn get(&self, now: DateTime<Utc>) -> AppResult<Stats> {
        if let Some((computed_at, stats)) = *self.cache.read().await {
            if computed_at.elapsed() < CACHE_TTL {
                return Ok(stats);
            }
        }

        let stats = self.compute(now).await?;
        tracing::debug!(?stats, "Recomputed stats snapshot");
        *self.cache.write().await = Some((Instant::now(), stats));
        Ok(stats)
    }

    /// Run the four count queries against the live predicate.
    async fn compute(&self, now: DateTime<Utc>) -> AppResult<Stats> {
        let total = self.story_repo.count_all().await?;
        let available = self.story_repo.count_public(now).await?;
        let expiring_today = self
            .story_repo
            .count_expiring_within(now, now + chrono::Duration::days(1))
            .await?;
        let expiring_hour = self
            .story_repo
            .count_expiring_within(now, now + chrono::Duration::hours(1))
            .await?;

        Ok(Stats {
            total,
            available,
            expiring_today,
            expiring_hour,
        })
    }
}
