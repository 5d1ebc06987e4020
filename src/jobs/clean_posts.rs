use crate::jobs::RunStats;
use crate::model::JobError;
use crate::storage::{PostStore, SqliteStorage};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::info;

/// Drops posts published more than `retention_days` before `now`.
pub async fn clean_posts(
    storage: &Mutex<SqliteStorage>,
    retention_days: i64,
    now: DateTime<Utc>,
    stats: &mut RunStats,
) -> Result<(), JobError> {
    let cutoff = Duration::try_days(retention_days)
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let deleted = storage.lock().await.delete_posts_before(cutoff)?;
    stats.deleted_posts = deleted;
    info!("🧹 Deleted {} posts published before {}", deleted, cutoff);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobType;
    use crate::matching::dedup::tests::post;

    #[tokio::test]
    async fn removes_posts_past_retention() {
        let now = Utc::now();
        let storage = SqliteStorage::new(":memory:").unwrap();
        for (id, age_days) in [("TAYARA-1", 10), ("TAYARA-2", 7), ("TAYARA-3", 5), ("TAYARA-4", 0)] {
            let mut stored = post(id, id, "m");
            stored.published_at = now - Duration::days(age_days);
            storage.upsert_post(&stored).unwrap();
        }
        let storage = Mutex::new(storage);
        let mut stats = RunStats::new(JobType::CleanCarPosts);

        clean_posts(&storage, 6, now, &mut stats).await.unwrap();

        assert_eq!(stats.deleted_posts, 2);
        let guard = storage.lock().await;
        assert_eq!(guard.count_posts().unwrap(), 2);
        assert!(!guard.post_exists("TAYARA-2").unwrap());
        assert!(guard.post_exists("TAYARA-3").unwrap());
    }

    #[tokio::test]
    async fn absurd_retention_keeps_everything() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        storage.upsert_post(&post("TAYARA-1", "GOLF", "m")).unwrap();
        let storage = Mutex::new(storage);
        let mut stats = RunStats::new(JobType::CleanCarPosts);

        clean_posts(&storage, i64::MAX, Utc::now(), &mut stats).await.unwrap();

        assert_eq!(stats.deleted_posts, 0);
        assert_eq!(storage.lock().await.count_posts().unwrap(), 1);
    }
}
