use crate::model::FeedError;

/// Paged source of raw scraped records.
#[async_trait::async_trait]
pub trait ScrapeFeed<T>: Send + Sync {
    /// Records of page `page` (0-based). An empty page means the feed is exhausted.
    async fn fetch_page(&self, page: usize) -> Result<Vec<T>, FeedError>;

    /// Every record, in order.
    async fn fetch_all(&self) -> Result<Vec<T>, FeedError>;
}
