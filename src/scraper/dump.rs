use crate::model::FeedError;
use crate::scraper::traits::ScrapeFeed;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::debug;

/// Reads a JSON array written by an external scraper and serves it in pages.
///
/// The file is read once, on the first successful fetch; later pages come
/// from memory.
pub struct JsonDumpFeed<T> {
    path: PathBuf,
    page_size: usize,
    records: OnceCell<Vec<T>>,
}

impl<T> JsonDumpFeed<T> {
    pub fn new(path: impl Into<PathBuf>, page_size: usize) -> Self {
        Self {
            path: path.into(),
            page_size: page_size.max(1),
            records: OnceCell::new(),
        }
    }
}

impl<T: DeserializeOwned> JsonDumpFeed<T> {
    async fn read(&self) -> Result<Vec<T>, FeedError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let records: Vec<T> = serde_json::from_str(&content)?;
        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    async fn records(&self) -> Result<&[T], FeedError> {
        let records = self.records.get_or_try_init(|| self.read()).await?;
        Ok(records.as_slice())
    }
}

#[async_trait::async_trait]
impl<T> ScrapeFeed<T> for JsonDumpFeed<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn fetch_page(&self, page: usize) -> Result<Vec<T>, FeedError> {
        let records = self.records().await?;
        Ok(records.iter().skip(page * self.page_size).take(self.page_size).cloned().collect())
    }

    async fn fetch_all(&self) -> Result<Vec<T>, FeedError> {
        Ok(self.records().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    fn dump(ids: &[u32]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let rows: Vec<String> = ids.iter().map(|id| format!("{{\"id\":{}}}", id)).collect();
        write!(file, "[{}]", rows.join(",")).unwrap();
        file
    }

    #[tokio::test]
    async fn pages_through_the_dump() {
        let file = dump(&[1, 2, 3, 4, 5]);
        let feed: JsonDumpFeed<Row> = JsonDumpFeed::new(file.path(), 2);

        assert_eq!(feed.fetch_page(0).await.unwrap(), vec![Row { id: 1 }, Row { id: 2 }]);
        assert_eq!(feed.fetch_page(2).await.unwrap(), vec![Row { id: 5 }]);
        assert!(feed.fetch_page(3).await.unwrap().is_empty());
        assert_eq!(feed.fetch_all().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn dump_is_read_once() {
        let file = dump(&[1, 2, 3]);
        let feed: JsonDumpFeed<Row> = JsonDumpFeed::new(file.path(), 2);
        assert_eq!(feed.fetch_page(0).await.unwrap(), vec![Row { id: 1 }, Row { id: 2 }]);

        std::fs::write(file.path(), "{not json").unwrap();
        assert_eq!(feed.fetch_page(1).await.unwrap(), vec![Row { id: 3 }]);
        assert_eq!(feed.fetch_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failed_read_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.json");
        let feed: JsonDumpFeed<Row> = JsonDumpFeed::new(&path, 10);
        assert!(feed.fetch_all().await.is_err());

        std::fs::write(&path, r#"[{"id":7}]"#).unwrap();
        assert_eq!(feed.fetch_all().await.unwrap(), vec![Row { id: 7 }]);
    }

    #[tokio::test]
    async fn missing_or_broken_dump_is_an_error() {
        let feed: JsonDumpFeed<Row> = JsonDumpFeed::new("/nonexistent/dump.json", 10);
        assert!(matches!(feed.fetch_page(0).await, Err(FeedError::Io(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let feed: JsonDumpFeed<Row> = JsonDumpFeed::new(file.path(), 10);
        assert!(matches!(feed.fetch_all().await, Err(FeedError::Json(_))));
    }
}
