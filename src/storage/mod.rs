pub mod sqlite;

pub use sqlite::SqliteStorage;

use crate::model::{
    CanonicalEngine, CanonicalModelTrim, ClassifiedPost, EngineModelAssociation, Fuel, Merchant, StorageError,
};
use chrono::{DateTime, Utc};

/// Coarse engine lookup used by the resolver.
pub trait EngineCatalog {
    /// Engines whose make is close to `make_id`, whose fuel label is close to
    /// `fuel` and whose model overlaps `model` textually.
    fn engine_candidates(&self, make_id: &str, model: &str, fuel: Fuel) -> Result<Vec<CanonicalEngine>, StorageError>;
}

/// Model trims and the engine/model link table, used by the reconciler.
pub trait ModelCatalog {
    fn model_candidates(&self, engine: &CanonicalEngine) -> Result<Vec<CanonicalModelTrim>, StorageError>;

    /// Inserts the link unless it exists. Returns true when a row was written.
    fn link_engine_model(&self, link: &EngineModelAssociation) -> Result<bool, StorageError>;
}

/// Classified post persistence.
pub trait PostStore {
    fn post_exists(&self, id: &str) -> Result<bool, StorageError>;

    /// Existing post sharing the merchant and either the title or the
    /// (km, price, cv, year) tuple.
    fn find_duplicate(&self, post: &ClassifiedPost) -> Result<Option<ClassifiedPost>, StorageError>;

    fn upsert_post(&self, post: &ClassifiedPost) -> Result<(), StorageError>;

    fn upsert_merchant(&self, merchant: &Merchant) -> Result<(), StorageError>;

    /// Removes posts published strictly before `cutoff`. Returns how many went.
    fn delete_posts_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError>;
}
