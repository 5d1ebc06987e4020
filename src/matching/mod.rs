// Catalog matching: similarity, tolerances, engine resolution, model linking and repost detection.

pub mod dedup;
pub mod interval;
pub mod reconciler;
pub mod resolver;
pub mod similarity;

pub use dedup::find_duplicate;
pub use reconciler::{AuditLog, ReconcileStats, reconcile_all};
pub use resolver::{VehicleQuery, resolve_engine};
pub use similarity::{overlaps, trigram_similarity};
