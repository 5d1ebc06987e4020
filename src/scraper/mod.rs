pub mod dump;
pub mod traits;

pub use dump::JsonDumpFeed;
pub use traits::ScrapeFeed;
