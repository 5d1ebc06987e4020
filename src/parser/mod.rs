pub mod catalog_parser;
pub mod engine_parser;
pub mod keys;
pub mod post_parser;

pub use catalog_parser::{ModelSkip, SeedMake, SeedModel, parse_make, parse_model};
pub use engine_parser::{EngineSkip, TypeYears, parse_engine_record, parse_type_years};
pub use post_parser::{
    AutomobiletnListing, Listing, ParseContext, ParsedPost, PostOutcome, SkipReason, TayaraListing,
};
