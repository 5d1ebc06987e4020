pub mod config;
pub mod jobs;
pub mod mapper;
pub mod matching;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod scraper;
pub mod storage;
pub mod utils;
