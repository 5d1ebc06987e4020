use crate::jobs::JobType;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;

/// Locations of the JSON dumps written by the external scrapers.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_tayara_dump")]
    pub tayara: String,
    #[serde(default = "default_automobiletn_dump")]
    pub automobiletn: String,
    #[serde(default = "default_brperf_dump")]
    pub brperf: String,
    #[serde(default = "default_shiftech_dump")]
    pub shiftech: String,
    /// Canonical makes seeded into the catalog.
    #[serde(default = "default_car_makes_dump")]
    pub car_makes: String,
    /// Canonical model trims seeded into the catalog.
    #[serde(default = "default_car_models_dump")]
    pub car_models: String,
    /// Listings served per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tayara: default_tayara_dump(),
            automobiletn: default_automobiletn_dump(),
            brperf: default_brperf_dump(),
            shiftech: default_shiftech_dump(),
            car_makes: default_car_makes_dump(),
            car_models: default_car_models_dump(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Review file for engine/model links.
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: String,
    #[serde(default)]
    pub feeds: FeedConfig,
    /// Last 0-based page index read, so a listing run reads at most
    /// `max_pages + 1` pages.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Listing ingestion stops after this many already stored posts.
    #[serde(default = "default_max_known_posts")]
    pub max_known_posts: usize,
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Pins the year used for mileage heuristics; the clock is used otherwise.
    #[serde(default)]
    pub current_year: Option<i32>,
    #[serde(default = "default_known_regions")]
    pub known_regions: Vec<String>,
    /// Makes imported from BR-Performance. Other makes come from Shiftech.
    #[serde(default = "default_brperf_makes")]
    pub brperf_makes: Vec<String>,
    /// Posts published more than this many days ago are cleaned up.
    #[serde(default = "default_post_retention_days")]
    pub post_retention_days: i64,
    #[serde(default = "default_jobs")]
    pub jobs: Vec<JobType>,
}

impl AppConfig {
    pub fn known_region_set(&self) -> HashSet<String> {
        self.known_regions.iter().cloned().collect()
    }

    pub fn brperf_make_set(&self) -> HashSet<String> {
        self.brperf_makes.iter().cloned().collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            audit_log_path: default_audit_log_path(),
            feeds: FeedConfig::default(),
            max_pages: default_max_pages(),
            max_known_posts: default_max_known_posts(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            current_year: None,
            known_regions: default_known_regions(),
            brperf_makes: default_brperf_makes(),
            post_retention_days: default_post_retention_days(),
            jobs: default_jobs(),
        }
    }
}

fn default_db_path() -> String {
    "data.db".to_string()
}

fn default_audit_log_path() -> String {
    "matching.json".to_string()
}

fn default_tayara_dump() -> String {
    "dumps/tayara.json".to_string()
}

fn default_automobiletn_dump() -> String {
    "dumps/automobiletn.json".to_string()
}

fn default_brperf_dump() -> String {
    "dumps/brperf.json".to_string()
}

fn default_shiftech_dump() -> String {
    "dumps/shiftech.json".to_string()
}

fn default_car_makes_dump() -> String {
    "dumps/car_makes.json".to_string()
}

fn default_car_models_dump() -> String {
    "dumps/car_models.json".to_string()
}

fn default_page_size() -> usize {
    30
}

fn default_max_pages() -> usize {
    5
}

fn default_max_known_posts() -> usize {
    3
}

fn default_min_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    3_000
}

fn default_known_regions() -> Vec<String> {
    [
        "ariana", "beja", "ben-arous", "bizerte", "gabes", "gafsa", "jendouba", "kairouan", "kasserine", "kebili",
        "kef", "le-kef", "mahdia", "manouba", "la-manouba", "medenine", "monastir", "nabeul", "sfax", "sidi-bouzid",
        "siliana", "sousse", "tataouine", "tozeur", "tunis", "zaghouan",
    ]
    .iter()
    .map(|r| r.to_string())
    .collect()
}

fn default_brperf_makes() -> Vec<String> {
    ["byd", "geely", "jac", "mg", "mahindra", "tata", "tesla"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_post_retention_days() -> i64 {
    6
}

fn default_jobs() -> Vec<JobType> {
    JobType::ALL.to_vec()
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
