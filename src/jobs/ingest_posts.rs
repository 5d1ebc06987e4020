use crate::config::AppConfig;
use crate::jobs::RunStats;
use crate::matching::{VehicleQuery, find_duplicate, resolve_engine};
use crate::model::{JobError, StorageError};
use crate::parser::{Listing, ParseContext, ParsedPost, PostOutcome, SkipReason};
use crate::scraper::ScrapeFeed;
use crate::storage::{EngineCatalog, PostStore, SqliteStorage};
use crate::utils::{current_year, random_delay};
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Where a parsed listing ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted { car_engine_id: Option<String> },
    Duplicate { existing_id: String },
}

/// Upserts the merchant, resolves the engine and stores the post unless it is a repost.
pub fn store_listing<S>(store: &S, parsed: ParsedPost) -> Result<StoreOutcome, StorageError>
where
    S: PostStore + EngineCatalog,
{
    let ParsedPost { mut post, merchant } = parsed;
    // Reposts still carry the merchant's latest contact details
    store.upsert_merchant(&merchant)?;
    post.car_engine_id = resolve_engine(store, &VehicleQuery::from(&post))?;

    if let Some(existing_id) = find_duplicate(store, &post)? {
        debug!(post_id = %post.id, %existing_id, "duplicate listing");
        return Ok(StoreOutcome::Duplicate { existing_id });
    }

    store.upsert_post(&post)?;
    Ok(StoreOutcome::Inserted { car_engine_id: post.car_engine_id })
}

/// Pages through a listing feed until it runs dry, page `max_pages` has been
/// read or `max_known_posts` already stored listings have been seen.
pub async fn ingest_posts<L, F>(
    feed: &F,
    storage: &Mutex<SqliteStorage>,
    config: &AppConfig,
    stats: &mut RunStats,
) -> Result<(), JobError>
where
    L: Listing,
    F: ScrapeFeed<L> + ?Sized,
{
    let known_regions = config.known_region_set();
    let ctx = ParseContext {
        known_regions: &known_regions,
        current_year: current_year(config.current_year),
        now: Utc::now(),
    };

    let mut page = 0;
    while page <= config.max_pages && stats.known_posts < config.max_known_posts {
        debug!("{} page {}", L::SOURCE.key(), page);
        let listings = match feed.fetch_page(page).await {
            Ok(listings) => listings,
            Err(e) => {
                warn!("Page {} of {} failed: {}", page, L::SOURCE, e);
                stats.errors += 1;
                page += 1;
                continue;
            }
        };
        if listings.is_empty() {
            break;
        }
        stats.pages += 1;

        for listing in &listings {
            if stats.known_posts >= config.max_known_posts {
                break;
            }
            let storage = storage.lock().await;
            if let Err(e) = ingest_listing(&*storage, listing, &ctx, stats) {
                warn!(post = %listing.post_id(), "Listing failed: {}", e);
                stats.errors += 1;
            }
        }

        page += 1;
        if page <= config.max_pages && stats.known_posts < config.max_known_posts {
            sleep(random_delay(config.min_delay_ms, config.max_delay_ms)).await;
        }
    }

    info!(
        source = %L::SOURCE,
        pages = stats.pages,
        new_posts = stats.new_posts,
        known_posts = stats.known_posts,
        skipped_posts = stats.skipped_posts,
        duplicates = stats.duplicate_posts,
        "Listings ingested"
    );
    if !stats.skipped_regions.is_empty() {
        warn!("Unknown regions: {:?}", stats.skipped_regions);
    }
    Ok(())
}

fn ingest_listing<L: Listing>(
    storage: &SqliteStorage,
    listing: &L,
    ctx: &ParseContext<'_>,
    stats: &mut RunStats,
) -> Result<(), JobError> {
    let post_id = listing.post_id();
    if storage.post_exists(&post_id)? {
        debug!(%post_id, "known post");
        stats.known_posts += 1;
        return Ok(());
    }

    match listing.parse(ctx)? {
        PostOutcome::Skipped(SkipReason::UnknownRegion(region)) => {
            stats.skipped_regions.insert(region);
        }
        PostOutcome::Skipped(reason) => {
            debug!(%post_id, ?reason, "listing skipped");
            stats.skipped_posts += 1;
        }
        PostOutcome::Parsed(parsed) => match store_listing(storage, *parsed)? {
            StoreOutcome::Inserted { car_engine_id } => {
                stats.new_posts += 1;
                if car_engine_id.is_some() {
                    stats.resolved_engines += 1;
                }
            }
            StoreOutcome::Duplicate { .. } => stats.duplicate_posts += 1,
        },
    }
    Ok(())
}
