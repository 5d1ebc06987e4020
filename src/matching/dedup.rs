//! Decides whether a normalized post is a repost of one already stored.

use crate::model::{ClassifiedPost, StorageError};
use crate::storage::PostStore;

/// Id of the stored post this one duplicates, if any.
///
/// A repost shares the merchant and either the title or the whole
/// (km, price, cv, year) tuple with a stored post. Absent values compare
/// equal to each other. The post's own id never matches.
pub fn find_duplicate<S: PostStore + ?Sized>(store: &S, post: &ClassifiedPost) -> Result<Option<String>, StorageError> {
    Ok(store.find_duplicate(post)?.map(|existing| existing.id))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{Equipment, PostSource};
    use crate::storage::SqliteStorage;
    use chrono::{TimeZone, Utc};

    pub(crate) fn post(id: &str, title: &str, merchant: &str) -> ClassifiedPost {
        ClassifiedPost {
            id: id.to_string(),
            source: PostSource::Tayara,
            id_source: id.to_string(),
            url_source: format!("https://www.tayara.tn/item/{}", id),
            merchant_id: merchant.to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            title: Some(title.to_string()),
            description: None,
            images: vec![],
            price: Some(45_000),
            make: Some("Volkswagen".to_string()),
            model: Some("Golf".to_string()),
            body: None,
            variant: None,
            engine_type: None,
            year: Some(2015),
            km: Some(120_000),
            fuel: None,
            cv: Some(9),
            hp: None,
            engine: None,
            cylinder: None,
            color: None,
            interior_type: None,
            interior_color: None,
            gearbox: None,
            transmission: None,
            equipment: Equipment::default(),
            options: vec![],
            region_id: "tunis".to_string(),
            region_detail: None,
            phone_numbers: vec![],
            car_engine_id: None,
        }
    }

    fn stored(posts: &[ClassifiedPost]) -> SqliteStorage {
        let storage = SqliteStorage::new(":memory:").unwrap();
        for post in posts {
            storage.upsert_post(post).unwrap();
        }
        storage
    }

    #[test]
    fn same_listing_with_different_title() {
        let storage = stored(&[post("TAYARA-1", "GOLF 7 TSI", "garage-ali")]);
        let repost = post("TAYARA-2", "VW GOLF 7 FULL OPTIONS", "garage-ali");
        assert_eq!(find_duplicate(&storage, &repost).unwrap().as_deref(), Some("TAYARA-1"));
    }

    #[test]
    fn same_title_same_merchant() {
        let storage = stored(&[post("TAYARA-1", "GOLF 7 TSI", "garage-ali")]);
        let mut repost = post("TAYARA-2", "GOLF 7 TSI", "garage-ali");
        repost.price = Some(43_000);
        repost.km = Some(118_000);
        assert_eq!(find_duplicate(&storage, &repost).unwrap().as_deref(), Some("TAYARA-1"));
    }

    #[test]
    fn different_merchant_or_listing_is_new() {
        let storage = stored(&[post("TAYARA-1", "GOLF 7 TSI", "garage-ali")]);
        let other_merchant = post("TAYARA-2", "GOLF 7 TSI", "garage-sami");
        assert_eq!(find_duplicate(&storage, &other_merchant).unwrap(), None);

        let mut other_listing = post("TAYARA-3", "GOLF 7", "garage-ali");
        other_listing.km = Some(80_000);
        assert_eq!(find_duplicate(&storage, &other_listing).unwrap(), None);
    }

    #[test]
    fn absent_values_compare_equal() {
        let mut first = post("TAYARA-1", "A", "m");
        first.cv = None;
        let storage = stored(&[first]);

        let mut candidate = post("TAYARA-2", "B", "m");
        candidate.cv = None;
        assert!(find_duplicate(&storage, &candidate).unwrap().is_some());
        candidate.cv = Some(7);
        assert!(find_duplicate(&storage, &candidate).unwrap().is_none());
    }

    #[test]
    fn missing_titles_match_each_other() {
        let mut first = post("TAYARA-1", "", "m");
        first.title = None;
        first.km = Some(10_000);
        let storage = stored(&[first]);

        let mut candidate = post("TAYARA-2", "", "m");
        candidate.title = None;
        assert_eq!(find_duplicate(&storage, &candidate).unwrap().as_deref(), Some("TAYARA-1"));

        candidate.title = Some("GOLF".to_string());
        assert_eq!(find_duplicate(&storage, &candidate).unwrap(), None);
    }

    #[test]
    fn own_id_is_not_a_duplicate() {
        let first = post("TAYARA-1", "GOLF 7 TSI", "garage-ali");
        let storage = stored(std::slice::from_ref(&first));
        assert_eq!(find_duplicate(&storage, &first).unwrap(), None);
    }

    #[test]
    fn oldest_match_wins() {
        let older = post("TAYARA-1", "GOLF 7 TSI", "garage-ali");
        let mut newer = post("TAYARA-2", "GOLF 7 TSI", "garage-ali");
        newer.published_at = older.published_at + chrono::Duration::days(1);
        let storage = stored(&[newer, older]);
        let repost = post("TAYARA-3", "GOLF 7 TSI", "garage-ali");
        assert_eq!(find_duplicate(&storage, &repost).unwrap().as_deref(), Some("TAYARA-1"));
    }
}
