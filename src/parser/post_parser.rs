//! Listing dumps from the classified sites, normalized into posts and merchants.

use crate::mapper::{
    clean_options, detect_equipment, hp_from_variant, is_post_ignored, map_body, map_color, map_fiscal_hp, map_fuel,
    map_gearbox, map_interior_type, map_km, map_make, map_phone_number, map_price, map_transmission, map_year,
};
use crate::model::{ClassifiedPost, Merchant, NormalizeError, PostSource};
use crate::normalizer::{capitalize_words, clean_or_none, clean_title, displacement_to_cylinder, extract_decimal_pair};
use crate::parser::keys;
use crate::utils::{parse_datetime, parse_day_month_year};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

/// What a listing parse needs from the running job.
#[derive(Debug, Clone)]
pub struct ParseContext<'a> {
    pub known_regions: &'a HashSet<String>,
    pub current_year: i32,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Ignored,
    MissingDetail,
    UnknownRegion(String),
    MissingYear,
    MissingPhone,
    MissingImages,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPost {
    pub post: ClassifiedPost,
    pub merchant: Merchant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    Parsed(Box<ParsedPost>),
    Skipped(SkipReason),
}

/// A raw listing as dumped by one site's scraper.
pub trait Listing: DeserializeOwned + Send + Sync {
    const SOURCE: PostSource;

    fn source_id(&self) -> &str;

    fn post_id(&self) -> String {
        keys::post_id(Self::SOURCE, self.source_id())
    }

    /// Only a malformed displacement is an error; everything else either parses or is skipped.
    fn parse(&self, ctx: &ParseContext<'_>) -> Result<PostOutcome, NormalizeError>;
}

/// Scrapers dump some numeric fields as JSON numbers and others as text.
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TayaraListing {
    pub post: TayaraPost,
    #[serde(default)]
    pub detail: Option<TayaraDetail>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TayaraPost {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub price: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub location: TayaraLocation,
    pub metadata: TayaraMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TayaraLocation {
    pub governorate: String,
    #[serde(default)]
    pub delegation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TayaraMetadata {
    pub published_on: String,
    pub publisher: TayaraPublisher,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TayaraPublisher {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_shop: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TayaraDetail {
    pub make: Option<String>,
    pub model: Option<String>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub km: Option<String>,
    pub fuel: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cv: Option<String>,
    pub cylinder: Option<String>,
    pub color: Option<String>,
    pub gearbox: Option<String>,
    pub merchant: Option<TayaraMerchant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TayaraMerchant {
    pub id: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
}

impl Listing for TayaraListing {
    const SOURCE: PostSource = PostSource::Tayara;

    fn source_id(&self) -> &str {
        &self.post.id
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Result<PostOutcome, NormalizeError> {
        let post = &self.post;
        let empty = TayaraDetail::default();
        let detail = self.detail.as_ref().unwrap_or(&empty);
        let title_description = format!("{} {}", post.title, post.description);

        if is_post_ignored(&title_description, &post.title, detail.make.as_deref()) {
            return Ok(PostOutcome::Skipped(SkipReason::Ignored));
        }

        let region_id = keys::region_id(&post.location.governorate);
        if !ctx.known_regions.contains(&region_id) {
            return Ok(PostOutcome::Skipped(SkipReason::UnknownRegion(post.location.governorate.clone())));
        }

        let site_merchant = detail.merchant.clone().unwrap_or_default();
        let Some(year) = map_year(detail.year.as_deref()) else {
            return Ok(PostOutcome::Skipped(SkipReason::MissingYear));
        };
        let Some(phone) = map_phone_number(site_merchant.phone_number.as_deref()) else {
            return Ok(PostOutcome::Skipped(SkipReason::MissingPhone));
        };
        if post.images.is_empty() {
            return Ok(PostOutcome::Skipped(SkipReason::MissingImages));
        }

        let region_detail = clean_or_none(post.location.delegation.as_deref());
        let publisher = &post.metadata.publisher;
        let merchant = Merchant {
            id: keys::merchant_id_from_name(&publisher.name)
                .unwrap_or_else(|| keys::ANONYMOUS_MERCHANT_ID.to_string()),
            name: capitalize_words(&publisher.name),
            avatar: clean_or_none(publisher.avatar.as_deref()),
            is_shop: publisher.is_shop,
            phone_numbers: vec![phone],
            region_id: Some(region_id.clone()),
            region_detail: region_detail.clone(),
            address: clean_or_none(site_merchant.address.as_deref()),
            website: clean_or_none(site_merchant.website.as_deref()),
            source_ref: clean_or_none(site_merchant.id.as_deref()),
        };

        let classified = ClassifiedPost {
            id: self.post_id(),
            source: Self::SOURCE,
            id_source: post.id.clone(),
            url_source: format!("https://www.tayara.tn/item/{}", post.id),
            merchant_id: merchant.id.clone(),
            published_at: parse_datetime(&post.metadata.published_on).unwrap_or(ctx.now),
            title: clean_title(&post.title),
            description: non_empty(&post.description),
            images: post.images.clone(),
            price: map_price(post.price.as_deref()),
            make: map_make(detail.make.as_deref()),
            model: clean_or_none(detail.model.as_deref()),
            body: map_body(&title_description, detail.body.as_deref()),
            variant: None,
            engine_type: None,
            year: Some(year),
            km: map_km(detail.km.as_deref(), year, ctx.current_year),
            fuel: map_fuel(detail.fuel.as_deref()),
            cv: map_fiscal_hp(detail.cv.as_deref()),
            hp: None,
            engine: clean_or_none(detail.cylinder.as_deref()),
            cylinder: detail.cylinder.as_deref().and_then(extract_decimal_pair),
            color: map_color(detail.color.as_deref()),
            interior_type: map_interior_type(&title_description),
            interior_color: None,
            gearbox: map_gearbox(detail.gearbox.as_deref(), &title_description),
            transmission: map_transmission(&title_description),
            equipment: detect_equipment(&title_description, &[]),
            options: vec![],
            region_id,
            region_detail,
            phone_numbers: vec![phone],
            car_engine_id: None,
        };

        Ok(PostOutcome::Parsed(Box::new(ParsedPost { post: classified, merchant })))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomobiletnListing {
    pub original_id: String,
    #[serde(default)]
    pub detail: Option<AutomobiletnDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomobiletnDetail {
    pub url_source: String,
    pub region: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub phone: Option<String>,
    pub merchant: Option<AutomobiletnMerchant>,
    pub date: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    #[serde(rename = "type")]
    pub engine_type: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub price: Option<String>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub km: Option<String>,
    pub fuel: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cv: Option<String>,
    pub engine: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cylinder: Option<String>,
    pub color: Option<String>,
    pub interior_type: Option<String>,
    pub interior_color: Option<String>,
    pub gearbox: Option<String>,
    pub transmission: Option<String>,
    #[serde(default)]
    pub all_options: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomobiletnMerchant {
    pub id_source: String,
    pub name: String,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub url_source: Option<String>,
}

impl Listing for AutomobiletnListing {
    const SOURCE: PostSource = PostSource::Automobiletn;

    fn source_id(&self) -> &str {
        &self.original_id
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Result<PostOutcome, NormalizeError> {
        let Some(detail) = self.detail.as_ref() else {
            return Ok(PostOutcome::Skipped(SkipReason::MissingDetail));
        };
        let Some(region) = detail.region.as_deref().filter(|r| !r.trim().is_empty()) else {
            return Ok(PostOutcome::Skipped(SkipReason::MissingDetail));
        };
        let Some(year) = map_year(detail.year.as_deref()) else {
            return Ok(PostOutcome::Skipped(SkipReason::MissingYear));
        };

        let region_id = keys::region_id(region);
        if !ctx.known_regions.contains(&region_id) {
            return Ok(PostOutcome::Skipped(SkipReason::UnknownRegion(region.to_string())));
        }

        let phone = map_phone_number(detail.phone.as_deref());
        let phone_numbers: Vec<u32> = phone.into_iter().collect();
        let merchant = match &detail.merchant {
            Some(m) => Merchant {
                id: m.id_source.clone(),
                name: capitalize_words(&m.name),
                avatar: clean_or_none(m.logo.as_deref()),
                is_shop: true,
                phone_numbers: phone_numbers.clone(),
                region_id: Some(region_id.clone()),
                region_detail: None,
                address: clean_or_none(m.address.as_deref()),
                website: clean_or_none(m.website.as_deref()),
                source_ref: clean_or_none(m.url_source.as_deref()),
            },
            None => Merchant {
                id: keys::ANONYMOUS_MERCHANT_ID.to_string(),
                name: keys::ANONYMOUS_MERCHANT_NAME.to_string(),
                avatar: None,
                is_shop: false,
                phone_numbers: vec![],
                region_id: None,
                region_detail: None,
                address: None,
                website: None,
                source_ref: None,
            },
        };

        let description = detail.description.as_deref().and_then(non_empty);
        let context = description.clone().unwrap_or_default();
        let cylinder = match clean_or_none(detail.cylinder.as_deref()) {
            Some(raw) => Some(displacement_to_cylinder(&raw)?),
            None => None,
        };
        let title = [&detail.make, &detail.model, &detail.variant]
            .iter()
            .filter_map(|part| part.as_deref())
            .collect::<Vec<_>>()
            .join(" ");

        let classified = ClassifiedPost {
            id: self.post_id(),
            source: Self::SOURCE,
            id_source: self.original_id.clone(),
            url_source: detail.url_source.clone(),
            merchant_id: merchant.id.clone(),
            published_at: detail.date.as_deref().and_then(parse_day_month_year).unwrap_or(ctx.now),
            title: clean_title(&title),
            description,
            images: detail.images.clone(),
            price: map_price(detail.price.as_deref()),
            make: map_make(detail.make.as_deref()),
            model: clean_or_none(detail.model.as_deref()),
            body: map_body(&context, detail.body.as_deref()),
            variant: clean_or_none(detail.variant.as_deref()),
            engine_type: clean_or_none(detail.engine_type.as_deref()),
            year: Some(year),
            km: map_km(detail.km.as_deref(), year, ctx.current_year),
            fuel: map_fuel(detail.fuel.as_deref()),
            cv: map_fiscal_hp(detail.cv.as_deref()),
            hp: hp_from_variant(detail.variant.as_deref()),
            engine: clean_or_none(detail.engine.as_deref()),
            cylinder,
            color: map_color(detail.color.as_deref()),
            interior_type: map_interior_type(detail.interior_type.as_deref().unwrap_or_default()),
            interior_color: map_color(detail.interior_color.as_deref()),
            gearbox: map_gearbox(detail.gearbox.as_deref(), &context),
            transmission: map_transmission(detail.transmission.as_deref().unwrap_or_default()),
            equipment: detect_equipment(&context, &detail.all_options),
            options: clean_options(&detail.all_options),
            region_id,
            region_detail: None,
            phone_numbers,
            car_engine_id: None,
        };

        Ok(PostOutcome::Parsed(Box::new(ParsedPost { post: classified, merchant })))
    }
}
