// Core structs: catalog entities, classified posts, closed enums and error types
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Production-year bound as scraped from tuning and specification sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum YearBound {
    Unknown,
    Present,
    Year(i32),
}

impl YearBound {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("present") {
            return YearBound::Present;
        }
        match trimmed.parse::<i32>() {
            Ok(year) if (1000..=9999).contains(&year) => YearBound::Year(year),
            _ => YearBound::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, YearBound::Unknown)
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            YearBound::Year(y) => Some(*y),
            _ => None,
        }
    }
}

impl fmt::Display for YearBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearBound::Unknown => f.write_str("unknown"),
            YearBound::Present => f.write_str("present"),
            YearBound::Year(y) => write!(f, "{}", y),
        }
    }
}

impl From<String> for YearBound {
    fn from(value: String) -> Self {
        YearBound::parse(&value)
    }
}

impl From<YearBound> for String {
    fn from(value: YearBound) -> Self {
        value.to_string()
    }
}

/// Declares a closed enum persisted and displayed through its French label.
macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Exact (case-insensitive) label lookup.
            pub fn from_label(label: &str) -> Option<Self> {
                let label = label.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(label))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labelled_enum!(Fuel {
    Essence => "Essence",
    Ethanol => "Ethanol",
    Diesel => "Diesel",
    Gaz => "Gaz",
    Hydrogen => "Hydrogen",
    Hybrid => "Hybrid",
    PlugInHybrid => "Plug-in Hybrid",
    EssenceHybrid => "Essence Hybrid",
    EssenceMicroHybrid => "Essence Micro Hybrid",
    DieselHybrid => "Diesel Hybrid",
    DieselMicroHybrid => "Diesel Micro Hybrid",
    Electrique => "Electrique",
});

impl Fuel {
    pub fn is_hybrid(&self) -> bool {
        matches!(
            self,
            Fuel::Hybrid
                | Fuel::PlugInHybrid
                | Fuel::EssenceHybrid
                | Fuel::EssenceMicroHybrid
                | Fuel::DieselHybrid
                | Fuel::DieselMicroHybrid
        )
    }
}

labelled_enum!(Gearbox {
    Auto => "Automatique",
    Manual => "Manuelle",
});

labelled_enum!(Transmission {
    Awd => "4x4",
    Fwd => "Traction",
    Rwd => "Propulsion",
});

labelled_enum!(Color {
    Black => "Noir",
    White => "Blanc",
    Red => "Rouge",
    Green => "Vert",
    Blue => "Bleu",
    Yellow => "Jaune",
    Orange => "Orange",
    Purple => "Violet",
    Pink => "Rose",
    Brown => "Marron",
    Grey => "Gris",
});

labelled_enum!(BodyType {
    Utility => "Utilitaire",
    MonospaceVan => "Monospace / Van",
    Coupe => "Coupé",
    Cabriolet => "Cabriolet",
    Break => "Break",
    Compact => "Compacte",
    Berline => "Berline",
    Suv => "SUV",
    Pickup => "Pick-up",
});

labelled_enum!(InteriorType {
    Leather => "Cuir",
    Leatherette => "Similicuir",
    Fabric => "Tissu",
    Alcantara => "Alcantara",
});

labelled_enum!(
    /// Listing site a classified post was scraped from.
    PostSource {
        Tayara => "tayara.tn",
        Automobiletn => "automobile.tn",
    }
);

impl PostSource {
    /// Prefix used when deriving post ids.
    pub fn key(&self) -> &'static str {
        match self {
            PostSource::Tayara => "TAYARA",
            PostSource::Automobiletn => "AUTOMOBILETN",
        }
    }
}

labelled_enum!(
    /// Tuning-data site an engine record was scraped from.
    EngineSource {
        BrPerf => "brperf",
        Shiftech => "shiftech",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMake {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub remap_eligible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEngine {
    pub id: String,
    pub make_id: String,
    pub model: String,
    pub engine_type: Option<String>,
    pub from_year: YearBound,
    pub to_year: YearBound,
    pub engine_name: Option<String>,
    pub cylinder: Option<String>,
    pub fuel: Fuel,
    pub hp: Option<i64>,
    pub hp_stage1: Option<i64>,
    pub hp_stage2: Option<i64>,
    pub torque: Option<i64>,
    pub torque_stage1: Option<i64>,
    pub torque_stage2: Option<i64>,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalModelTrim {
    pub id: String,
    pub make_id: String,
    pub model: String,
    pub from_year: YearBound,
    pub to_year: YearBound,
    pub displacement: Option<String>,
    pub cylinder: Option<String>,
    pub body: Option<String>,
    pub fuel: Fuel,
    pub hp: Option<i64>,
    pub torque: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineModelAssociation {
    pub car_engine_id: String,
    pub car_model_id: String,
}

/// Raw engine row handed over by the tuning-site scrapers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedVehicleRecord {
    pub make: String,
    pub model: String,
    /// BR-Performance: "<model> <type> <from> <to>" blob.
    #[serde(default)]
    pub type_years: Option<String>,
    /// Shiftech: type and year come as separate fields.
    #[serde(default, rename = "type")]
    pub engine_type: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    pub fuel: String,
    pub engine_name: String,
    #[serde(default)]
    pub hp: Option<String>,
    #[serde(default, alias = "hpStage1")]
    pub hp_remap: Option<String>,
    #[serde(default)]
    pub hp_stage2: Option<String>,
    #[serde(default)]
    pub torque: Option<String>,
    #[serde(default, alias = "torqueStage1")]
    pub torque_remap: Option<String>,
    #[serde(default)]
    pub torque_stage2: Option<String>,
    pub url_source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub car_play: bool,
    pub bluetooth: bool,
    pub sunroof: bool,
    pub alarm: bool,
    pub ac_auto: bool,
    pub led_lights: bool,
    pub led_interior: bool,
    pub keyless: bool,
    pub alu_rims: bool,
    pub warranty: bool,
    pub camera: bool,
    pub exchange: bool,
    pub leasing: bool,
    pub first_owner: bool,
    pub fcr: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPost {
    pub id: String,
    pub source: PostSource,
    pub id_source: String,
    pub url_source: String,
    pub merchant_id: String,
    pub published_at: DateTime<Utc>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub price: Option<i64>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub body: Option<BodyType>,
    pub variant: Option<String>,
    pub engine_type: Option<String>,
    pub year: Option<i32>,
    pub km: Option<i64>,
    pub fuel: Option<Fuel>,
    pub cv: Option<i64>,
    pub hp: Option<i64>,
    pub engine: Option<String>,
    pub cylinder: Option<String>,
    pub color: Option<Color>,
    pub interior_type: Option<InteriorType>,
    pub interior_color: Option<Color>,
    pub gearbox: Option<Gearbox>,
    pub transmission: Option<Transmission>,
    pub equipment: Equipment,
    pub options: Vec<String>,
    pub region_id: String,
    pub region_detail: Option<String>,
    pub phone_numbers: Vec<u32>,
    pub car_engine_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub is_shop: bool,
    pub phone_numbers: Vec<u32>,
    pub region_id: Option<String>,
    pub region_detail: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub source_ref: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid stored value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("dump read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("dump decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-item failure inside a job run.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Feed(#[from] FeedError),
}
