//! Equipment flags and the filter for listings that are not cars for sale.

use crate::model::Equipment;
use crate::normalizer::{contains_any, normalize_whitespace};

const IGNORED_IN_TEXT: &[&str] = &[
    "tracteur",
    "trakteur",
    "trax",
    "traks",
    "poid lour",
    "poid lours",
    "poids lourd",
    "camion om",
    "vespa",
    "mobylette",
    "location",
];

const IGNORED_IN_TITLE: &[&str] = &[
    "jante", "4 roue", "accessoir", "accesoir", "accsoir", "piece", "pneu", "3jeli", "3jal", "3ajla", "cherche",
    "chauffeur", "malle", "male", "retro", "volant", "pare-ch", "parechoc", "parach", "para-ch", "parash", "volan",
    "acciden", "aciden",
];

const IGNORED_MAKES: &[&str] = &["AC", "Acrea", "Acura", "Masey Ferguson", "UFO", "Zotye"];

const FIRST_OWNER: &[&str] = &["premiere main", "premier main", "1er main", "1ere main", "1 ere main", "1 er main"];

/// True for spare parts, accessories, trucks, rentals and similar listings.
pub fn is_post_ignored(title_description: &str, title: &str, make: Option<&str>) -> bool {
    contains_any(title_description, IGNORED_IN_TEXT)
        || contains_any(title, IGNORED_IN_TITLE)
        || make.is_some_and(|m| IGNORED_MAKES.contains(&m.trim()))
}

/// Looks for each option token in the site's option list first, then in the description.
pub fn detect_equipment(description: &str, options: &[String]) -> Equipment {
    let has = |tokens: &[&str]| options.iter().any(|o| contains_any(o, tokens)) || contains_any(description, tokens);

    Equipment {
        car_play: has(&["android", "carplay", "car play"]),
        bluetooth: has(&["bluetooth"]),
        sunroof: has(&["toit", "panoramique", "ouvrant"]),
        alarm: has(&["alarm", "antivol", "anti vol", "anti-vol"]),
        ac_auto: has(&["clim"]),
        led_lights: has(&["led"]),
        led_interior: has(&["ambian", "lumier"]),
        keyless: has(&["key", "sans cle", "acces cle", "access cle", "cle access", "cle intelligente"]),
        alu_rims: has(&["jant", "alu"]),
        warranty: has(&["garantie"]),
        camera: has(&["camera"]),
        exchange: has(&["echang"]),
        leasing: has(&["leasing"]),
        first_owner: contains_any(description, FIRST_OWNER),
        fcr: contains_any(description, &["fcr"]),
    }
}

/// Site option labels, whitespace-normalized and without empties.
pub fn clean_options(options: &[String]) -> Vec<String> {
    options
        .iter()
        .map(|o| normalize_whitespace(o))
        .filter(|o| !o.is_empty())
        .collect()
}
