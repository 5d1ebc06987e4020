// Field mappers: free text to closed enums and plausible numbers.

pub mod fields;
pub mod numeric;
pub mod options;
pub mod rules;

pub use fields::{
    map_body, map_catalog_fuel, map_color, map_fuel, map_gearbox, map_interior_type, map_make, map_transmission,
};
pub use numeric::{
    extract_hp, extract_torque, hp_from_variant, map_fiscal_hp, map_km, map_phone_number, map_price, map_year,
};
pub use options::{clean_options, detect_equipment, is_post_ignored};
