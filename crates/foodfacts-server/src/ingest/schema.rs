//! Product field catalogue
//!
//! The fields a stored product document may carry, with the kind each value
//! is bound to. Source columns outside the catalogue are dropped.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, kept exactly as it appears in the source
    Text,
    /// Normalized multi-valued classification
    TextList,
    /// Nullable numeric measurement or counter
    Number,
    Bool,
    /// Point in time, stored as RFC 3339
    Timestamp,
}

/// Natural key of a product
pub const CODE_FIELD: &str = "code";

/// Field whose list form is split into `categories_tags`
pub const CATEGORIES_FIELD: &str = "categories";
pub const CATEGORIES_TAGS_FIELD: &str = "categories_tags";

/// Fields covered by the text search index
pub const SEARCHABLE_FIELDS: [&str; 3] = ["product_name", "brands", "ingredients_text"];

use FieldKind::*;

pub const PRODUCT_FIELDS: &[(&str, FieldKind)] = &[
    ("code", Text),
    ("url", Text),
    ("creator", Text),
    ("created_t", Number),
    ("created_datetime", Timestamp),
    ("last_modified_t", Number),
    ("last_modified_datetime", Timestamp),
    ("product_name", Text),
    ("generic_name", Text),
    ("quantity", Text),
    ("packaging", Text),
    ("packaging_tags", TextList),
    ("brands", Text),
    ("brands_tags", TextList),
    ("categories", Text),
    ("categories_tags", TextList),
    ("categories_fr", TextList),
    ("origins", Text),
    ("origins_tags", TextList),
    ("manufacturing_places", Text),
    ("manufacturing_places_tags", TextList),
    ("labels", Text),
    ("labels_tags", TextList),
    ("labels_fr", TextList),
    ("emb_codes", Text),
    ("emb_codes_tags", TextList),
    ("first_packaging_code_geo", Text),
    ("cities", Text),
    ("cities_tags", TextList),
    ("purchase_places", Text),
    ("stores", Text),
    ("countries", Text),
    ("countries_tags", TextList),
    ("countries_fr", TextList),
    ("ingredients_text", Text),
    ("traces", Text),
    ("traces_tags", TextList),
    ("serving_size", Text),
    ("no_nutriments", Bool),
    ("additives_n", Number),
    ("additives", Text),
    ("additives_tags", TextList),
    ("ingredients_from_palm_oil_n", Number),
    ("ingredients_from_palm_oil", Text),
    ("ingredients_from_palm_oil_tags", TextList),
    ("ingredients_that_may_be_from_palm_oil_n", Number),
    ("ingredients_that_may_be_from_palm_oil", Text),
    ("ingredients_that_may_be_from_palm_oil_tags", TextList),
    ("nutrition_grade_fr", Text),
    ("main_category", Text),
    ("main_category_fr", Text),
    ("image_url", Text),
    ("image_small_url", Text),
    ("energy_100g", Number),
    ("energy_kj_100g", Number),
    ("energy_kcal_100g", Number),
    ("proteins_100g", Number),
    ("carbohydrates_100g", Number),
    ("sugars_100g", Number),
    ("fat_100g", Number),
    ("saturated_fat_100g", Number),
    ("fiber_100g", Number),
    ("sodium_100g", Number),
    ("alcohol_100g", Number),
    ("fruits_vegetables_nuts_100g", Number),
    ("carbon_footprint_100g", Number),
    ("nutrition_score_fr_100g", Number),
    ("nutrition_score_uk_100g", Number),
];

/// Resolve a source header to its catalogue entry.
///
/// The export spells some nutrients with dashes (`saturated-fat_100g`,
/// `energy-kcal_100g`); those map to the underscore names.
pub fn lookup(header: &str) -> Option<(&'static str, FieldKind)> {
    let header = header.trim();
    let normalized;
    let name = if header.contains('-') {
        normalized = header.replace('-', "_");
        normalized.as_str()
    } else {
        header
    };

    PRODUCT_FIELDS
        .iter()
        .find(|(field, _)| *field == name)
        .copied()
}
