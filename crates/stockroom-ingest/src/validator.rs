//! Row normalization and validation.

use stockroom_core::models::{CatalogItemDraft, RawRow};

use crate::assets::ImageMode;

/// Required columns, in the order they are reported.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "name",
    "price",
    "description",
    "category",
    "brand",
    "quantity",
    "sku",
    "image",
];

pub const SKU_LENGTH: usize = 6;

/// A row that passed validation, with its image reference still unresolved
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRow {
    pub draft: CatalogItemDraft,
    pub image_ref: String,
}

/// Validate one row, collecting every missing or invalid field.
///
/// On failure the returned field names follow [`REQUIRED_FIELDS`] order.
pub fn validate_row(row: &RawRow, mode: ImageMode) -> Result<ValidatedRow, Vec<&'static str>> {
    let mut invalid = Vec::new();

    let name = row.get("name");
    let price = row.get("price").and_then(parse_price);
    let description = row.get("description");
    let category = row.get("category");
    let brand = row.get("brand");
    let quantity = row.get("quantity").and_then(parse_quantity);
    // Length is checked on the upper-cased form, which can be longer ("ß" -> "SS")
    let sku = row
        .get("sku")
        .map(str::to_uppercase)
        .filter(|s| s.chars().count() == SKU_LENGTH);
    let image = match mode {
        ImageMode::Archive => row.get("image"),
        ImageMode::Remote => row.get("image").or_else(|| row.get("image_url")),
    };

    let present = [
        name.is_some(),
        price.is_some(),
        description.is_some(),
        category.is_some(),
        brand.is_some(),
        quantity.is_some(),
        sku.is_some(),
        image.is_some(),
    ];
    for (field, ok) in REQUIRED_FIELDS.iter().zip(present) {
        if !ok {
            invalid.push(*field);
        }
    }

    match (name, price, description, category, brand, quantity, sku, image) {
        (
            Some(name),
            Some(price),
            Some(description),
            Some(category),
            Some(brand),
            Some(quantity),
            Some(sku),
            Some(image),
        ) => Ok(ValidatedRow {
            draft: CatalogItemDraft {
                name: name.to_string(),
                price,
                description: description.to_string(),
                category: category.to_uppercase(),
                brand: brand.to_string(),
                quantity,
                sku,
                compatibility: row.get("compatibility").map(str::to_string),
            },
            image_ref: image.to_string(),
        }),
        _ => Err(invalid),
    }
}

/// Failure reason for a row: the offending field names, comma-joined
pub fn failure_reason(fields: &[&str]) -> String {
    fields.join(", ")
}

fn parse_price(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

fn parse_quantity(value: &str) -> Option<i64> {
    let number = value.parse::<f64>().ok()?;
    if !number.is_finite() || number.fract() != 0.0 || number < 0.0 || number >= i64::MAX as f64 {
        return None;
    }
    Some(number as i64)
}
