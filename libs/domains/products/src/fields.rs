//! Field-level validation for product bodies.
//!
//! Each updatable field has a pure validator `&Value -> Result<FieldValue, String>`.
//! Create, replace and partial update differ only in how they treat a rejected
//! field:
//!
//! | operation | missing field        | rejected field          |
//! |-----------|----------------------|-------------------------|
//! | create    | default (name/price required) | error (stock: omitted) |
//! | replace   | unchanged            | error                   |
//! | patch     | unchanged            | silently dropped        |
//!
//! `null` counts as missing. Unknown keys are ignored.

use serde_json::{Map, Value};

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CATEGORY_MAX_LEN, DEFAULT_CATEGORY, DESCRIPTION_MAX_LEN, NAME_MAX_LEN, NewProduct,
    ProductChanges,
};

/// Strip angle brackets, then surrounding whitespace.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect::<String>()
        .trim()
        .to_string()
}

/// A validated value for one updatable field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Name(String),
    Price(f64),
    Description(String),
    Category(String),
    Stock(i64),
}

type Validator = fn(&Value) -> Result<FieldValue, String>;

/// Allow-list of fields accepted by replace and partial update
pub const UPDATABLE_FIELDS: [(&str, Validator); 5] = [
    ("name", validate_name),
    ("price", validate_price),
    ("description", validate_description),
    ("category", validate_category),
    ("stock", validate_stock),
];

pub fn validate_name(value: &Value) -> Result<FieldValue, String> {
    let name = value
        .as_str()
        .map(sanitize)
        .filter(|s| !s.is_empty())
        .ok_or("Name is required and must be a non-empty string")?;
    if name.chars().count() > NAME_MAX_LEN {
        return Err(format!("Name must be at most {} characters", NAME_MAX_LEN));
    }
    Ok(FieldValue::Name(name))
}

pub fn validate_price(value: &Value) -> Result<FieldValue, String> {
    value
        .as_f64()
        .filter(|p| *p >= 0.0)
        .map(FieldValue::Price)
        .ok_or_else(|| "Price is required and must be a non-negative number".to_string())
}

pub fn validate_description(value: &Value) -> Result<FieldValue, String> {
    bounded_text(value, "Description", DESCRIPTION_MAX_LEN).map(FieldValue::Description)
}

pub fn validate_category(value: &Value) -> Result<FieldValue, String> {
    bounded_text(value, "Category", CATEGORY_MAX_LEN).map(FieldValue::Category)
}

/// Non-negative number, floored to an integer
pub fn validate_stock(value: &Value) -> Result<FieldValue, String> {
    value
        .as_f64()
        .filter(|s| *s >= 0.0)
        .map(|s| FieldValue::Stock(s.floor() as i64))
        .ok_or_else(|| "Stock must be a non-negative number".to_string())
}

fn bounded_text(value: &Value, label: &str, max: usize) -> Result<String, String> {
    let text = value
        .as_str()
        .map(sanitize)
        .ok_or_else(|| format!("{} must be a string", label))?;
    if text.chars().count() > max {
        return Err(format!("{} must be at most {} characters", label, max));
    }
    Ok(text)
}

fn present<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|v| !v.is_null())
}

fn text_of(value: FieldValue) -> String {
    match value {
        FieldValue::Name(s) | FieldValue::Description(s) | FieldValue::Category(s) => s,
        FieldValue::Price(_) | FieldValue::Stock(_) => String::new(),
    }
}

/// Validate a create body.
///
/// `name` and `price` are required. An invalid `stock` is omitted (defaults to 0)
/// and an empty `category` falls back to `uncategorized`.
pub fn parse_create(body: &Map<String, Value>) -> ProductResult<NewProduct> {
    let name = present(body, "name")
        .map(validate_name)
        .unwrap_or(Err("Name is required and must be a non-empty string".into()))
        .map(text_of)
        .map_err(ProductError::Validation)?;

    let price = match present(body, "price").map(validate_price) {
        Some(Ok(FieldValue::Price(p))) => p,
        Some(Err(e)) => return Err(ProductError::Validation(e)),
        _ => {
            return Err(ProductError::Validation(
                "Price is required and must be a non-negative number".into(),
            ));
        }
    };

    let description = present(body, "description")
        .map(validate_description)
        .transpose()
        .map_err(ProductError::Validation)?
        .map(text_of)
        .unwrap_or_default();

    let category = present(body, "category")
        .map(validate_category)
        .transpose()
        .map_err(ProductError::Validation)?
        .map(text_of)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let stock = match present(body, "stock").map(validate_stock) {
        Some(Ok(FieldValue::Stock(s))) => s,
        _ => 0,
    };

    Ok(NewProduct {
        name,
        price,
        description,
        category,
        stock,
    })
}

/// Validate a full-replace body. Any rejected field fails the request.
pub fn parse_replace(body: &Map<String, Value>) -> ProductResult<ProductChanges> {
    let mut changes = ProductChanges::default();
    for (key, validate) in UPDATABLE_FIELDS {
        if let Some(value) = present(body, key) {
            set(&mut changes, validate(value).map_err(ProductError::Validation)?);
        }
    }

    if changes.is_empty() {
        return Err(ProductError::Validation(
            "At least one valid field (name, price, description, category, stock) is required"
                .into(),
        ));
    }
    Ok(changes)
}

/// Validate a partial-update body. Rejected fields are dropped.
pub fn parse_patch(body: &Map<String, Value>) -> ProductResult<ProductChanges> {
    let mut changes = ProductChanges::default();
    for (key, validate) in UPDATABLE_FIELDS {
        match present(body, key).map(validate) {
            Some(Ok(value)) => set(&mut changes, value),
            Some(Err(reason)) => {
                tracing::debug!(field = key, %reason, "Dropping invalid field from partial update");
            }
            None => {}
        }
    }

    if changes.is_empty() {
        return Err(ProductError::Validation("No valid fields to update".into()));
    }
    Ok(changes)
}

fn set(changes: &mut ProductChanges, value: FieldValue) {
    match value {
        FieldValue::Name(v) => changes.name = Some(v),
        FieldValue::Price(v) => changes.price = Some(v),
        FieldValue::Description(v) => changes.description = Some(v),
        FieldValue::Category(v) => changes.category = Some(v),
        FieldValue::Stock(v) => changes.stock = Some(v),
    }
}
