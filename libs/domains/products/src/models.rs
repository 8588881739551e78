use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_CATEGORY: &str = "uncategorized";
pub const NAME_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 2000;
pub const CATEGORY_MAX_LEN: usize = 100;

pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const MAX_PAGE_LIMIT: u64 = 100;
pub const SEARCH_RESULT_LIMIT: i64 = 50;

/// Product entity as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// 24-character hex ObjectId
    #[schema(example = "65a1b2c3d4e5f6a7b8c9d0e1")]
    pub id: String,
    #[schema(example = "Laptop")]
    pub name: String,
    #[schema(example = 999.99)]
    pub price: f64,
    pub description: String,
    #[schema(example = "Electronics")]
    pub category: String,
    /// Never negative
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new product
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub stock: i64,
}

impl Product {
    pub fn new(id: String, input: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            price: input.price,
            description: input.description,
            category: input.category,
            stock: input.stock.max(0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a change set and bump `updated_at`
    pub fn apply(&mut self, changes: &ProductChanges, now: DateTime<Utc>) {
        if let Some(ref name) = changes.name {
            self.name = name.clone();
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(ref description) = changes.description {
            self.description = description.clone();
        }
        if let Some(ref category) = changes.category {
            self.category = category.clone();
        }
        if let Some(stock) = changes.stock {
            self.stock = stock;
        }
        self.updated_at = now;
    }
}

/// Validated field updates for replace (PUT) and partial update (PATCH)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i64>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.stock.is_none()
    }
}

/// Request body accepted by create, replace and partial update.
///
/// Only used for API documentation; bodies are validated field by field.
#[derive(Debug, ToSchema)]
pub struct ProductInput {
    /// Required on create. Angle brackets are stripped, max 200 characters.
    pub name: Option<String>,
    /// Required on create. Must be >= 0.
    pub price: Option<f64>,
    /// Max 2000 characters
    pub description: Option<String>,
    /// Max 100 characters, defaults to `uncategorized`
    pub category: Option<String>,
    /// Floored to an integer, must be >= 0
    pub stock: Option<f64>,
}

/// Stock mutation kind
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StockOperation {
    Increment,
    Decrement,
    Set,
}

/// Body of `PATCH /products/{id}/stock`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StockUpdate {
    /// Positive whole number
    #[validate(
        required(message = "quantity is required"),
        range(exclusive_min = 0.0, message = "quantity must be a positive number")
    )]
    #[schema(example = 5)]
    pub quantity: Option<f64>,
    #[validate(required(message = "operation must be one of increment, decrement, set"))]
    pub operation: Option<StockOperation>,
}

/// Stock change handed to the repository; the quantity is already validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockChange {
    Increment(i64),
    /// Applied only while current stock >= quantity
    Decrement(i64),
    Set(i64),
}

impl StockChange {
    pub fn new(operation: StockOperation, quantity: i64) -> Self {
        match operation {
            StockOperation::Increment => Self::Increment(quantity),
            StockOperation::Decrement => Self::Decrement(quantity),
            StockOperation::Set => Self::Set(quantity),
        }
    }

    pub fn operation(&self) -> StockOperation {
        match self {
            Self::Increment(_) => StockOperation::Increment,
            Self::Decrement(_) => StockOperation::Decrement,
            Self::Set(_) => StockOperation::Set,
        }
    }

    pub fn quantity(&self) -> i64 {
        match *self {
            Self::Increment(q) | Self::Decrement(q) | Self::Set(q) => q,
        }
    }
}

/// Sortable product fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum SortField {
    #[default]
    #[strum(serialize = "createdAt")]
    CreatedAt,
    #[strum(serialize = "updatedAt")]
    UpdatedAt,
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "price")]
    Price,
    #[strum(serialize = "category")]
    Category,
    #[strum(serialize = "stock")]
    Stock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query string of `GET /products`.
///
/// Values arrive as strings; malformed numbers fall back to their defaults
/// and unknown sort fields sort by `createdAt`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Page size, 1 to 100 (default 10)
    pub limit: Option<String>,
    /// createdAt, updatedAt, name, price, category or stock
    pub sort: Option<String>,
    /// asc or desc (default desc)
    pub order: Option<String>,
    /// Exact category match
    pub category: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<String>,
    /// Inclusive upper price bound
    pub max_price: Option<String>,
    /// When true, only products with stock > 0
    pub in_stock: Option<String>,
}

/// Additive product filter; an empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.category
            .as_ref()
            .is_none_or(|category| &product.category == category)
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && (!self.in_stock || product.stock > 0)
    }
}

/// Page window and ordering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl PageRequest {
    /// Documents to skip, saturating at the store's signed 64-bit bound.
    pub fn skip(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
            has_next: page.saturating_mul(limit) < total,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Text matched case-insensitively against name, description and category
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResults {
    pub products: Vec<Product>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub total_products: u64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub total_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: String,
    pub count: u64,
    pub avg_price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub overview: StatsOverview,
    /// Sorted by descending count
    pub by_category: Vec<CategoryStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedProduct {
    pub message: String,
    pub product: Product,
}

/// Body of `POST /products/bulk-delete`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    /// Entries that are not valid ObjectId strings are skipped
    #[schema(value_type = Vec<String>)]
    pub ids: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResult {
    pub message: String,
    pub deleted_count: u64,
    pub requested_count: usize,
    pub valid_ids_count: usize,
}

/// Current time truncated to the millisecond precision the store keeps
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
