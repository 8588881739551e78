//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Bson, DateTime as BsonDateTime, Document, doc, oid::ObjectId},
    options::{FindOptions, IndexOptions, ReturnDocument},
};
use serde::{Deserialize, Deserializer};
use tracing::instrument;

use crate::error::ProductResult;
use crate::models::{
    CategoryStats, DEFAULT_CATEGORY, NewProduct, PageRequest, Product, ProductChanges,
    ProductFilter, ProductStats, SortField, SortOrder, StatsOverview, StockChange,
};
use crate::repository::ProductRepository;

pub const DEFAULT_COLLECTION: &str = "products";

/// Stored shape of a product
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    price: f64,
    #[serde(default)]
    description: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default, deserialize_with = "non_negative_stock")]
    stock: i64,
    created_at: BsonDateTime,
    updated_at: BsonDateTime,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Accept any numeric type and coerce negatives to 0
fn non_negative_stock<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let stock = match Bson::deserialize(deserializer)? {
        Bson::Int32(v) => v as i64,
        Bson::Int64(v) => v,
        Bson::Double(v) => v.floor() as i64,
        _ => 0,
    };
    Ok(stock.max(0))
}

fn to_chrono(dt: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

impl From<ProductDocument> for Product {
    fn from(doc: ProductDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            name: doc.name,
            price: doc.price,
            description: doc.description,
            category: doc.category,
            stock: doc.stock,
            created_at: to_chrono(doc.created_at),
            updated_at: to_chrono(doc.updated_at),
        }
    }
}

/// `$group` output for the overview; numbers arrive as int or double
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverviewRow {
    total_products: f64,
    avg_price: Option<f64>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    total_stock: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRow {
    #[serde(rename = "_id")]
    category: Option<String>,
    count: f64,
    avg_price: Option<f64>,
}

/// MongoDB implementation of the ProductRepository
#[derive(Clone)]
pub struct MongoProductRepository {
    collection: Collection<ProductDocument>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, DEFAULT_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<ProductDocument>(collection_name),
        }
    }

    fn raw(&self) -> Collection<Document> {
        self.collection.clone_with_type::<Document>()
    }

    /// Create the indexes used by listing, filtering and search
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let single = |field: &str| {
            IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(
                    IndexOptions::builder()
                        .name(format!("idx_{}", field))
                        .build(),
                )
                .build()
        };

        let indexes = vec![
            single("name"),
            single("price"),
            single("category"),
            single("stock"),
            IndexModel::builder()
                .keys(doc! { "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "name": "text", "description": "text" })
                .options(
                    IndexOptions::builder()
                        .name("idx_text_search".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Build a MongoDB filter document from ProductFilter
    fn build_filter(filter: &ProductFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref category) = filter.category {
            doc.insert("category", category);
        }

        if filter.min_price.is_some() || filter.max_price.is_some() {
            let mut price_filter = doc! {};
            if let Some(min) = filter.min_price {
                price_filter.insert("$gte", min);
            }
            if let Some(max) = filter.max_price {
                price_filter.insert("$lte", max);
            }
            doc.insert("price", price_filter);
        }

        if filter.in_stock {
            doc.insert("stock", doc! { "$gt": 0 });
        }

        doc
    }

    /// Sort on the requested field with `_id` as tie-breaker so pages are stable
    fn build_sort(sort: SortField, order: SortOrder) -> Document {
        let direction = match order {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        };
        doc! { sort.to_string(): direction, "_id": direction }
    }

    fn build_search(query: &str) -> Document {
        let pattern = regex::escape(query);
        doc! {
            "$or": [
                { "name": { "$regex": &pattern, "$options": "i" } },
                { "description": { "$regex": &pattern, "$options": "i" } },
                { "category": { "$regex": &pattern, "$options": "i" } },
            ]
        }
    }

    fn build_set(changes: &ProductChanges, now: BsonDateTime) -> Document {
        let mut set = doc! { "updatedAt": now };
        if let Some(ref name) = changes.name {
            set.insert("name", name);
        }
        if let Some(price) = changes.price {
            set.insert("price", price);
        }
        if let Some(ref description) = changes.description {
            set.insert("description", description);
        }
        if let Some(ref category) = changes.category {
            set.insert("category", category);
        }
        if let Some(stock) = changes.stock {
            set.insert("stock", stock);
        }
        doc! { "$set": set }
    }

    /// Filter and update for a stock change. The decrement guard lives in
    /// the filter so match and write are a single server-side operation.
    fn build_stock_update(
        id: ObjectId,
        change: StockChange,
        now: BsonDateTime,
    ) -> (Document, Document) {
        match change {
            StockChange::Increment(q) => (
                doc! { "_id": id },
                doc! { "$inc": { "stock": q }, "$set": { "updatedAt": now } },
            ),
            StockChange::Decrement(q) => (
                doc! { "_id": id, "stock": { "$gte": q } },
                doc! { "$inc": { "stock": -q }, "$set": { "updatedAt": now } },
            ),
            StockChange::Set(q) => (
                doc! { "_id": id },
                doc! { "$set": { "stock": q, "updatedAt": now } },
            ),
        }
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    async fn insert(&self, input: NewProduct) -> ProductResult<Product> {
        let id = ObjectId::new();
        let now = BsonDateTime::now();
        let document = doc! {
            "_id": id,
            "name": &input.name,
            "price": input.price,
            "description": &input.description,
            "category": &input.category,
            "stock": input.stock.max(0),
            "createdAt": now,
            "updatedAt": now,
        };

        self.raw().insert_one(document).await?;

        let product = Product {
            id: id.to_hex(),
            name: input.name,
            price: input.price,
            description: input.description,
            category: input.category,
            stock: input.stock.max(0),
            created_at: to_chrono(now),
            updated_at: to_chrono(now),
        };
        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ObjectId) -> ProductResult<Option<Product>> {
        let found = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(found.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn find(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> ProductResult<Vec<Product>> {
        let options = FindOptions::builder()
            .sort(Self::build_sort(page.sort, page.order))
            .skip(page.skip())
            .limit(page.limit as i64)
            .build();

        let cursor = self
            .collection
            .find(Self::build_filter(filter))
            .with_options(options)
            .await?;
        let documents: Vec<ProductDocument> = cursor.try_collect().await?;

        Ok(documents.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: &ProductFilter) -> ProductResult<u64> {
        let count = self
            .collection
            .count_documents(Self::build_filter(filter))
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: i64) -> ProductResult<Vec<Product>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .limit(limit)
            .build();

        let cursor = self
            .collection
            .find(Self::build_search(query))
            .with_options(options)
            .await?;
        let documents: Vec<ProductDocument> = cursor.try_collect().await?;

        Ok(documents.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self, changes))]
    async fn update(
        &self,
        id: ObjectId,
        changes: ProductChanges,
    ) -> ProductResult<Option<Product>> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id },
                Self::build_set(&changes, BsonDateTime::now()),
            )
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!(product_id = %id, "Product updated successfully");
        }
        Ok(updated.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn apply_stock_change(
        &self,
        id: ObjectId,
        change: StockChange,
    ) -> ProductResult<Option<Product>> {
        let (filter, update) = Self::build_stock_update(id, change, BsonDateTime::now());

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;

        if let Some(ref doc) = updated {
            tracing::info!(product_id = %id, stock = doc.stock, "Stock updated");
        }
        Ok(updated.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ObjectId) -> ProductResult<Option<Product>> {
        let deleted = self.collection.find_one_and_delete(doc! { "_id": id }).await?;

        if deleted.is_some() {
            tracing::info!(product_id = %id, "Product deleted successfully");
        }
        Ok(deleted.map(Product::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_many(&self, ids: Vec<ObjectId>) -> ProductResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "_id": { "$in": ids } })
            .await?;

        tracing::info!(deleted = result.deleted_count, "Products bulk deleted");
        Ok(result.deleted_count)
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> ProductResult<ProductStats> {
        let overview_pipeline = vec![doc! {
            "$group": {
                "_id": Bson::Null,
                "totalProducts": { "$sum": 1 },
                "avgPrice": { "$avg": "$price" },
                "minPrice": { "$min": "$price" },
                "maxPrice": { "$max": "$price" },
                "totalStock": { "$sum": "$stock" },
            }
        }];

        let category_pipeline = vec![
            doc! {
                "$group": {
                    "_id": "$category",
                    "count": { "$sum": 1 },
                    "avgPrice": { "$avg": "$price" },
                }
            },
            doc! { "$sort": { "count": -1, "_id": 1 } },
        ];

        let overview_rows: Vec<Document> = self
            .collection
            .aggregate(overview_pipeline)
            .await?
            .try_collect()
            .await?;

        let overview = match overview_rows.into_iter().next() {
            Some(row) => {
                let row: OverviewRow = bson::from_document(row)?;
                StatsOverview {
                    total_products: row.total_products as u64,
                    avg_price: row.avg_price.unwrap_or_default(),
                    min_price: row.min_price.unwrap_or_default(),
                    max_price: row.max_price.unwrap_or_default(),
                    total_stock: row.total_stock as i64,
                }
            }
            None => StatsOverview::default(),
        };

        let category_rows: Vec<Document> = self
            .collection
            .aggregate(category_pipeline)
            .await?
            .try_collect()
            .await?;

        let by_category = category_rows
            .into_iter()
            .map(|row| -> ProductResult<CategoryStats> {
                let row: CategoryRow = bson::from_document(row)?;
                Ok(CategoryStats {
                    category: row.category.unwrap_or_else(default_category),
                    count: row.count as u64,
                    avg_price: row.avg_price.unwrap_or_default(),
                })
            })
            .collect::<ProductResult<Vec<_>>>()?;

        Ok(ProductStats {
            overview,
            by_category,
        })
    }
}
