use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ProductResult;
use crate::models::{
    CategoryStats, NewProduct, PageRequest, Product, ProductChanges, ProductFilter, ProductStats,
    SortField, SortOrder, StatsOverview, StockChange, now_millis,
};

/// Document store access for products.
///
/// Implementations must apply [`StockChange::Decrement`] as one atomic
/// conditional write: the `stock >= quantity` guard and the subtraction can
/// never be observed apart.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persist a new product; the store assigns id and timestamps
    async fn insert(&self, input: NewProduct) -> ProductResult<Product>;

    async fn find_by_id(&self, id: ObjectId) -> ProductResult<Option<Product>>;

    /// One page of products matching `filter`
    async fn find(&self, filter: &ProductFilter, page: PageRequest)
    -> ProductResult<Vec<Product>>;

    /// Number of products matching `filter`, ignoring pagination
    async fn count(&self, filter: &ProductFilter) -> ProductResult<u64>;

    /// Case-insensitive substring match on name, description or category,
    /// newest first
    async fn search(&self, query: &str, limit: i64) -> ProductResult<Vec<Product>>;

    /// Apply `changes` and return the updated product, `None` if absent
    async fn update(&self, id: ObjectId, changes: ProductChanges)
    -> ProductResult<Option<Product>>;

    /// Apply a stock change. `None` when the id is absent or the decrement
    /// guard did not hold.
    async fn apply_stock_change(
        &self,
        id: ObjectId,
        change: StockChange,
    ) -> ProductResult<Option<Product>>;

    /// Remove and return a product, `None` if absent
    async fn delete(&self, id: ObjectId) -> ProductResult<Option<Product>>;

    /// Remove every listed product in one operation, returning how many existed
    async fn delete_many(&self, ids: Vec<ObjectId>) -> ProductResult<u64>;

    /// Overview and per-category aggregates over the whole collection
    async fn stats(&self) -> ProductResult<ProductStats>;
}

/// In-memory implementation of ProductRepository (for testing/development).
///
/// Every mutation runs under the single write lock, so the decrement guard
/// and the write are atomic with respect to other requests.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<ObjectId, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a product as-is, e.g. to seed fixtures with fixed timestamps.
    /// A negative stock is coerced to 0 like a document loaded from the store.
    pub async fn seed(&self, mut product: Product) -> ProductResult<()> {
        let id = ObjectId::parse_str(&product.id)
            .map_err(|e| crate::error::ProductError::Internal(e.to_string()))?;
        product.stock = product.stock.max(0);
        self.products.write().await.insert(id, product);
        Ok(())
    }
}

fn compare(a: &Product, b: &Product, sort: SortField) -> Ordering {
    let by_field = match sort {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Category => a.category.cmp(&b.category),
        SortField::Stock => a.stock.cmp(&b.stock),
    };
    // Hex ids order like the underlying bytes
    by_field.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, input: NewProduct) -> ProductResult<Product> {
        let id = ObjectId::new();
        let product = Product::new(id.to_hex(), input, now_millis());
        self.products.write().await.insert(id, product.clone());

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    async fn find_by_id(&self, id: ObjectId) -> ProductResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn find(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        matching.sort_by(|a, b| match page.order {
            SortOrder::Asc => compare(a, b, page.sort),
            SortOrder::Desc => compare(b, a, page.sort),
        });

        Ok(matching
            .into_iter()
            .skip(page.skip() as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &ProductFilter) -> ProductResult<u64> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn search(&self, query: &str, limit: i64) -> ProductResult<Vec<Product>> {
        let needle = query.to_lowercase();
        let products = self.products.read().await;

        let mut found: Vec<Product> = products
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
                    || p.category.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        found.sort_by(|a, b| compare(b, a, SortField::CreatedAt));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn update(
        &self,
        id: ObjectId,
        changes: ProductChanges,
    ) -> ProductResult<Option<Product>> {
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(None);
        };

        product.apply(&changes, now_millis());
        tracing::info!(product_id = %product.id, "Product updated");
        Ok(Some(product.clone()))
    }

    async fn apply_stock_change(
        &self,
        id: ObjectId,
        change: StockChange,
    ) -> ProductResult<Option<Product>> {
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(None);
        };

        product.stock = match change {
            StockChange::Increment(q) => product.stock.saturating_add(q),
            StockChange::Decrement(q) if product.stock >= q => product.stock - q,
            StockChange::Decrement(_) => return Ok(None),
            StockChange::Set(q) => q,
        };
        product.updated_at = now_millis();

        tracing::info!(product_id = %product.id, stock = product.stock, "Stock updated");
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: ObjectId) -> ProductResult<Option<Product>> {
        let removed = self.products.write().await.remove(&id);
        if let Some(ref product) = removed {
            tracing::info!(product_id = %product.id, "Product deleted");
        }
        Ok(removed)
    }

    async fn delete_many(&self, ids: Vec<ObjectId>) -> ProductResult<u64> {
        let mut products = self.products.write().await;
        let deleted = ids.iter().filter(|id| products.remove(id).is_some()).count() as u64;
        Ok(deleted)
    }

    async fn stats(&self) -> ProductResult<ProductStats> {
        let products = self.products.read().await;
        if products.is_empty() {
            return Ok(ProductStats::default());
        }

        let total = products.len() as u64;
        let prices = products.values().map(|p| p.price);
        let overview = StatsOverview {
            total_products: total,
            avg_price: prices.clone().sum::<f64>() / total as f64,
            min_price: prices.clone().fold(f64::INFINITY, f64::min),
            max_price: prices.fold(f64::NEG_INFINITY, f64::max),
            total_stock: products.values().map(|p| p.stock).sum(),
        };

        let mut groups: HashMap<&str, (u64, f64)> = HashMap::new();
        for product in products.values() {
            let entry = groups.entry(product.category.as_str()).or_default();
            entry.0 += 1;
            entry.1 += product.price;
        }

        let mut by_category: Vec<CategoryStats> = groups
            .into_iter()
            .map(|(category, (count, sum))| CategoryStats {
                category: category.to_string(),
                count,
                avg_price: sum / count as f64,
            })
            .collect();
        by_category.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));

        Ok(ProductStats {
            overview,
            by_category,
        })
    }
}
