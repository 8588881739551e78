//! Product Service - Business logic layer

use mongodb::bson::oid::ObjectId;
use observability::{ProductMetrics, StockOutcome};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::fields::{parse_create, parse_patch, parse_replace, sanitize};
use crate::models::{
    BulkDeleteRequest, BulkDeleteResult, DEFAULT_PAGE_LIMIT, DeletedProduct, ListParams,
    MAX_PAGE_LIMIT, PageRequest, Pagination, Product, ProductFilter, ProductPage, ProductStats,
    SEARCH_RESULT_LIMIT, SearchResults, SortField, SortOrder, StockChange, StockUpdate,
};
use crate::repository::ProductRepository;

/// Product service: validation, query construction and stock rules on top
/// of a [`ProductRepository`]
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, body))]
    pub async fn create_product(&self, body: Map<String, Value>) -> ProductResult<Product> {
        let input = parse_create(&body)?;
        let product = self.repository.insert(input).await?;
        ProductMetrics::record_created(&product.category);
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, params: ListParams) -> ProductResult<ProductPage> {
        let started = Instant::now();
        let (filter, page) = query_from_params(&params);

        // Count and page are separate reads; no snapshot spans both
        let (total, products) = tokio::try_join!(
            self.repository.count(&filter),
            self.repository.find(&filter, page)
        )?;

        ProductMetrics::record_query("list", products.len(), started.elapsed().as_millis() as u64);
        Ok(ProductPage {
            products,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    #[instrument(skip(self))]
    pub async fn search_products(&self, query: Option<&str>) -> ProductResult<SearchResults> {
        let started = Instant::now();
        let query = query.map(sanitize).filter(|q| !q.is_empty()).ok_or_else(|| {
            ProductError::Validation("Search query 'q' is required".to_string())
        })?;

        let products = self.repository.search(&query, SEARCH_RESULT_LIMIT).await?;

        ProductMetrics::record_query("search", products.len(), started.elapsed().as_millis() as u64);
        Ok(SearchResults {
            count: products.len(),
            products,
        })
    }

    #[instrument(skip(self))]
    pub async fn product_stats(&self) -> ProductResult<ProductStats> {
        self.repository.stats().await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ObjectId) -> ProductResult<Product> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_hex()))
    }

    /// Full replace: every supplied field must be valid
    #[instrument(skip(self, body))]
    pub async fn replace_product(
        &self,
        id: ObjectId,
        body: Map<String, Value>,
    ) -> ProductResult<Product> {
        let changes = parse_replace(&body)?;
        let product = self
            .repository
            .update(id, changes)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_hex()))?;
        ProductMetrics::record_updated("replace");
        Ok(product)
    }

    /// Partial update: invalid fields are skipped
    #[instrument(skip(self, body))]
    pub async fn patch_product(
        &self,
        id: ObjectId,
        body: Map<String, Value>,
    ) -> ProductResult<Product> {
        let changes = parse_patch(&body)?;
        let product = self
            .repository
            .update(id, changes)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_hex()))?;
        ProductMetrics::record_updated("patch");
        Ok(product)
    }

    /// Increment, decrement or set stock.
    ///
    /// A decrement that would go below zero is rejected with
    /// [`ProductError::InsufficientStock`]. The store is queried a second time
    /// only when the guarded update matched nothing, to tell a missing product
    /// apart from a failed guard.
    #[instrument(skip(self, update))]
    pub async fn update_stock(&self, id: ObjectId, update: StockUpdate) -> ProductResult<Product> {
        update.validate()?;
        let (Some(quantity), Some(operation)) = (update.quantity, update.operation) else {
            return Err(ProductError::Validation(
                "quantity and operation are required".to_string(),
            ));
        };
        if quantity.fract() != 0.0 {
            return Err(ProductError::Validation(
                "quantity must be a whole number".to_string(),
            ));
        }
        if quantity >= i64::MAX as f64 {
            return Err(ProductError::Validation("quantity is too large".to_string()));
        }

        let change = StockChange::new(operation, quantity as i64);
        if let Some(product) = self.repository.apply_stock_change(id, change).await? {
            ProductMetrics::record_stock_mutation(operation.into(), StockOutcome::Applied);
            return Ok(product);
        }

        let current = match change {
            StockChange::Decrement(_) => self.repository.find_by_id(id).await?,
            _ => None,
        };

        match current {
            Some(product) => {
                ProductMetrics::record_stock_mutation(
                    operation.into(),
                    StockOutcome::Insufficient,
                );
                tracing::info!(
                    product_id = %id,
                    available = product.stock,
                    requested = change.quantity(),
                    "Insufficient stock"
                );
                Err(ProductError::InsufficientStock {
                    available: product.stock,
                    requested: change.quantity(),
                })
            }
            None => {
                ProductMetrics::record_stock_mutation(operation.into(), StockOutcome::NotFound);
                Err(ProductError::NotFound(id.to_hex()))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ObjectId) -> ProductResult<DeletedProduct> {
        let product = self
            .repository
            .delete(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_hex()))?;
        ProductMetrics::record_deleted(1);

        Ok(DeletedProduct {
            message: "Product deleted successfully".to_string(),
            product,
        })
    }

    /// Delete every well-formed id in one store call. Malformed entries are
    /// skipped and reflected in `validIdsCount`.
    #[instrument(skip(self, request))]
    pub async fn bulk_delete(&self, request: BulkDeleteRequest) -> ProductResult<BulkDeleteResult> {
        let ids = request
            .ids
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| ProductError::Validation("ids must be a non-empty array".to_string()))?;

        let requested_count = ids.len();
        let valid: Vec<ObjectId> = ids
            .iter()
            .filter_map(|v| v.as_str().and_then(|s| ObjectId::parse_str(s).ok()))
            .collect();
        let valid_ids_count = valid.len();

        if valid.is_empty() {
            return Err(ProductError::Validation(
                "No valid product IDs provided".to_string(),
            ));
        }

        let deleted_count = self.repository.delete_many(valid).await?;
        ProductMetrics::record_deleted(deleted_count);
        tracing::info!(requested_count, valid_ids_count, deleted_count, "Bulk delete completed");

        Ok(BulkDeleteResult {
            message: format!("{} products deleted", deleted_count),
            deleted_count,
            requested_count,
            valid_ids_count,
        })
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

/// Translate list query parameters into a filter and page window.
///
/// - `page` below 1 or unparsable becomes 1
/// - `limit` unparsable or 0 becomes 10, otherwise clamped to 1..=100
/// - unknown `sort` fields sort by `createdAt`, unknown `order` is `desc`
/// - unparsable price bounds are ignored
pub fn query_from_params(params: &ListParams) -> (ProductFilter, PageRequest) {
    fn trimmed(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    let page = trimmed(&params.page)
        .and_then(|p| p.parse::<i64>().ok())
        .map_or(1, |p| p.max(1) as u64);

    let limit = match trimmed(&params.limit).and_then(|l| l.parse::<i64>().ok()) {
        None | Some(0) => DEFAULT_PAGE_LIMIT,
        Some(l) => l.clamp(1, MAX_PAGE_LIMIT as i64) as u64,
    };

    let sort = trimmed(&params.sort)
        .and_then(|s| SortField::from_str(s).ok())
        .unwrap_or_default();
    let order = trimmed(&params.order)
        .and_then(|o| SortOrder::from_str(&o.to_lowercase()).ok())
        .unwrap_or_default();

    let price = |value: &Option<String>| {
        trimmed(value)
            .and_then(|p| p.parse::<f64>().ok())
            .filter(|p| p.is_finite())
    };

    let filter = ProductFilter {
        category: trimmed(&params.category)
            .map(sanitize)
            .filter(|c| !c.is_empty()),
        min_price: price(&params.min_price),
        max_price: price(&params.max_price),
        in_stock: trimmed(&params.in_stock).is_some_and(|v| v.eq_ignore_ascii_case("true")),
    };

    (
        filter,
        PageRequest {
            page,
            limit,
            sort,
            order,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProduct, StockOperation, now_millis};
    use crate::repository::MockProductRepository;
    use mockall::predicate::*;
    use serde_json::json;

    fn sample(stock: i64) -> Product {
        Product::new(
            ObjectId::new().to_hex(),
            NewProduct {
                name: "Laptop".into(),
                price: 999.99,
                description: String::new(),
                category: "Electronics".into(),
                stock,
            },
            now_millis(),
        )
    }

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let map: Map<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect();
        serde_json::from_value(Value::Object(map)).unwrap()
    }

    fn stock(quantity: f64, operation: StockOperation) -> StockUpdate {
        StockUpdate {
            quantity: Some(quantity),
            operation: Some(operation),
        }
    }

    #[test]
    fn test_query_defaults() {
        let (filter, page) = query_from_params(&ListParams::default());
        assert_eq!(filter, ProductFilter::default());
        assert_eq!(page, PageRequest::default());
    }

    #[test]
    fn test_query_clamps_and_parses() {
        let (filter, page) = query_from_params(&params(&[
            ("page", "0"),
            ("limit", "500"),
            ("sort", "price"),
            ("order", "ASC"),
            ("minPrice", "100"),
            ("maxPrice", "abc"),
            ("category", " Electronics "),
            ("inStock", "true"),
        ]));

        assert_eq!(page.page, 1);
        assert_eq!(page.limit, MAX_PAGE_LIMIT);
        assert_eq!(page.sort, SortField::Price);
        assert_eq!(page.order, SortOrder::Asc);
        assert_eq!(filter.min_price, Some(100.0));
        assert_eq!(filter.max_price, None);
        assert_eq!(filter.category.as_deref(), Some("Electronics"));
        assert!(filter.in_stock);
    }

    #[test]
    fn test_query_rejects_unknown_sort_field() {
        let (_, page) = query_from_params(&params(&[("sort", "password"), ("limit", "-3")]));
        assert_eq!(page.sort, SortField::CreatedAt);
        assert_eq!(page.limit, 1);
    }

    #[tokio::test]
    async fn test_decrement_success_skips_existence_check() {
        let id = ObjectId::new();
        let mut repo = MockProductRepository::new();
        repo.expect_apply_stock_change()
            .with(eq(id), eq(StockChange::Decrement(5)))
            .times(1)
            .returning(|_, _| Ok(Some(sample(45))));
        repo.expect_find_by_id().never();

        let service = ProductService::new(repo);
        let product = service
            .update_stock(id, stock(5.0, StockOperation::Decrement))
            .await
            .unwrap();
        assert_eq!(product.stock, 45);
    }

    #[tokio::test]
    async fn test_failed_guard_reports_insufficient_stock() {
        let id = ObjectId::new();
        let mut repo = MockProductRepository::new();
        repo.expect_apply_stock_change()
            .returning(|_, _| Ok(None));
        repo.expect_find_by_id()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(Some(sample(50))));

        let service = ProductService::new(repo);
        let err = service
            .update_stock(id, stock(51.0, StockOperation::Decrement))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProductError::InsufficientStock {
                available: 50,
                requested: 51
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_guard_on_missing_product_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_apply_stock_change().returning(|_, _| Ok(None));
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = ProductService::new(repo);
        let err = service
            .update_stock(ObjectId::new(), stock(1.0, StockOperation::Decrement))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_increment_on_missing_product_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_apply_stock_change().returning(|_, _| Ok(None));
        repo.expect_find_by_id().never();

        let service = ProductService::new(repo);
        let err = service
            .update_stock(ObjectId::new(), stock(1.0, StockOperation::Increment))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_quantities_never_reach_store() {
        let mut repo = MockProductRepository::new();
        repo.expect_apply_stock_change().never();
        let service = ProductService::new(repo);

        for update in [
            stock(0.0, StockOperation::Set),
            stock(-2.0, StockOperation::Increment),
            stock(1.5, StockOperation::Decrement),
            stock(1e19, StockOperation::Increment),
            stock(i64::MAX as f64, StockOperation::Set),
            StockUpdate {
                quantity: None,
                operation: Some(StockOperation::Increment),
            },
            StockUpdate {
                quantity: Some(3.0),
                operation: None,
            },
        ] {
            let err = service
                .update_stock(ObjectId::new(), update)
                .await
                .unwrap_err();
            assert!(matches!(err, ProductError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_bulk_delete_filters_malformed_ids() {
        let real = ObjectId::new();
        let mut repo = MockProductRepository::new();
        repo.expect_delete_many()
            .withf(move |ids| ids == &vec![real])
            .times(1)
            .returning(|ids| Ok(ids.len() as u64));

        let service = ProductService::new(repo);
        let result = service
            .bulk_delete(BulkDeleteRequest {
                ids: Some(vec![json!(real.to_hex()), json!("not-an-id"), json!(42)]),
            })
            .await
            .unwrap();

        assert_eq!(result.requested_count, 3);
        assert_eq!(result.valid_ids_count, 1);
        assert_eq!(result.deleted_count, 1);
    }

    #[tokio::test]
    async fn test_bulk_delete_requires_valid_ids() {
        let mut repo = MockProductRepository::new();
        repo.expect_delete_many().never();
        let service = ProductService::new(repo);

        for request in [
            BulkDeleteRequest { ids: None },
            BulkDeleteRequest { ids: Some(vec![]) },
            BulkDeleteRequest {
                ids: Some(vec![json!("abc")]),
            },
        ] {
            let err = service.bulk_delete(request).await.unwrap_err();
            assert!(matches!(err, ProductError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let mut repo = MockProductRepository::new();
        repo.expect_search().never();
        let service = ProductService::new(repo);

        for q in [None, Some(""), Some("   "), Some("<>")] {
            assert!(service.search_products(q).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_search_sanitizes_query() {
        let mut repo = MockProductRepository::new();
        repo.expect_search()
            .withf(|q, limit| q == "laptop" && *limit == SEARCH_RESULT_LIMIT)
            .returning(|_, _| Ok(vec![]));

        let service = ProductService::new(repo);
        let results = service.search_products(Some(" <laptop> ")).await.unwrap();
        assert_eq!(results.count, 0);
    }

    #[tokio::test]
    async fn test_store_error_surfaces_as_database_error() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Err(ProductError::Database("connection reset".into())));

        let service = ProductService::new(repo);
        let err = service.get_product(ObjectId::new()).await.unwrap_err();
        assert!(matches!(err, ProductError::Database(_)));
    }
}
