//! HTTP handlers for Products API

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_helpers::{
    ObjectIdPath, Payload, QueryParams, ValidatedJson,
    errors::responses::{
        BadRequestIdResponse, BadRequestResponse, InsufficientStockResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{
    BulkDeleteRequest, BulkDeleteResult, CategoryStats, DeletedProduct, ListParams, Pagination,
    Product, ProductInput, ProductPage, ProductStats, SearchParams, SearchResults, StatsOverview,
    StockOperation, StockUpdate,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        search_products,
        product_stats,
        get_product,
        replace_product,
        patch_product,
        update_stock,
        delete_product,
        bulk_delete,
    ),
    components(
        schemas(
            Product, ProductInput, ProductPage, Pagination, SearchResults,
            ProductStats, StatsOverview, CategoryStats, StockUpdate, StockOperation,
            DeletedProduct, BulkDeleteRequest, BulkDeleteResult
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestIdResponse,
            InsufficientStockResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product catalogue and inventory endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/stats", get(product_stats))
        .route("/bulk-delete", post(bulk_delete))
        .route(
            "/{id}",
            get(get_product)
                .put(replace_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .route("/{id}/stock", patch(update_stock))
        .with_state(shared_service)
}

/// List products with pagination, filtering and sorting
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ListParams),
    responses(
        (status = 200, description = "One page of products", body = ProductPage),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    QueryParams(params): QueryParams<ListParams>,
) -> ProductResult<Json<ProductPage>> {
    let page = service.list_products(params).await?;
    Ok(Json(page))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created successfully", body = Product),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Payload(body): Payload<Map<String, Value>>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create_product(body).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Search products by name, description or category
#[utoipa::path(
    get,
    path = "/search",
    tag = "Products",
    params(SearchParams),
    responses(
        (status = 200, description = "Up to 50 matches, newest first", body = SearchResults),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    QueryParams(params): QueryParams<SearchParams>,
) -> ProductResult<Json<SearchResults>> {
    let results = service.search_products(params.q.as_deref()).await?;
    Ok(Json(results))
}

/// Catalogue-wide statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "Products",
    responses(
        (status = 200, description = "Overview and per-category breakdown", body = ProductStats),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn product_stats<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> ProductResult<Json<ProductStats>> {
    let stats = service.product_stats().await?;
    Ok(Json(stats))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> ProductResult<Json<Product>> {
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

/// Replace product fields; every supplied field must be valid
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated successfully", body = Product),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn replace_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
    Payload(body): Payload<Map<String, Value>>,
) -> ProductResult<Json<Product>> {
    let product = service.replace_product(id, body).await?;
    Ok(Json(product))
}

/// Partially update a product; invalid fields are ignored
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated successfully", body = Product),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn patch_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
    Payload(body): Payload<Map<String, Value>>,
) -> ProductResult<Json<Product>> {
    let product = service.patch_product(id, body).await?;
    Ok(Json(product))
}

/// Increment, decrement or set stock atomically
#[utoipa::path(
    patch,
    path = "/{id}/stock",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    request_body = StockUpdate,
    responses(
        (status = 200, description = "Stock updated", body = Product),
        (status = 400, response = InsufficientStockResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_stock<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
    ValidatedJson(update): ValidatedJson<StockUpdate>,
) -> ProductResult<Json<Product>> {
    let product = service.update_stock(id, update).await?;
    Ok(Json(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Product deleted", body = DeletedProduct),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> ProductResult<Json<DeletedProduct>> {
    let deleted = service.delete_product(id).await?;
    Ok(Json(deleted))
}

/// Delete several products in one call
#[utoipa::path(
    post,
    path = "/bulk-delete",
    tag = "Products",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Products deleted", body = BulkDeleteResult),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn bulk_delete<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Payload(request): Payload<BulkDeleteRequest>,
) -> ProductResult<Json<BulkDeleteResult>> {
    let result = service.bulk_delete(request).await?;
    Ok(Json(result))
}
