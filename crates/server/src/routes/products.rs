//! Product route handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;

use clothes_catalog_core::{CatalogStore, Product, ProductId, ProductInput};

use super::MutationResponse;
use crate::error::Result;
use crate::state::AppState;

/// Query parameters for product search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Substring to look for. Missing or empty matches every product.
    #[serde(default)]
    pub name: String,
}

/// List all products.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.store().list_products(&state.op_context()).await?;
    Ok(Json(products))
}

/// Show one product.
pub async fn show(
    State(state): State<AppState>,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<Product>> {
    let Path(id) = id?;
    let product = state
        .store()
        .get_product(&state.op_context(), ProductId::new(id))
        .await?;
    Ok(Json(product))
}

/// Add a product. Echoes the accepted input.
pub async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductInput>)> {
    let Json(input) = body?;
    let created = state.store().add_product(&state.op_context(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace a product's writable fields.
pub async fn update(
    State(state): State<AppState>,
    id: std::result::Result<Path<i32>, PathRejection>,
    body: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<MutationResponse>> {
    let Path(id) = id?;
    let Json(input) = body?;
    let rows_affected = state
        .store()
        .update_product(&state.op_context(), ProductId::new(id), input)
        .await?;
    Ok(Json(MutationResponse {
        message: "Product updated",
        rows_affected,
    }))
}

/// Delete a product.
pub async fn remove(
    State(state): State<AppState>,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<MutationResponse>> {
    let Path(id) = id?;
    let rows_affected = state
        .store()
        .delete_product(&state.op_context(), ProductId::new(id))
        .await?;
    Ok(Json(MutationResponse {
        message: "Product deleted",
        rows_affected,
    }))
}

/// Products in a category.
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let products = state
        .store()
        .products_by_category(&state.op_context(), &category)
        .await?;
    Ok(Json(products))
}

/// Products of a brand.
pub async fn by_brand(
    State(state): State<AppState>,
    brand_id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<Product>>> {
    let Path(brand_id) = brand_id?;
    let products = state
        .store()
        .products_by_brand(&state.op_context(), brand_id)
        .await?;
    Ok(Json(products))
}

/// Case-insensitive search over product name and description.
pub async fn search(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>> {
    let Query(params) = params?;
    let products = state
        .store()
        .search_products(&state.op_context(), &params.name)
        .await?;
    Ok(Json(products))
}
