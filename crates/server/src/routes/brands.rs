//! Brand and about page route handlers.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use clothes_catalog_core::{AboutPage, Brand, BrandId, BrandInput, CatalogStore};

use super::MutationResponse;
use crate::error::Result;
use crate::state::AppState;

/// List all brands.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Brand>>> {
    let brands = state.store().list_brands(&state.op_context()).await?;
    Ok(Json(brands))
}

/// Show one brand.
pub async fn show(
    State(state): State<AppState>,
    Path(brand_id): Path<String>,
) -> Result<Json<Brand>> {
    let id = BrandId::parse(&brand_id)?;
    let brand = state.store().get_brand(&state.op_context(), &id).await?;
    Ok(Json(brand))
}

/// Add a brand. Echoes the accepted input.
pub async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<BrandInput>, JsonRejection>,
) -> Result<(StatusCode, Json<BrandInput>)> {
    let Json(input) = body?;
    let created = state.store().add_brand(&state.op_context(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace a brand's name and logo.
pub async fn update(
    State(state): State<AppState>,
    Path(brand_id): Path<String>,
    body: std::result::Result<Json<BrandInput>, JsonRejection>,
) -> Result<Json<MutationResponse>> {
    let id = BrandId::parse(&brand_id)?;
    let Json(input) = body?;
    let rows_affected = state
        .store()
        .update_brand(&state.op_context(), &id, input)
        .await?;
    Ok(Json(MutationResponse {
        message: "Brand updated",
        rows_affected,
    }))
}

/// Delete a brand.
pub async fn remove(
    State(state): State<AppState>,
    Path(brand_id): Path<String>,
) -> Result<Json<MutationResponse>> {
    let id = BrandId::parse(&brand_id)?;
    let rows_affected = state.store().delete_brand(&state.op_context(), &id).await?;
    Ok(Json(MutationResponse {
        message: "Brand deleted",
        rows_affected,
    }))
}

/// The about page of a brand.
pub async fn about(
    State(state): State<AppState>,
    brand_id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<AboutPage>> {
    let Path(brand_id) = brand_id?;
    let page = state
        .store()
        .about_page_by_brand(&state.op_context(), brand_id)
        .await?;
    Ok(Json(page))
}
