//! Branch route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};

use clothes_catalog_core::{Branch, CatalogStore};

use crate::error::Result;
use crate::state::AppState;

/// List all branches.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Branch>>> {
    let branches = state.store().list_branches(&state.op_context()).await?;
    Ok(Json(branches))
}

/// Branches of a brand.
pub async fn by_brand(
    State(state): State<AppState>,
    brand_id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<Branch>>> {
    let Path(brand_id) = brand_id?;
    let branches = state
        .store()
        .branches_by_brand(&state.op_context(), brand_id)
        .await?;
    Ok(Json(branches))
}

/// Branches of a brand in one province.
pub async fn by_brand_and_province(
    State(state): State<AppState>,
    path: std::result::Result<Path<(i32, String)>, PathRejection>,
) -> Result<Json<Vec<Branch>>> {
    let Path((brand_id, province)) = path?;
    let branches = state
        .store()
        .branches_by_brand_and_province(&state.op_context(), brand_id, &province)
        .await?;
    Ok(Json(branches))
}
