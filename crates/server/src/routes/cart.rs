//! Cart route handlers.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::Serialize;

use clothes_catalog_core::{AddToCart, CartId, CartItem, CartUpsert, CatalogStore};

use super::MutationResponse;
use crate::error::Result;
use crate::state::AppState;

/// Response body for a successful add.
#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    pub message: &'static str,
    pub result: CartUpsert,
}

/// List cart lines.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CartItem>>> {
    let items = state.store().list_cart(&state.op_context()).await?;
    Ok(Json(items))
}

/// Add a product to the cart, merging with an existing line.
pub async fn add(
    State(state): State<AppState>,
    body: std::result::Result<Json<AddToCart>, JsonRejection>,
) -> Result<Json<AddToCartResponse>> {
    let Json(request) = body?;
    let (product_id, quantity) = request.validate()?;
    let result = state
        .store()
        .add_to_cart(&state.op_context(), product_id, quantity)
        .await?;
    Ok(Json(AddToCartResponse {
        message: "Product added to cart",
        result,
    }))
}

/// Remove a cart line.
pub async fn remove(
    State(state): State<AppState>,
    cart_id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<MutationResponse>> {
    let Path(cart_id) = cart_id?;
    let rows_affected = state
        .store()
        .remove_from_cart(&state.op_context(), CartId::new(cart_id))
        .await?;
    Ok(Json(MutationResponse {
        message: "Cart item removed",
        rows_affected,
    }))
}
