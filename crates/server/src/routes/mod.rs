//! HTTP route handlers for the catalog API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                  - Liveness (always 200)
//! GET    /health/ready                            - Readiness (store ping)
//!
//! # Products
//! GET    /api/v1/products                         - All products
//! POST   /api/v1/products                         - Add product (201, echoes body)
//! GET    /api/v1/products/{id}                    - One product
//! PUT    /api/v1/products/{id}                    - Update product
//! DELETE /api/v1/products/{id}                    - Delete product
//! GET    /api/v1/products/category/{category}     - Products in a category
//! GET    /api/v1/products/brand/{brand_id}        - Products of a brand
//! GET    /api/v1/products/search?name=...         - Name/description search
//!
//! # Brands
//! GET    /api/v1/brand                            - All brands
//! POST   /api/v1/brand                            - Add brand (201, echoes body)
//! GET    /api/v1/brand/{brand_id}                 - One brand
//! PUT    /api/v1/brand/{brand_id}                 - Update brand
//! DELETE /api/v1/brand/{brand_id}                 - Delete brand
//! GET    /api/v1/about/{brand_id}                 - About page of a brand
//!
//! # Branches
//! GET    /api/v1/branches                         - All branches
//! GET    /api/v1/branches/brand/{brand_id}        - Branches of a brand
//! GET    /api/v1/branches/brand/{brand_id}/province/{province}
//!
//! # Cart
//! GET    /api/v1/cart                             - Cart lines with line totals
//! POST   /api/v1/cart                             - Add product to cart
//! DELETE /api/v1/cart/{cart_id}                   - Remove a cart line
//! ```

pub mod brands;
pub mod branches;
pub mod cart;
pub mod health;
pub mod products;

use axum::{
    Router,
    routing::{delete, get},
};
use serde::Serialize;

use crate::state::AppState;

/// Response body for updates and deletes.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub message: &'static str,
    pub rows_affected: u64,
}

/// Create the versioned API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Products
        .route("/products", get(products::list).post(products::create))
        .route("/products/search", get(products::search))
        .route("/products/category/{category}", get(products::by_category))
        .route("/products/brand/{brand_id}", get(products::by_brand))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::remove),
        )
        // Brands
        .route("/brand", get(brands::list).post(brands::create))
        .route(
            "/brand/{brand_id}",
            get(brands::show).put(brands::update).delete(brands::remove),
        )
        .route("/about/{brand_id}", get(brands::about))
        // Branches
        .route("/branches", get(branches::list))
        .route("/branches/brand/{brand_id}", get(branches::by_brand))
        .route(
            "/branches/brand/{brand_id}/province/{province}",
            get(branches::by_brand_and_province),
        )
        // Cart
        .route("/cart", get(cart::list).post(cart::add))
        .route("/cart/{cart_id}", delete(cart::remove))
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::live))
        .route("/ready", get(health::ready))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use clothes_catalog_core::{AboutPage, AboutPageId, Branch, BranchId};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::build_router;
    use crate::db::MemoryStore;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::state::AppState;

    const ORIGIN: &str = "http://localhost:3000";

    fn app(store: &Arc<MemoryStore>) -> axum::Router {
        let state = AppState::new(store.clone(), Duration::from_secs(5));
        build_router(state, ORIGIN)
    }

    async fn send(
        app: axum::Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn shirt() -> Value {
        json!({
            "category": "men",
            "imgsrc": "shirt.png",
            "name": "Oxford Shirt",
            "description": "Cotton",
            "brand": 1,
            "price": 890.0,
            "isnew": true
        })
    }

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let (status, _) = send(app(&store), "POST", "/api/v1/products", Some(shirt())).await;
        assert_eq!(status, StatusCode::CREATED);
        store
    }

    #[tokio::test]
    async fn test_health() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = send(app(&store), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn test_readiness_follows_store_connection() {
        let store = Arc::new(MemoryStore::new());
        let (status, _) = send(app(&store), "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);

        store.disconnect();
        let (status, _) = send(app(&store), "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_create_echoes_input() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = send(app(&store), "POST", "/api/v1/products", Some(shirt())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Oxford Shirt");
        assert_eq!(body["imgsrc"], "shirt.png");
        assert!(body.get("id").is_none());
    }

    #[tokio::test]
    async fn test_get_product() {
        let store = seeded().await;

        let (status, body) = send(app(&store), "GET", "/api/v1/products/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["brand"], 1);
        assert_eq!(body["isnew"], true);

        let (status, body) = send(app(&store), "GET", "/api/v1/products/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "product 99 not found" }));
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let store = seeded().await;
        let (status, body) = send(app(&store), "GET", "/api/v1/products/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = send(
            app(&store),
            "POST",
            "/api/v1/products",
            Some(json!({ "name": "missing fields" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_update_and_delete_report_rows_affected() {
        let store = seeded().await;

        let mut changed = shirt();
        changed["name"] = json!("Linen Shirt");
        let (status, body) =
            send(app(&store), "PUT", "/api/v1/products/1", Some(changed.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows_affected"], 1);

        let (_, body) = send(app(&store), "PUT", "/api/v1/products/42", Some(changed)).await;
        assert_eq!(body["rows_affected"], 0);

        let (status, body) = send(app(&store), "DELETE", "/api/v1/products/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Product deleted", "rows_affected": 1 }));
    }

    #[tokio::test]
    async fn test_product_filters_and_search() {
        let store = seeded().await;

        let (_, body) = send(app(&store), "GET", "/api/v1/products/category/men", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = send(app(&store), "GET", "/api/v1/products/brand/2", None).await;
        assert_eq!(body, json!([]));

        let (_, body) = send(app(&store), "GET", "/api/v1/products/search?name=OXFORD", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = send(app(&store), "GET", "/api/v1/products/search?name=denim", None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_brand_routes() {
        let store = Arc::new(MemoryStore::new());
        let brand = json!({ "brandname": "Acme", "brandlogo": "acme.svg" });

        let (status, body) = send(app(&store), "POST", "/api/v1/brand", Some(brand)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["brandname"], "Acme");

        let (status, body) = send(app(&store), "GET", "/api/v1/brand/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": "1", "brandname": "Acme", "brandlogo": "acme.svg" }));

        let (status, _) = send(app(&store), "GET", "/api/v1/brand/%20", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(app(&store), "DELETE", "/api/v1/brand/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows_affected"], 1);
    }

    #[tokio::test]
    async fn test_about_and_branches() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_about_page(AboutPage {
                id: AboutPageId::new(1),
                brand_id: 3,
                image: "about.png".to_owned(),
                title: "Since 1990".to_owned(),
                description: "Family run".to_owned(),
            })
            .await;
        for (id, province) in [(1, "Bangkok"), (2, "Chiang Mai")] {
            store
                .insert_branch(Branch {
                    id: BranchId::new(id),
                    brand_id: 3,
                    province: province.to_owned(),
                    name: format!("Branch {id}"),
                    location: "Main street".to_owned(),
                })
                .await;
        }

        let (status, body) = send(app(&store), "GET", "/api/v1/about/3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["img"], "about.png");

        let (status, _) = send(app(&store), "GET", "/api/v1/about/4", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(app(&store), "GET", "/api/v1/branches/brand/3", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = send(
            app(&store),
            "GET",
            "/api/v1/branches/brand/3/province/Bangkok",
            None,
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["banch"], "Branch 1");
    }

    #[tokio::test]
    async fn test_cart_flow() {
        let store = seeded().await;

        let (status, body) = send(
            app(&store),
            "POST",
            "/api/v1/cart",
            Some(json!({ "product_id": 1, "quantity": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "inserted");

        let (_, body) = send(
            app(&store),
            "POST",
            "/api/v1/cart",
            Some(json!({ "product_id": 1, "quantity": 2 })),
        )
        .await;
        assert_eq!(body["result"], "incremented");

        let (status, body) = send(app(&store), "GET", "/api/v1/cart", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["quantity"], 3);
        assert_eq!(body[0]["price"], 2670.0);
        assert_eq!(body[0]["name"], "Oxford Shirt");

        let (status, body) = send(app(&store), "DELETE", "/api/v1/cart/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows_affected"], 1);
    }

    #[tokio::test]
    async fn test_cart_rejects_bad_quantity_and_unknown_product() {
        let store = seeded().await;

        let (status, body) = send(
            app(&store),
            "POST",
            "/api/v1/cart",
            Some(json!({ "product_id": 1, "quantity": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("quantity"));

        let (status, _) = send(
            app(&store),
            "POST",
            "/api/v1/cart",
            Some(json!({ "product_id": 77, "quantity": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_lost_connection_is_service_unavailable() {
        let store = seeded().await;
        store.disconnect();

        let (status, body) = send(app(&store), "GET", "/api/v1/products", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({ "error": "Database unavailable" }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let store = Arc::new(MemoryStore::new().with_latency(Duration::from_secs(30)));
        let (status, _) = send(app(&store), "GET", "/api/v1/brand", None).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_request_id_and_cors_headers() {
        let store = Arc::new(MemoryStore::new());
        let response = app(&store)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, ORIGIN)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            ORIGIN
        );
    }
}
