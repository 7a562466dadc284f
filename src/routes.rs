//! HTTP router.
//!
//! Public routes (health, sign-in, customer links, tracking) are merged
//! with staff routes that sit behind the session middleware.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, middleware, state::AppState};

pub fn router(state: AppState) -> Router {
    // Create authenticated routes (staff API endpoints)
    let staff_routes = Router::new()
        .route("/api/v1/auth/sign-out", post(handlers::auth::sign_out))
        .route("/api/v1/auth/me", get(handlers::auth::me))
        // Orders
        .route(
            "/api/v1/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route(
            "/api/v1/orders/{id}",
            get(handlers::orders::get_order)
                .patch(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        .route(
            "/api/v1/orders/{id}/advance",
            post(handlers::orders::advance_order),
        )
        .route(
            "/api/v1/orders/{id}/status",
            axum::routing::put(handlers::orders::set_order_status),
        )
        .route("/api/v1/dashboard", get(handlers::orders::dashboard))
        // Customer links
        .route(
            "/api/v1/customer-links",
            post(handlers::customer_links::issue_link).get(handlers::customer_links::list_links),
        )
        // Menu
        .route(
            "/api/v1/products",
            post(handlers::menu::create_product).get(handlers::menu::list_products),
        )
        .route(
            "/api/v1/products/{id}",
            get(handlers::menu::get_product)
                .patch(handlers::menu::update_product)
                .delete(handlers::menu::delete_product),
        )
        .route(
            "/api/v1/addons",
            post(handlers::menu::create_addon).get(handlers::menu::list_addons),
        )
        .route(
            "/api/v1/addons/{id}",
            get(handlers::menu::get_addon)
                .patch(handlers::menu::update_addon)
                .delete(handlers::menu::delete_addon),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        // Public routes (no staff session required)
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/auth/sign-in", post(handlers::auth::sign_in))
        .route("/customer/{token}", get(handlers::customer::open_link))
        .route(
            "/customer/{token}/orders",
            post(handlers::customer::place_order),
        )
        .route("/track/{order_id}", get(handlers::customer::track_order))
        .merge(staff_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{
        clock::ManualClock,
        config::Config,
        services::auth_service::StoreAuthProvider,
        store::{DocumentStore, MemoryDocumentStore},
    };

    struct TestApp {
        router: Router,
        session: String,
    }

    async fn app() -> TestApp {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 14, 2, 0, 0).unwrap(),
        ));
        let auth = Arc::new(StoreAuthProvider::new(store.clone(), clock.clone(), 12));
        auth.create_staff("barista@example.com", "espresso-shot")
            .await
            .unwrap();
        let config = Config {
            public_origin: "https://shop.example.ph".to_string(),
            ..Config::default()
        };
        let state = AppState::new(&config, store, clock, auth).unwrap();
        let router = router(state);

        let response = send(
            &router,
            Method::POST,
            "/api/v1/auth/sign-in",
            None,
            Some(json!({ "email": "barista@example.com", "password": "espresso-shot" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = body(response).await["session_token"]
            .as_str()
            .unwrap()
            .to_string();

        TestApp { router, session }
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        session: Option<&str>,
        json: Option<Value>,
    ) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(session) = session {
            request = request.header(header::AUTHORIZATION, format!("Bearer {session}"));
        }
        let request = match json {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        router.clone().oneshot(request).await.unwrap()
    }

    async fn body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    impl TestApp {
        async fn staff(&self, method: Method, uri: &str, json: Option<Value>) -> Response {
            send(&self.router, method, uri, Some(&self.session), json).await
        }

        async fn public(&self, method: Method, uri: &str, json: Option<Value>) -> Response {
            send(&self.router, method, uri, None, json).await
        }

        async fn latte_selection(&self) -> Value {
            let product = self
                .staff(
                    Method::POST,
                    "/api/v1/products",
                    Some(json!({
                        "name": "Latte",
                        "base_price_cents": 12000,
                        "category": "espresso-based"
                    })),
                )
                .await;
            assert_eq!(product.status(), StatusCode::CREATED);
            let product = body(product).await;

            let addon = self
                .staff(
                    Method::POST,
                    "/api/v1/addons",
                    Some(json!({ "name": "Extra Shot", "price_cents": 2000, "type": "shot" })),
                )
                .await;
            assert_eq!(addon.status(), StatusCode::CREATED);
            let addon = body(addon).await;

            json!({
                "product_id": product["id"],
                "quantity": 2,
                "size": "large",
                "addon_ids": [addon["id"]]
            })
        }
    }

    fn customer_order(selection: Value) -> Value {
        json!({
            "customer_name": "Ana Reyes",
            "customer_phone": "0917 123 4567",
            "customer_address": "12 Mabini St, Makati",
            "items": [selection]
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app().await;

        let response = app.public(Method::GET, "/health", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn staff_routes_require_a_session() {
        let app = app().await;

        let response = app.public(Method::GET, "/api/v1/orders", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(response).await["error"]["code"], "unauthorized");

        let response = send(
            &app.router,
            Method::GET,
            "/api/v1/auth/me",
            Some("not-a-session"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.staff(Method::GET, "/api/v1/auth/me", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await["email"], "barista@example.com");
    }

    #[tokio::test]
    async fn customer_link_checkout_and_tracking() {
        let app = app().await;
        let selection = app.latte_selection().await;

        let issued = app
            .staff(
                Method::POST,
                "/api/v1/customer-links",
                Some(json!({ "customer_name": "Ana Reyes" })),
            )
            .await;
        assert_eq!(issued.status(), StatusCode::CREATED);
        let issued = body(issued).await;
        let token = issued["token"].as_str().unwrap().to_string();
        assert_eq!(
            issued["url"],
            format!("https://shop.example.ph/customer/{token}")
        );

        let page = app
            .public(Method::GET, &format!("/customer/{token}"), None)
            .await;
        assert_eq!(page.status(), StatusCode::OK);
        let page = body(page).await;
        assert_eq!(page["customer_name"], "Ana Reyes");
        assert_eq!(page["menu"]["products"].as_array().unwrap().len(), 1);

        let placed = app
            .public(
                Method::POST,
                &format!("/customer/{token}/orders"),
                Some(customer_order(selection.clone())),
            )
            .await;
        assert_eq!(placed.status(), StatusCode::CREATED);
        let placed = body(placed).await;
        assert_eq!(placed["order"]["total_amount_cents"], 30000);
        let order_id = placed["order"]["id"].as_str().unwrap().to_string();
        assert_eq!(
            placed["tracking_url"],
            format!("https://shop.example.ph/track/{order_id}")
        );

        let again = app
            .public(
                Method::POST,
                &format!("/customer/{token}/orders"),
                Some(customer_order(selection)),
            )
            .await;
        assert_eq!(again.status(), StatusCode::GONE);
        assert_eq!(body(again).await["error"]["message"], "Customer link already used");

        let tracking = app
            .public(Method::GET, &format!("/track/{order_id}"), None)
            .await;
        assert_eq!(tracking.status(), StatusCode::OK);
        let tracking = body(tracking).await;
        assert_eq!(tracking["status_label"], "Order Received");
        assert_eq!(tracking["progress_percent"], 20);
        assert_eq!(
            tracking["estimated_delivery_message"],
            "We'll start preparing your order soon"
        );
    }

    #[tokio::test]
    async fn staff_advance_and_override() {
        let app = app().await;
        let selection = app.latte_selection().await;

        let created = app
            .staff(
                Method::POST,
                "/api/v1/orders",
                Some(customer_order(selection)),
            )
            .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = body(created).await;
        let id = created["id"].as_str().unwrap().to_string();

        let advanced = app
            .staff(Method::POST, &format!("/api/v1/orders/{id}/advance"), None)
            .await;
        assert_eq!(advanced.status(), StatusCode::OK);
        assert_eq!(body(advanced).await["status"], "preparing");

        // A write pinned to the revision before the advance is stale.
        let stale = app
            .staff(
                Method::PUT,
                &format!("/api/v1/orders/{id}/status"),
                Some(json!({ "status": "delivered", "revision": created["revision"] })),
            )
            .await;
        assert_eq!(stale.status(), StatusCode::CONFLICT);

        let jumped = app
            .staff(
                Method::PUT,
                &format!("/api/v1/orders/{id}/status"),
                Some(json!({ "status": "out-for-delivery", "notes": "Rider: Jun" })),
            )
            .await;
        assert_eq!(jumped.status(), StatusCode::OK);
        let jumped = body(jumped).await;
        assert_eq!(jumped["status_history"].as_array().unwrap().len(), 3);
        assert!(jumped["created_at"].is_string());
        assert!(jumped["status_history"][2]["timestamp"].is_string());

        let eta_set = app
            .staff(
                Method::PATCH,
                &format!("/api/v1/orders/{id}"),
                Some(json!({ "estimated_delivery_time": "2030-01-01T10:00:00Z" })),
            )
            .await;
        assert_eq!(
            body(eta_set).await["estimated_delivery_time"],
            "2030-01-01T10:00:00Z"
        );
        let eta_cleared = app
            .staff(
                Method::PATCH,
                &format!("/api/v1/orders/{id}"),
                Some(json!({ "estimated_delivery_time": null })),
            )
            .await;
        assert_eq!(eta_cleared.status(), StatusCode::OK);
        assert!(body(eta_cleared).await["estimated_delivery_time"].is_null());

        let listed = app
            .staff(Method::GET, "/api/v1/orders?status=out-for-delivery", None)
            .await;
        assert_eq!(body(listed).await.as_array().unwrap().len(), 1);

        let deleted = app
            .staff(Method::DELETE, &format!("/api/v1/orders/{id}"), None)
            .await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = app
            .public(Method::GET, &format!("/track/{id}"), None)
            .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_order_is_a_validation_error() {
        let app = app().await;

        let response = app
            .staff(
                Method::POST,
                "/api/v1/orders",
                Some(json!({
                    "customer_name": "Ana Reyes",
                    "customer_phone": "0917 123 4567",
                    "customer_address": "12 Mabini St",
                    "items": []
                })),
            )
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(response).await["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn sign_out_ends_the_session() {
        let app = app().await;

        let response = app.staff(Method::POST, "/api/v1/auth/sign-out", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.staff(Method::GET, "/api/v1/dashboard", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
