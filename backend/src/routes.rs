// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    handlers::{mock_test, session},
    openapi::ApiDoc,
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public catalogue routes, student session routes (token required) and
///   admin authoring routes (token + admin role).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store + config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let session_routes = Router::new()
        .route("/{id}/start", post(session::start_test))
        .route("/{id}/submission", get(session::get_submission))
        .route("/{id}/answers", put(session::record_answer))
        .route("/{id}/finish", post(session::finish_test))
        .route("/{id}/review", get(session::review_test))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let mock_test_routes = Router::new()
        .route("/", get(mock_test::list_mock_tests))
        .route("/{id}", get(mock_test::get_mock_test))
        .merge(session_routes);

    let admin_routes = Router::new()
        .route("/mock-tests", post(mock_test::create_mock_test))
        .route(
            "/mock-tests/{id}",
            get(mock_test::admin_get_mock_test).put(mock_test::replace_mock_test),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/mock-tests", mock_test_routes)
        .nest("/api/admin", admin_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
