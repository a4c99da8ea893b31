use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;

use crate::api::error::ApiError;
use crate::api::handlers;
use crate::api::state::AppState;
use crate::store::traits::CityInfoStore;

pub fn create_router<S: CityInfoStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/api/testdatabase", get(handlers::test_database::<S>))
        // Cities
        .route("/api/cities", get(handlers::get_cities::<S>))
        .route("/api/cities/:city_id", get(handlers::get_city::<S>))
        // Points of interest, always reached through their city
        .route(
            "/api/cities/:city_id/pointsofinterest",
            get(handlers::get_points_of_interest::<S>)
                .post(handlers::create_point_of_interest::<S>),
        )
        .route(
            "/api/cities/:city_id/pointsofinterest/:id",
            get(handlers::get_point_of_interest::<S>)
                .put(handlers::update_point_of_interest::<S>)
                .patch(handlers::partially_update_point_of_interest::<S>)
                .delete(handlers::delete_point_of_interest::<S>),
        )
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Unexpected(anyhow::anyhow!("Handler panicked: {}", details)).into_response()
}
