pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::middleware::trace_requests;

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(
            "/students",
            post(handlers::create_student).get(handlers::list_students),
        )
        .route(
            "/students/",
            post(handlers::create_student).get(handlers::list_students),
        )
        .route(
            "/students/{id}",
            get(handlers::get_student).delete(handlers::delete_student),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn(trace_requests))
}
