pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    middleware::from_fn,
};
use tower_http::cors::CorsLayer;

use crate::middleware::log_request;
use crate::routes::routes;
use crate::state::AppState;
use crate::ws::ws_routes;

/// Full application: `/api` routes, `/ws` change feed, request logging and CORS.
pub fn app(app_state: AppState) -> Router {
    let cors = CorsLayer::very_permissive().expose_headers([CONTENT_DISPOSITION, CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes(app_state.clone()))
        .nest("/ws", ws_routes(app_state))
        .layer(from_fn(log_request))
        .layer(cors)
}
