//! dockbook-api — HTTP surface of the webapp.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/info` | Static HTML banner |
//! | GET | `/json` | Stored `params` value, verbatim |
//! | POST | `/json`, `/json/` | Store the submitted parameters as a JSON object |

pub mod handlers;
pub mod params;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use dockbook_store::KvStore;

/// Key under which the posted parameters are stored.
pub const PARAMS_KEY: &str = "params";

/// Body of `GET /info`.
pub const INFO_PAGE: &str = "<h1>DockerBook Test Redis-enabled Sinatra app</h1>";

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn KvStore>,
}

/// Build the API router over `store`.
pub fn build_router(store: Arc<dyn KvStore>) -> Router {
    let state = ApiState { store };

    Router::new()
        .route("/info", get(handlers::info))
        .route("/json", get(handlers::get_params).post(handlers::post_params))
        .route("/json/", post(handlers::post_params))
        .with_state(state)
}
