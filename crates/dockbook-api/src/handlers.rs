//! Route handlers.
//!
//! Values are passed through to and from the store untouched; only errors
//! are wrapped in a JSON body.

use axum::Json;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Response};
use tracing::{debug, error, info, warn};

use dockbook_store::StoreError;

use crate::params::{encode_params, merge_params};
use crate::{ApiState, INFO_PAGE, PARAMS_KEY};

#[derive(serde::Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ErrorBody {
            success: false,
            error: msg.to_string(),
        }),
    )
        .into_response()
}

fn store_error_response(err: &StoreError) -> Response {
    let status = if err.is_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    warn!(error = %err, %status, "store request failed");
    error_response(&err.to_string(), status)
}

/// GET /info
pub async fn info() -> Html<&'static str> {
    Html(INFO_PAGE)
}

/// GET /json
pub async fn get_params(State(state): State<ApiState>) -> Response {
    match state.store.get(PARAMS_KEY).await {
        Ok(value) => {
            debug!(key = PARAMS_KEY, found = value.is_some(), "params read");
            (
                [(CONTENT_TYPE, "application/json")],
                value.unwrap_or_default(),
            )
                .into_response()
        }
        Err(e) => store_error_response(&e),
    }
}

/// POST /json
///
/// A body without a urlencoded content type contributes no parameters.
pub async fn post_params(
    State(state): State<ApiState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let query = match query {
        Ok(Query(pairs)) => pairs,
        Err(rejection) => return error_response(&rejection.body_text(), StatusCode::BAD_REQUEST),
    };
    let form = match form {
        Ok(Form(pairs)) => pairs,
        Err(FormRejection::InvalidFormContentType(_)) => Vec::new(),
        Err(rejection) => return error_response(&rejection.body_text(), rejection.status()),
    };

    let params = merge_params(query, form);
    let encoded = match encode_params(&params) {
        Ok(encoded) => encoded,
        Err(e) => {
            error!(error = %e, "failed to encode params");
            return error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match state.store.set(PARAMS_KEY, &encoded).await {
        Ok(()) => {
            info!(key = PARAMS_KEY, count = params.len(), "params stored");
            (StatusCode::OK, "OK").into_response()
        }
        Err(e) => store_error_response(&e),
    }
}
