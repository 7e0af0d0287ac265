//! Failure responses.
//!
//! Every failure the Front Door can produce is answered with a JSON body so
//! callers never have to parse partial backend output.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::http::forwarder::ForwardError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
}

/// A failed Front Door request.
#[derive(Debug)]
pub struct ProxyError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ProxyError {
    pub fn unknown_pool(pool: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                error: format!("unknown pool {:?}", pool),
                pool: None,
            },
        }
    }

    pub fn no_route(path: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                error: format!("no route for {}", path),
                pool: None,
            },
        }
    }

    pub fn forward(pool: &str, error: &ForwardError) -> Self {
        Self {
            status: error.status_code(),
            body: ErrorBody {
                error: error.to_string(),
                pool: Some(pool.to_string()),
            },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
