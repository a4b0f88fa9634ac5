//! axum integration
//!
//! Renders engine errors as HTTP responses and converts request methods
//! into verbs. Denials become `403 Forbidden`, or `303 See Other` when the
//! caller asked for a redirect; missing resources become `404 Not Found`.

use axum::http::{header::LOCATION, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::{error, info};

use crate::error::AuthzError;
use crate::load::Verb;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AuthzError::Unauthorized(failure) => {
                if let Some(location) = failure.redirect_to() {
                    match HeaderValue::try_from(location) {
                        Ok(value) => {
                            info!("Denied {}, redirecting to {}", failure, location);
                            return (StatusCode::SEE_OTHER, [(LOCATION, value)]).into_response();
                        }
                        Err(e) => {
                            error!("Invalid redirect target {:?}: {}", location, e);
                        }
                    }
                }

                info!("Denied {}", failure);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse::new("forbidden", failure.to_string()),
                )
            }
            err @ AuthzError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("not_found", err.to_string()),
            ),
            AuthzError::InvalidInput(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("bad_request", message),
            ),
            err => {
                error!("Request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal_error", err.to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<&Method> for Verb {
    fn from(method: &Method) -> Self {
        Verb::parse(method.as_str())
    }
}
