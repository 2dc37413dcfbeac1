use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::dtos::ErrorBody;
use crate::provider::ProviderError;
use crate::webhook::WebhookError;

/// Error type shared by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("missing query parameter: {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Webhook(err) => {
                (StatusCode::BAD_REQUEST, format!("Webhook Error: {err}")).into_response()
            }
            ApiError::Provider(ProviderError::Api(message)) => {
                json_error(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            ApiError::Provider(ProviderError::InvalidRequest(message)) => {
                json_error(StatusCode::BAD_REQUEST, message)
            }
            err @ ApiError::MissingParameter(_) => {
                json_error(StatusCode::BAD_REQUEST, err.to_string())
            }
        }
    }
}

fn json_error(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failures_are_internal_errors() {
        let response = ApiError::from(ProviderError::Api("No such coupon".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_requests_are_bad_requests() {
        let response =
            ApiError::from(ProviderError::InvalidRequest("bad id".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = ApiError::MissingParameter("session_id").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn webhook_failures_are_bad_requests() {
        let response = ApiError::from(WebhookError::SignatureMismatch).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
