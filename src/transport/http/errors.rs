use crate::domain::error::CheckoutError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub struct ApiError {
    err: CheckoutError,
    gateway_code: &'static str,
    status: Option<StatusCode>,
}

impl ApiError {
    /// A request the extractors could not parse. Oversized bodies and a
    /// wrong content type keep their own status; everything else is 422.
    pub fn rejected(status: StatusCode, message: String) -> Self {
        let status = match status {
            StatusCode::PAYLOAD_TOO_LARGE | StatusCode::UNSUPPORTED_MEDIA_TYPE => Some(status),
            _ => None,
        };
        Self {
            err: CheckoutError::Validation(message),
            gateway_code: "gateway_error",
            status,
        }
    }

    /// Gateway failures during verification mean "we don't know yet",
    /// never "payment failed".
    pub fn verification(err: CheckoutError) -> Self {
        Self {
            err,
            gateway_code: "payment_status_unknown",
            status: None,
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        Self {
            err,
            gateway_code: "gateway_error",
            status: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.err {
            CheckoutError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            CheckoutError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            CheckoutError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            CheckoutError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            CheckoutError::Gateway { status, body } => {
                tracing::error!(upstream_status = ?status, body = %body, "gateway error");
                let message = match self.gateway_code {
                    "payment_status_unknown" => {
                        "payment status could not be verified, please check again shortly"
                    }
                    _ => "payment gateway unavailable, please try again",
                };
                (StatusCode::BAD_GATEWAY, self.gateway_code, message.to_string())
            }
            CheckoutError::Database(err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            CheckoutError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
            "error": message,
        });

        (self.status.unwrap_or(status), Json(body)).into_response()
    }
}
