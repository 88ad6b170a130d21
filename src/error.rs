use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use rust_decimal::Decimal;
use sea_orm::DbErr;
use thiserror::Error;

use crate::services::paypal::GatewayError;

/// Erreur commune à toutes les routes.
/// Le corps JSON reste `{"error": "..."}` comme dans les réponses d'erreur des handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Insufficient balance: {available} available, {required} required")]
    InsufficientBalance { available: Decimal, required: Decimal },

    #[error("Insufficient points: {available} available, {required} required")]
    InsufficientPoints { available: i64, required: i64 },

    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    #[error("File too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::InsufficientBalance { .. }
            | AppError::InsufficientPoints { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let body = match self {
            AppError::InsufficientBalance { available, required } => serde_json::json!({
                "error": "Insufficient balance",
                "available": available,
                "required": required,
            }),
            AppError::InsufficientPoints { available, required } => serde_json::json!({
                "error": "Insufficient points",
                "available": available,
                "required": required,
            }),
            // Ne pas exposer le détail des erreurs internes
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
                serde_json::json!({ "error": "Internal server error" })
            }
            AppError::Gateway(_) => {
                tracing::error!(error = %self, "payment gateway error");
                serde_json::json!({ "error": self.to_string() })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::PayloadTooLarge { limit: 10 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::Database(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_internal_error_hides_details() {
        let resp = AppError::Database(DbErr::Custom("secret table name".into())).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[actix_web::test]
    async fn test_insufficient_balance_body() {
        let err = AppError::InsufficientBalance {
            available: Decimal::new(500, 2),
            required: Decimal::new(1000, 2),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Insufficient balance");
        assert_eq!(json["required"], "10.00");
    }
}
