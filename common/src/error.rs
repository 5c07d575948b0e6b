use actix_web::HttpResponse;
use thiserror::Error;
use uuid::Uuid;

use crate::payment::PaymentType;

pub type Res<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    JWT(#[from] jsonwebtoken::errors::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Stripe error: {0}")]
    Stripe(#[from] stripe::StripeError),

    // === APPLICATION ERRORS ===
    #[error("Authorization error: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payment required: {message}")]
    PaymentRequired {
        message: String,
        payment_type: PaymentType,
        appeal_id: Option<Uuid>,
    },

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn payment_required(payment_type: PaymentType) -> Self {
        let message = match payment_type {
            PaymentType::AdditionalAppeal => {
                "Your free appeal for this month has been used. Additional appeals require payment."
            }
            PaymentType::VehicleAddition => {
                "You already have a vehicle registered. Changing it requires payment."
            }
        };
        AppError::PaymentRequired {
            message: message.to_string(),
            payment_type,
            appeal_id: None,
        }
    }

    /// Attaches the analysis-only draft the caller can unlock after paying.
    pub fn with_appeal(self, id: Uuid) -> Self {
        match self {
            AppError::PaymentRequired {
                message,
                payment_type,
                ..
            } => AppError::PaymentRequired {
                message,
                payment_type,
                appeal_id: Some(id),
            },
            other => other,
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        let is_dev = cfg!(debug_assertions);

        let to_internal_json = |err_msg: &str| {
            if is_dev {
                serde_json::json!({ "error": err_msg })
            } else {
                serde_json::json!({ "error": "Internal server error" })
            }
        };

        match self {
            // === CONVERSION ERRORS ===
            AppError::Database(error) => {
                log::error!("Database error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::JWT(error) => {
                log::error!("JWT error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Reqwest(error) => {
                log::error!("Reqwest error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Stripe(error) => {
                log::error!("Stripe error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }

            // === APPLICATION ERRORS ===
            AppError::Unauthorized(_) => {
                HttpResponse::Unauthorized().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::NotFound(_) => {
                HttpResponse::NotFound().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::BadRequest(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::PaymentRequired {
                payment_type,
                appeal_id,
                ..
            } => HttpResponse::PaymentRequired().json(serde_json::json!({
                "error": self.to_string(),
                "requires_payment": true,
                "payment_type": payment_type,
                "appeal_id": appeal_id,
            })),

            AppError::Internal(error) => {
                log::error!("Internal error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(error))
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}
