//! Error-to-status-code mapping — spec.md §7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use riskguard_core::RiskError;

use crate::dto::ErrorResponse;

pub struct ApiError(pub RiskError);

impl From<RiskError> for ApiError {
    fn from(e: RiskError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            RiskError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            RiskError::NotFound(_) => (StatusCode::NOT_FOUND, "UnknownId"),
            RiskError::DuplicateId(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DuplicateId"),
            RiskError::BrokerUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "BrokerUnavailable"),
            RiskError::StoreTransient(_) => (StatusCode::INTERNAL_SERVER_ERROR, "StoreTransient"),
            RiskError::AlreadyProcessed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AlreadyProcessed"),
            RiskError::Analysis(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AnalysisError"),
            RiskError::Timeout => (StatusCode::INTERNAL_SERVER_ERROR, "Timeout"),
            RiskError::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Other"),
        };

        (status, Json(ErrorResponse { kind, message: self.0.to_string() })).into_response()
    }
}
