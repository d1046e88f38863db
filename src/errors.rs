use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::delivery::InvalidTransition;
use crate::services::group::GroupError;
use crate::services::slots::SlotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityCode {
    CapacityFull,
    InsufficientCapacity,
}

impl CapacityCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityCode::CapacityFull => "CAPACITY_FULL",
            CapacityCode::InsufficientCapacity => "INSUFFICIENT_CAPACITY",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{0}")]
    Validation(String),

    #[error("no encontrado: {0}")]
    NotFound(String),

    #[error("{message}")]
    Capacity { code: CapacityCode, message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<GroupError> for AppError {
    fn from(err: GroupError) -> Self {
        match err {
            GroupError::CapacityExceeded { .. } => AppError::Capacity {
                code: CapacityCode::CapacityFull,
                message: err.to_string(),
            },
            _ => AppError::Validation(err.to_string()),
        }
    }
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::SlotNotFound { .. } => AppError::NotFound(err.to_string()),
            _ => AppError::Validation(err.to_string()),
        }
    }
}

impl From<InvalidTransition> for AppError {
    fn from(err: InvalidTransition) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, None),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            AppError::Capacity { code, .. } => (StatusCode::BAD_REQUEST, Some(code.as_str())),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, None),
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        // Internals get logged in full and leave the building as a generic
        // message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error");
            "error interno del servidor".to_string()
        } else {
            self.to_string()
        };

        let mut body = serde_json::json!({ "success": false, "error": message });
        if let Some(code) = error_code {
            body["errorCode"] = code.into();
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Technique;

    #[test]
    fn test_group_capacity_maps_to_capacity_full() {
        let err: AppError = GroupError::CapacityExceeded {
            technique: Technique::PottersWheel,
            count: 9,
            limit: 8,
        }
        .into();
        assert!(matches!(
            err,
            AppError::Capacity {
                code: CapacityCode::CapacityFull,
                ..
            }
        ));
    }

    #[test]
    fn test_slot_not_found_maps_to_not_found() {
        let err: AppError = SlotError::SlotNotFound {
            date: "2026-06-10".to_string(),
            time: "10:00".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_slot_rules_map_to_validation() {
        let err: AppError = SlotError::NoRefund.into();
        assert!(matches!(err, AppError::Validation(_)));

        let err: AppError = SlotError::TooLate { hours_remaining: 5 }.into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
