use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use manch_admin::AdminError;
use manch_media::MediaError;
use manch_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Unknown screen: {0}")]
    UnknownScreen(String),

    #[error("Record not found")]
    NotFound,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        ServerError::Admin(AdminError::Store(e))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::UnknownScreen(_) | ServerError::NotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Admin(admin) => admin_status(admin),
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// User-correctable failures map to 4xx; remote-store faults are this
/// server's upstream, so they surface as 502.
fn admin_status(e: &AdminError) -> (StatusCode, String) {
    match e {
        AdminError::IncompleteInput(_) | AdminError::UnsupportedAsset => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        AdminError::Media(MediaError::InvalidType { .. }) => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string())
        }
        AdminError::Media(MediaError::TooLarge { .. }) => {
            (StatusCode::PAYLOAD_TOO_LARGE, e.to_string())
        }
        AdminError::Media(MediaError::AssetUnreadable(_)) => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        AdminError::Store(StoreError::NotFound) => (StatusCode::NOT_FOUND, e.to_string()),
        AdminError::Store(
            StoreError::Unauthorized(_)
            | StoreError::QuotaExceeded
            | StoreError::NetworkFailure(_)
            | StoreError::Canceled,
        ) => (StatusCode::BAD_GATEWAY, e.to_string()),
        AdminError::Store(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
        }
    }
}
