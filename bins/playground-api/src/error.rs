// Mapping from domain errors to HTTP responses
// Messages are passed through untranslated so the UI can show them as-is.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use playground_common::error::{LibraryError, UnsupportedLanguage};
use playground_engine::{AssistantError, ExecutionError};
use tracing::{error, warn};

#[derive(Debug)]
pub enum ApiError {
    Execution(ExecutionError),
    Assistant(AssistantError),
    Library(LibraryError),
    Validation(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Execution(e) => match e {
                ExecutionError::Configuration | ExecutionError::InvalidBaseUrl(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                ExecutionError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
                ExecutionError::SubmitFailed(_)
                | ExecutionError::PollFailed
                | ExecutionError::Transport(_)
                | ExecutionError::Decode(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Assistant(e) => match e {
                AssistantError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
                AssistantError::Http { .. }
                | AssistantError::Transport(_)
                | AssistantError::Decode(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Library(e) => match e {
                LibraryError::Unauthenticated => StatusCode::UNAUTHORIZED,
                LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
                LibraryError::EmptyField(_) => StatusCode::BAD_REQUEST,
                LibraryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Execution(e) => e.to_string(),
            ApiError::Assistant(e) => e.to_string(),
            ApiError::Library(e) => e.to_string(),
            ApiError::Validation(msg) => msg.clone(),
        }
    }
}

impl From<ExecutionError> for ApiError {
    fn from(err: ExecutionError) -> Self {
        ApiError::Execution(err)
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        ApiError::Assistant(err)
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        ApiError::Library(err)
    }
}

impl From<UnsupportedLanguage> for ApiError {
    fn from(err: UnsupportedLanguage) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!(status = %status, error = %message, "Request failed");
        } else {
            warn!(status = %status, error = %message, "Request rejected");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
