//! Error handler for callboard.
//!
//! Every failure is caught at the boundary and converted into the JSON
//! envelope `{ok:false, error:"CODE"}` with a machine-readable code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("required fields are missing")]
    MissingFields,

    /// Same answer for unknown username and wrong password.
    #[error("invalid username or password")]
    InvalidLogin,

    #[error("missing or invalid 'Authorization' header")]
    Unauthorized,

    #[error("valid session but insufficient role")]
    Forbidden,

    #[error("username is already taken")]
    UserExists,

    #[error("role must be 'admin' or 'staff'")]
    InvalidRole,

    #[error("the seeded admin account cannot be deleted")]
    CannotDeleteAdmin,

    #[error("call history is empty")]
    NoPrevious,

    #[error("image must be a 'data:image/' URL")]
    InvalidImage,

    #[error("unknown route or resource")]
    NotFound,

    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("state persistence failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Envelope for failed requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    error: &'static str,
}

impl ServerError {
    /// Machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::MissingFields => "MISSING_FIELDS",
            ServerError::InvalidLogin => "INVALID_LOGIN",
            ServerError::Unauthorized => "UNAUTHORIZED",
            ServerError::Forbidden => "FORBIDDEN",
            ServerError::UserExists => "USER_EXISTS",
            ServerError::InvalidRole => "INVALID_ROLE",
            ServerError::CannotDeleteAdmin => "CANNOT_DELETE_ADMIN",
            ServerError::NoPrevious => "NO_PREVIOUS",
            ServerError::InvalidImage => "INVALID_IMAGE",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Validation(errors) => validation_code(errors),
            ServerError::Io(_) | ServerError::Json(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidLogin | ServerError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            },
            ServerError::Forbidden => StatusCode::FORBIDDEN,
            ServerError::UserExists => StatusCode::CONFLICT,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Io(_) | ServerError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Map field-level validation failures onto the error taxonomy.
fn validation_code(errors: &ValidationErrors) -> &'static str {
    let fields = errors.field_errors();
    if fields.contains_key("username") {
        "INVALID_USERNAME"
    } else if fields.contains_key("password") {
        "INVALID_PASSWORD"
    } else {
        "MISSING_FIELDS"
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if matches!(self, ServerError::Io(_) | ServerError::Json(_)) {
            tracing::error!(error = %self, "server returned 500 status");
        }

        (
            self.status(),
            Json(ErrorBody {
                ok: false,
                error: self.code(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 4))]
        password: String,
    }

    #[test]
    fn test_codes_and_statuses() {
        assert_eq!(ServerError::InvalidLogin.code(), "INVALID_LOGIN");
        assert_eq!(ServerError::InvalidLogin.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServerError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ServerError::UserExists.status(), StatusCode::CONFLICT);
        assert_eq!(ServerError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ServerError::NoPrevious.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_maps_to_field_code() {
        let probe = Probe {
            password: "123".to_owned(),
        };
        let error = ServerError::from(probe.validate().unwrap_err());
        assert_eq!(error.code(), "INVALID_PASSWORD");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }
}
