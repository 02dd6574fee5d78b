use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

/// Errors a request handler can end with.
///
/// Form validation problems are not errors: handlers re-render the form.
/// Mail failures are turned into a flash message by the contact handler.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("password hashing error: {0}")]
    Password(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("login required")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("configuration error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::Password(err.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Database(_)
            | AppError::Template(_)
            | AppError::Password(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("Request failed: {}", self);
            "Internal Server Error".to_string()
        } else {
            match self {
                AppError::NotFound(what) => format!("{} not found", what),
                AppError::Unauthorized => "You need to log in to access this page.".to_string(),
                AppError::Forbidden => {
                    "You don't have permission to access this page.".to_string()
                }
                _ => self.to_string(),
            }
        };

        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("Post 7".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Database(rusqlite::Error::QueryReturnedNoRows).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::NotFound("Post 42".into());
        assert_eq!(err.to_string(), "Post 42 not found");
    }
}
