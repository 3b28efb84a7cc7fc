use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{DOCTYPE, html};

use crate::models::ModelError;

/// Failures that end a request. Client-side variants carry no detail beyond the
/// status; server-side variants are logged in full and shown as a generic page.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(reason) => {
                tracing::debug!("Rejected request: {}", reason);
                StatusCode::BAD_REQUEST
            }
            AppError::Model(ModelError::NoRecord) => StatusCode::NOT_FOUND,
            AppError::Session(_) | AppError::Model(_) => {
                tracing::error!(error = ?self, "Server error: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_page(status)
    }
}

/// Plain page for `status` carrying only its canonical reason.
pub fn error_page(status: StatusCode) -> Response {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );

    let body = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                h1 { (title) }
            }
        }
    };

    (status, Html(body.into_string())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn server_errors_hide_their_detail() {
        let resp = AppError::Model(ModelError::PasswordHash("db password is hunter2".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(resp).await;
        assert!(body.contains("500 Internal Server Error"));
        assert!(!body.contains("hunter2"));
    }

    #[tokio::test]
    async fn missing_record_maps_to_not_found() {
        let resp = AppError::Model(ModelError::NoRecord).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_request_keeps_reason_out_of_body() {
        let resp = AppError::BadRequest("missing field `expires`".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!body_of(resp).await.contains("expires"));
    }
}
