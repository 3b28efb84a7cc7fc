//! Synchronizer-token CSRF protection.
//!
//! Each session holds one random token. Pages embed it in a hidden
//! `csrf_token` field and every state-changing request must echo it back.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::{error::AppError, session::CSRF_TOKEN_KEY};

/// Name of the hidden form field carrying the token.
pub const CSRF_FIELD: &str = "csrf_token";
/// Upper bound on form bodies. Applies both to the buffered token check and,
/// through `DefaultBodyLimit`, to the handlers' form extractors.
pub const MAX_FORM_BYTES: usize = 2 * 1024 * 1024;

/// Return the session's token, creating one on first use.
pub async fn ensure_token(session: &Session) -> Result<String, AppError> {
    if let Some(token) = session.get::<String>(CSRF_TOKEN_KEY).await? {
        return Ok(token);
    }
    let token = new_token();
    session.insert(CSRF_TOKEN_KEY, &token).await?;
    Ok(token)
}

pub async fn verify_csrf(session: Session, req: Request, next: Next) -> Result<Response, AppError> {
    let expected = ensure_token(&session).await?;

    if !is_state_changing(req.method()) {
        return Ok(next.run(req).await);
    }

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("Unreadable form body: {e}")))?;

    let submitted = form_urlencoded::parse(&bytes)
        .find(|(k, _)| k == CSRF_FIELD)
        .map(|(_, v)| v.into_owned());

    match submitted {
        Some(token) if tokens_match(&token, &expected) => {
            Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
        }
        _ => Err(AppError::BadRequest("CSRF token missing or incorrect".into())),
    }
}

fn is_state_changing(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

/// Compare without bailing out at the first differing byte.
fn tokens_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

fn new_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::memory_session;
    use axum::{
        Router,
        http::{Request as HttpRequest, StatusCode, header},
        middleware,
        routing::post,
    };
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    #[tokio::test]
    async fn token_is_stable_within_a_session() {
        let (session, _) = memory_session();
        let first = ensure_token(&session).await.unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(ensure_token(&session).await.unwrap(), first);
    }

    #[test]
    fn token_comparison() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
    }

    #[tokio::test]
    async fn post_without_token_is_rejected() {
        let app = Router::new()
            .route("/submit", post(|| async { "ok" }))
            .layer(middleware::from_fn(verify_csrf))
            .layer(SessionManagerLayer::new(MemoryStore::default()));

        let req = HttpRequest::post("/submit")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("title=hi"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
