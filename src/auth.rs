//! Per-request identity.
//!
//! [`authenticate`] runs on every request: it resolves the session's user id
//! into an [`Authentication`] and stores it in the request extensions, where
//! handlers pick it up as an ordinary extractor. [`require_authentication`]
//! gates protected routes on that value.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::convert::Infallible;
use tower_sessions::Session;

use crate::{
    error::AppError,
    models::{UserId, UserModel},
    session::{AUTHENTICATED_USER_ID_KEY, CSRF_TOKEN_KEY},
    state::AppState,
};

pub const LOGIN_PATH: &str = "/user/login";

/// Who is making the current request. Decided once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authentication {
    #[default]
    Anonymous,
    Authenticated(UserId),
}

impl Authentication {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Authentication::Authenticated(_))
    }
}

/// Missing extension means [`authenticate`] did not run, which is anonymous.
impl<S: Send + Sync> FromRequestParts<S> for Authentication {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Authentication>()
            .copied()
            .unwrap_or_default())
    }
}

/// Map the session's stored user id to an [`Authentication`]. A stale id (the
/// account has since been deleted) yields `Anonymous`; the session is left as is.
pub async fn resolve(session: &Session, users: &UserModel) -> Result<Authentication, AppError> {
    let id = session
        .get::<i64>(AUTHENTICATED_USER_ID_KEY)
        .await?
        .unwrap_or(0);
    if id == 0 {
        return Ok(Authentication::Anonymous);
    }

    let id = UserId(id);
    if users.exists(id).await? {
        Ok(Authentication::Authenticated(id))
    } else {
        tracing::debug!("Session refers to missing user {}", id);
        Ok(Authentication::Anonymous)
    }
}

pub async fn authenticate(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = resolve(&session, &state.users).await?;
    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

pub async fn require_authentication(auth: Authentication, req: Request, next: Next) -> Response {
    if !auth.is_authenticated() {
        return Redirect::to(LOGIN_PATH).into_response();
    }

    let mut resp = next.run(req).await;
    resp.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    resp
}

/// Record a successful login. The session id is rotated and the CSRF token
/// dropped first, so neither value known before login works afterwards.
pub async fn log_in(session: &Session, id: UserId) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.remove::<String>(CSRF_TOKEN_KEY).await?;
    session.insert(AUTHENTICATED_USER_ID_KEY, id).await
}

pub async fn log_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.remove::<String>(CSRF_TOKEN_KEY).await?;
    session.remove::<i64>(AUTHENTICATED_USER_ID_KEY).await?;
    Ok(())
}
