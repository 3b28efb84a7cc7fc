use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::{auth, csrf, error::AppError, handlers, middleware::secure_headers, state::AppState};

/// Application routes. Expects a session layer around it (see [`app`]).
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(handlers::home))
        .route("/snippet/view/{id}", get(handlers::snippet_view))
        .route(
            "/user/signup",
            get(handlers::user_signup).post(handlers::user_signup_post),
        )
        .route(
            "/user/login",
            get(handlers::user_login).post(handlers::user_login_post),
        );

    let protected = Router::new()
        .route(
            "/snippet/create",
            get(handlers::snippet_create).post(handlers::snippet_create_post),
        )
        .route("/user/logout", post(handlers::user_logout_post))
        .route_layer(middleware::from_fn(auth::require_authentication));

    // Routes added after the layers skip them; health checks need no session.
    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(|| async { AppError::NotFound })
        .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate))
        .layer(middleware::from_fn(csrf::verify_csrf))
        .layer(DefaultBodyLimit::max(csrf::MAX_FORM_BYTES))
        .route("/healthz", get(|| async { StatusCode::OK }))
        .with_state(state)
}

/// The full service: routes, sessions, hardening headers, request tracing,
/// and panic recovery, innermost to outermost.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    router(state)
        .layer(sessions)
        .layer(middleware::from_fn(secure_headers))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
}
