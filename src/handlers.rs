use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    auth::{self, Authentication},
    csrf,
    error::AppError,
    forms::{PostForm, SnippetCreateForm, UserLoginForm, UserSignupForm},
    models::ModelError,
    session,
    state::AppState,
    template::{Page, TemplateData},
    validator::Validated,
};

/// Gather the per-request values shared by every page. Pops the flash message.
async fn template_data(session: &Session, auth: Authentication) -> Result<TemplateData, AppError> {
    let flash = session::pop_flash(session).await?;
    let csrf_token = csrf::ensure_token(session).await?;
    Ok(TemplateData::new(flash, auth.is_authenticated(), csrf_token))
}

// ── Snippets ──────────────────────────────────────────────────────────────────

pub async fn home(
    State(state): State<AppState>,
    session: Session,
    auth: Authentication,
) -> Result<Response, AppError> {
    let snippets = state.snippets.latest().await?;
    let data = template_data(&session, auth).await?;
    Ok(state
        .renderer
        .render(StatusCode::OK, Page::Home { snippets: &snippets }, &data))
}

pub async fn snippet_view(
    State(state): State<AppState>,
    session: Session,
    auth: Authentication,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = raw_id
        .parse::<i64>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or(AppError::NotFound)?;

    let snippet = match state.snippets.get(id).await {
        Ok(s) => s,
        Err(ModelError::NoRecord) => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let data = template_data(&session, auth).await?;
    Ok(state
        .renderer
        .render(StatusCode::OK, Page::View { snippet: &snippet }, &data))
}

pub async fn snippet_create(
    State(state): State<AppState>,
    session: Session,
    auth: Authentication,
) -> Result<Response, AppError> {
    let form = SnippetCreateForm::default();
    let data = template_data(&session, auth).await?;
    Ok(state
        .renderer
        .render(StatusCode::OK, Page::Create { form: &form }, &data))
}

pub async fn snippet_create_post(
    State(state): State<AppState>,
    session: Session,
    auth: Authentication,
    PostForm(mut form): PostForm<SnippetCreateForm>,
) -> Result<Response, AppError> {
    form.validate();
    if !form.valid() {
        let data = template_data(&session, auth).await?;
        return Ok(state.renderer.render(
            StatusCode::UNPROCESSABLE_ENTITY,
            Page::Create { form: &form },
            &data,
        ));
    }

    let id = state
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await?;

    session::put_flash(&session, "Snippet successfully created!").await?;
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

// ── Accounts ──────────────────────────────────────────────────────────────────

pub async fn user_signup(
    State(state): State<AppState>,
    session: Session,
    auth: Authentication,
) -> Result<Response, AppError> {
    let form = UserSignupForm::default();
    let data = template_data(&session, auth).await?;
    Ok(state
        .renderer
        .render(StatusCode::OK, Page::Signup { form: &form }, &data))
}

pub async fn user_signup_post(
    State(state): State<AppState>,
    session: Session,
    auth: Authentication,
    PostForm(mut form): PostForm<UserSignupForm>,
) -> Result<Response, AppError> {
    form.validate();

    if form.valid() {
        match state.users.insert(&form.name, &form.email, &form.password).await {
            Ok(id) => {
                tracing::info!("New account {}", id);
                session::put_flash(&session, "Your signup was successful. Please log in.").await?;
                return Ok(Redirect::to(auth::LOGIN_PATH).into_response());
            }
            Err(ModelError::DuplicateEmail) => {
                form.add_field_error("email", "Email address is already in use");
            }
            Err(e) => return Err(e.into()),
        }
    }

    form.clear_password();
    let data = template_data(&session, auth).await?;
    Ok(state.renderer.render(
        StatusCode::UNPROCESSABLE_ENTITY,
        Page::Signup { form: &form },
        &data,
    ))
}

pub async fn user_login(
    State(state): State<AppState>,
    session: Session,
    auth: Authentication,
) -> Result<Response, AppError> {
    let form = UserLoginForm::default();
    let data = template_data(&session, auth).await?;
    Ok(state
        .renderer
        .render(StatusCode::OK, Page::Login { form: &form }, &data))
}

pub async fn user_login_post(
    State(state): State<AppState>,
    session: Session,
    auth: Authentication,
    PostForm(mut form): PostForm<UserLoginForm>,
) -> Result<Response, AppError> {
    form.validate();

    if form.valid() {
        match state.users.authenticate(&form.email, &form.password).await {
            Ok(id) => {
                auth::log_in(&session, id).await?;
                tracing::info!("User {} logged in", id);
                return Ok(Redirect::to("/snippet/create").into_response());
            }
            Err(ModelError::InvalidCredentials) => {
                tracing::debug!("Rejected login attempt");
                form.add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return Err(e.into()),
        }
    }

    form.clear_password();
    let data = template_data(&session, auth).await?;
    Ok(state.renderer.render(
        StatusCode::UNPROCESSABLE_ENTITY,
        Page::Login { form: &form },
        &data,
    ))
}

pub async fn user_logout_post(session: Session) -> Result<Response, AppError> {
    auth::log_out(&session).await?;
    session::put_flash(&session, "You've been logged out successfully!").await?;
    Ok(Redirect::to("/").into_response())
}
