use axum::{
    Form,
    extract::{FromRequest, Request},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::AppError,
    validator::{EMAIL_RX, Validated, Validator, matches, max_chars, min_chars, not_blank, permitted_int},
};

pub const PERMITTED_EXPIRES: &[i64] = &[1, 7, 365];
pub const DEFAULT_EXPIRES: i64 = 365;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_TITLE_CHARS: usize = 100;

const BLANK: &str = "This field cannot be blank";
const BAD_EMAIL: &str = "This field must be a valid email address";

/// A url-encoded form body. A body that does not decode into `T` is the
/// caller's fault and becomes `400 Bad Request`.
pub struct PostForm<T>(pub T);

impl<S, T> FromRequest<S> for PostForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(PostForm(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

macro_rules! impl_validated {
    ($($form:ty),+) => {
        $(impl Validated for $form {
            fn validator(&self) -> &Validator {
                &self.validator
            }

            fn validator_mut(&mut self) -> &mut Validator {
                &mut self.validator
            }
        })+
    };
}

impl_validated!(SnippetCreateForm, UserSignupForm, UserLoginForm);

#[derive(Debug, Clone, Deserialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expires: i64,
    #[serde(skip)]
    validator: Validator,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: DEFAULT_EXPIRES,
            validator: Validator::default(),
        }
    }
}

impl SnippetCreateForm {
    pub fn validate(&mut self) {
        let title_ok = not_blank(&self.title);
        let title_short = max_chars(&self.title, MAX_TITLE_CHARS);
        let content_ok = not_blank(&self.content);
        let expires_ok = permitted_int(self.expires, PERMITTED_EXPIRES);

        self.check_field(title_ok, "title", BLANK);
        self.check_field(
            title_short,
            "title",
            &format!("This field cannot be more than {MAX_TITLE_CHARS} characters long"),
        );
        self.check_field(content_ok, "content", BLANK);
        self.check_field(expires_ok, "expires", "This field must equal 1, 7 or 365");
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    validator: Validator,
}

impl UserSignupForm {
    /// Passwords are never echoed back into a re-rendered form.
    pub fn clear_password(&mut self) {
        self.password.clear();
    }

    pub fn validate(&mut self) {
        let name_ok = not_blank(&self.name);
        let email_ok = not_blank(&self.email);
        let email_shape = matches(&self.email, &EMAIL_RX);
        let password_ok = not_blank(&self.password);
        let password_long = min_chars(&self.password, MIN_PASSWORD_CHARS);

        self.check_field(name_ok, "name", BLANK);
        self.check_field(email_ok, "email", BLANK);
        self.check_field(email_shape, "email", BAD_EMAIL);
        self.check_field(password_ok, "password", BLANK);
        self.check_field(
            password_long,
            "password",
            &format!("This field must be at least {MIN_PASSWORD_CHARS} characters long"),
        );
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    validator: Validator,
}

impl UserLoginForm {
    pub fn validate(&mut self) {
        let email_ok = not_blank(&self.email);
        let email_shape = matches(&self.email, &EMAIL_RX);
        let password_ok = not_blank(&self.password);

        self.check_field(email_ok, "email", BLANK);
        self.check_field(email_shape, "email", BAD_EMAIL);
        self.check_field(password_ok, "password", BLANK);
    }

    /// Forget the submitted password so it is never echoed back into the page.
    pub fn clear_password(&mut self) {
        self.password.clear();
    }
}
