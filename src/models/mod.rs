pub mod snippets;
pub mod users;

pub use snippets::{Snippet, SnippetModel};
pub use users::{UserId, UserModel};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::db::DB_TIME_FORMAT;

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("no matching record found")]
    NoRecord,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format(DB_TIME_FORMAT).to_string()
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, ModelError> {
    NaiveDateTime::parse_from_str(raw, DB_TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|e| ModelError::Database(sqlx::Error::Decode(Box::new(e))))
}
