use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
// rand_core 0.6 is what password-hash/argon2 depends on; must match that version.
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use super::{ModelError, format_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone)]
pub struct UserModel {
    pool: SqlitePool,
}

impl UserModel {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an account. The password is hashed before it reaches the database.
    pub async fn insert(&self, name: &str, email: &str, password: &str) -> Result<UserId, ModelError> {
        let hash = hash_password(password)?;
        let now = format_time(chrono::Utc::now());

        let result = sqlx::query(
            "INSERT INTO users (name, email, hashed_password, created) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(&hash)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate_email(&e) {
                ModelError::DuplicateEmail
            } else {
                ModelError::Database(e)
            }
        })?;

        Ok(UserId(result.last_insert_rowid()))
    }

    /// Check an email/password pair. An unknown email and a wrong password are
    /// both reported as `InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, ModelError> {
        let row = sqlx::query("SELECT id, hashed_password FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(ModelError::InvalidCredentials);
        };
        let id: i64 = row.try_get("id")?;
        let hash: String = row.try_get("hashed_password")?;

        verify_password(password, &hash)?;
        Ok(UserId(id))
    }

    pub async fn exists(&self, id: UserId) -> Result<bool, ModelError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

/// Hash a password with argon2id and return the PHC string.
fn hash_password(password: &str) -> Result<String, ModelError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ModelError::PasswordHash(e.to_string()))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), ModelError> {
    let parsed = PasswordHash::new(hash).map_err(|e| ModelError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(password_hash::Error::Password) => Err(ModelError::InvalidCredentials),
        Err(e) => Err(ModelError::PasswordHash(e.to_string())),
    }
}

fn is_duplicate_email(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation() && db.message().contains("users.email"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn model() -> (UserModel, SqlitePool) {
        let pool = db::init_memory_pool().await.unwrap();
        (UserModel::new(pool.clone()), pool)
    }

    #[tokio::test]
    async fn signup_then_authenticate() {
        let (users, _) = model().await;
        let id = users.insert("Alice", "a@example.com", "pa55word!").await.unwrap();

        let got = users.authenticate("a@example.com", "pa55word!").await.unwrap();
        assert_eq!(got, id);
        assert!(users.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn password_is_not_stored_in_plain_text() {
        let (users, pool) = model().await;
        users.insert("Alice", "a@example.com", "pa55word!").await.unwrap();

        let stored: String = sqlx::query_scalar("SELECT hashed_password FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_ne!(stored, "pa55word!");
        assert!(stored.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn duplicate_email_is_distinguished() {
        let (users, _) = model().await;
        users.insert("Alice", "a@example.com", "pa55word!").await.unwrap();

        let err = users.insert("Bob", "a@example.com", "other-pass").await.unwrap_err();
        assert!(matches!(err, ModelError::DuplicateEmail));
    }

    #[tokio::test]
    async fn unknown_email_is_invalid_credentials() {
        let (users, _) = model().await;
        let err = users.authenticate("nobody@example.com", "whatever1").await.unwrap_err();
        assert!(matches!(err, ModelError::InvalidCredentials));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let (users, _) = model().await;
        users.insert("Alice", "a@example.com", "pa55word!").await.unwrap();

        let err = users.authenticate("a@example.com", "wrong-pass").await.unwrap_err();
        assert!(matches!(err, ModelError::InvalidCredentials));
    }

    #[tokio::test]
    async fn corrupt_hash_is_an_internal_error() {
        let (users, pool) = model().await;
        users.insert("Alice", "a@example.com", "pa55word!").await.unwrap();
        sqlx::query("UPDATE users SET hashed_password = 'garbage'")
            .execute(&pool)
            .await
            .unwrap();

        let err = users.authenticate("a@example.com", "pa55word!").await.unwrap_err();
        assert!(matches!(err, ModelError::PasswordHash(_)));
    }

    #[tokio::test]
    async fn exists_is_false_for_missing_user() {
        let (users, _) = model().await;
        assert!(!users.exists(UserId(42)).await.unwrap());
    }
}
