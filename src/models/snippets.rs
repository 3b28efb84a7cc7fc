use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use super::{ModelError, format_time, parse_time};

/// Number of snippets shown on the home page.
const LATEST_LIMIT: i64 = 10;

#[derive(Debug, Clone)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl TryFrom<SqliteRow> for Snippet {
    type Error = ModelError;

    fn try_from(row: SqliteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            created: parse_time(&row.try_get::<String, _>("created")?)?,
            expires: parse_time(&row.try_get::<String, _>("expires")?)?,
        })
    }
}

#[derive(Clone)]
pub struct SnippetModel {
    pool: SqlitePool,
}

impl SnippetModel {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a snippet that expires `expires_days` from now. Returns its id.
    pub async fn insert(&self, title: &str, content: &str, expires_days: i64) -> Result<i64, ModelError> {
        let now = Utc::now();
        let expires = now + Duration::days(expires_days);

        let result = sqlx::query(
            "INSERT INTO snippets (title, content, created, expires) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(content)
        .bind(format_time(now))
        .bind(format_time(expires))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch an unexpired snippet by id.
    pub async fn get(&self, id: i64) -> Result<Snippet, ModelError> {
        sqlx::query(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > ? AND id = ?",
        )
        .bind(format_time(Utc::now()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ModelError::NoRecord)?
        .try_into()
    }

    /// The most recent unexpired snippets, newest first.
    pub async fn latest(&self) -> Result<Vec<Snippet>, ModelError> {
        sqlx::query(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > ? ORDER BY id DESC LIMIT ?",
        )
        .bind(format_time(Utc::now()))
        .bind(LATEST_LIMIT)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Snippet::try_from)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn model() -> (SnippetModel, SqlitePool) {
        let pool = db::init_memory_pool().await.unwrap();
        (SnippetModel::new(pool.clone()), pool)
    }

    #[tokio::test]
    async fn insert_then_get() {
        let (snippets, _) = model().await;
        let id = snippets.insert("An old silent pond", "A frog jumps in", 7).await.unwrap();

        let s = snippets.get(id).await.unwrap();
        assert_eq!(s.title, "An old silent pond");
        assert_eq!(s.content, "A frog jumps in");
        assert_eq!((s.expires - s.created).num_days(), 7);
    }

    #[tokio::test]
    async fn missing_snippet_is_no_record() {
        let (snippets, _) = model().await;
        assert!(matches!(snippets.get(99).await, Err(ModelError::NoRecord)));
    }

    #[tokio::test]
    async fn expired_snippets_are_hidden() {
        let (snippets, pool) = model().await;
        let id = snippets.insert("gone", "soon", 1).await.unwrap();
        sqlx::query("UPDATE snippets SET expires = '2000-01-01 00:00:00' WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(matches!(snippets.get(id).await, Err(ModelError::NoRecord)));
        assert!(snippets.latest().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_is_newest_first_and_capped() {
        let (snippets, _) = model().await;
        for i in 0..12 {
            snippets.insert(&format!("title {i}"), "body", 365).await.unwrap();
        }

        let latest = snippets.latest().await.unwrap();
        assert_eq!(latest.len(), 10);
        assert_eq!(latest[0].title, "title 11");
        assert!(latest.windows(2).all(|w| w[0].id > w[1].id));
    }
}
