//! SQLite storage: principals and the refresh tokens issued to them.

mod token;
mod user;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use token::{RefreshToken, TokenStore};
pub use user::{User, UserRole, UserStore};

/// Schema migrations. Entry `n` brings the schema to version `n + 1`.
const MIGRATIONS: &[&[&str]] = &[&[
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid TEXT UNIQUE NOT NULL,
        username TEXT UNIQUE NOT NULL COLLATE NOCASE,
        role TEXT NOT NULL DEFAULT 'user',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    // A refresh token is live while its JTI has a row here. Unix seconds.
    "CREATE TABLE refresh_tokens (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        jti TEXT UNIQUE NOT NULL,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        issued_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL
    )",
    "CREATE INDEX idx_refresh_tokens_user_id ON refresh_tokens(user_id)",
    "CREATE INDEX idx_refresh_tokens_expires_at ON refresh_tokens(expires_at)",
]];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path and bring its schema up
    /// to date. `":memory:"` opens a private in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        // Each in-memory connection is its own database, so keep exactly one.
        let pool = if path == ":memory:" {
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect(&format!("sqlite:{}?mode=rwc", path))
                .await?
        };

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    pub fn tokens(&self) -> TokenStore {
        TokenStore::new(self.pool.clone())
    }

    async fn schema_version(&self) -> Result<usize, sqlx::Error> {
        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(version.unwrap_or(0).max(0) as usize)
    }

    /// Apply every migration newer than the stored version, each in its own
    /// transaction together with its version bump.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let current = self.schema_version().await?;

        for (index, queries) in MIGRATIONS.iter().enumerate().skip(current) {
            let mut tx = self.pool.begin().await?;
            for query in queries.iter().copied() {
                sqlx::query(query).execute(&mut *tx).await?;
            }
            sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                .bind((index + 1) as i64)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            tracing::debug!(version = index + 1, "Applied schema migration");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::open(":memory:").await.unwrap();
        db.migrate().await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_deleting_user_revokes_their_tokens() {
        let db = Database::open(":memory:").await.unwrap();
        let id = db
            .users()
            .create("uuid-1", "alice", UserRole::User)
            .await
            .unwrap();
        db.tokens().create("jti-1", id, 0, 4_000_000_000).await.unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&db.pool)
            .await
            .unwrap();

        assert!(db.tokens().get_by_jti("jti-1").await.unwrap().is_none());
    }
}
