//! Refresh token storage for revocation.
//!
//! Only refresh tokens are stored. A refresh token whose JTI has no row here
//! is treated as revoked. Access tokens are stateless and short-lived.

use sqlx::sqlite::SqlitePool;

/// An active refresh token record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub jti: String,
    pub user_id: i64,
    /// Unix seconds
    pub expires_at: i64,
}

pub struct TokenStore {
    pool: SqlitePool,
}

impl TokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a newly issued refresh token.
    pub async fn create(
        &self,
        jti: &str,
        user_id: i64,
        issued_at: u64,
        expires_at: u64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO refresh_tokens (jti, user_id, issued_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(jti)
        .bind(user_id)
        .bind(issued_at as i64)
        .bind(expires_at as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_jti(&self, jti: &str) -> Result<Option<RefreshToken>, sqlx::Error> {
        sqlx::query_as(
            "SELECT jti, user_id, expires_at FROM refresh_tokens WHERE jti = ?",
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a token by its JWT ID (revoke). Returns whether a row existed.
    pub async fn delete_by_jti(&self, jti: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE jti = ?")
            .bind(jti)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all tokens past their expiry.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < CAST(strftime('%s', 'now') AS INTEGER)")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, UserRole};

    async fn db_with_user() -> (Database, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let id = db
            .users()
            .create("uuid-1", "alice", UserRole::User)
            .await
            .unwrap();
        (db, id)
    }

    #[tokio::test]
    async fn test_create_get_and_revoke() {
        let (db, user_id) = db_with_user().await;

        db.tokens().create("jti-1", user_id, 100, 200).await.unwrap();

        let token = db.tokens().get_by_jti("jti-1").await.unwrap().unwrap();
        assert_eq!(token.user_id, user_id);
        assert_eq!(token.expires_at, 200);

        assert!(db.tokens().delete_by_jti("jti-1").await.unwrap());
        assert!(db.tokens().get_by_jti("jti-1").await.unwrap().is_none());
        assert!(!db.tokens().delete_by_jti("jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_live_tokens() {
        let (db, user_id) = db_with_user().await;
        let far_future = 4_000_000_000;

        db.tokens().create("old", user_id, 1, 2).await.unwrap();
        db.tokens()
            .create("live", user_id, 1, far_future)
            .await
            .unwrap();

        assert_eq!(db.tokens().delete_expired().await.unwrap(), 1);
        assert!(db.tokens().get_by_jti("live").await.unwrap().is_some());
    }
}
