use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::domain::error::DomainError;
use crate::domain::user::{AccessToken, TokenId, UserId};

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn create(&self, user_id: UserId, token_hash: String) -> Result<AccessToken, DomainError>;
    async fn find(&self, id: TokenId) -> Result<Option<AccessToken>, DomainError>;
    async fn touch(&self, id: TokenId, at: DateTime<Utc>) -> Result<(), DomainError>;
    /// Returns `false` when the token did not exist.
    async fn delete(&self, id: TokenId) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    user_id: i64,
    token_hash: String,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
}

impl From<TokenRow> for AccessToken {
    fn from(row: TokenRow) -> Self {
        AccessToken {
            id: row.id,
            user_id: row.user_id,
            token_hash: row.token_hash,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn create(&self, user_id: UserId, token_hash: String) -> Result<AccessToken, DomainError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            INSERT INTO personal_access_tokens (user_id, token_hash)
            VALUES ($1, $2)
            RETURNING id, user_id, token_hash, created_at, last_used_at
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to issue token for user {}: {}", user_id, e);
            DomainError::from(e)
        })?;

        debug!(token_id = row.id, user_id, "token issued");
        Ok(row.into())
    }

    async fn find(&self, id: TokenId) -> Result<Option<AccessToken>, DomainError> {
        sqlx::query_as::<_, TokenRow>(
            "SELECT id, user_id, token_hash, created_at, last_used_at FROM personal_access_tokens WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(AccessToken::from))
        .map_err(DomainError::from)
    }

    async fn touch(&self, id: TokenId, at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query("UPDATE personal_access_tokens SET last_used_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DomainError::from)?;
        Ok(())
    }

    async fn delete(&self, id: TokenId) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM personal_access_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DomainError::from)?;
        Ok(deleted.rows_affected() > 0)
    }
}

#[derive(Default)]
struct TokenTable {
    last_id: TokenId,
    rows: BTreeMap<TokenId, AccessToken>,
}

#[derive(Default)]
pub struct MemoryTokenStore {
    table: RwLock<TokenTable>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn create(&self, user_id: UserId, token_hash: String) -> Result<AccessToken, DomainError> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let token = AccessToken {
            id: table.last_id,
            user_id,
            token_hash,
            created_at: Utc::now(),
            last_used_at: None,
        };
        table.rows.insert(token.id, token.clone());

        debug!(token_id = token.id, user_id, "token issued");
        Ok(token)
    }

    async fn find(&self, id: TokenId) -> Result<Option<AccessToken>, DomainError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn touch(&self, id: TokenId, at: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(token) = self.table.write().await.rows.get_mut(&id) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: TokenId) -> Result<bool, DomainError> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_tokens_can_be_found_and_revoked() {
        let store = MemoryTokenStore::new();
        let token = store.create(7, "abc".into()).await.unwrap();
        assert_eq!(store.find(token.id).await.unwrap().unwrap().user_id, 7);

        store.touch(token.id, Utc::now()).await.unwrap();
        assert!(store.find(token.id).await.unwrap().unwrap().last_used_at.is_some());

        assert!(store.delete(token.id).await.unwrap());
        assert!(!store.delete(token.id).await.unwrap());
        assert!(store.find(token.id).await.unwrap().is_none());
    }
}
