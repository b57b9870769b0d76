use async_trait::async_trait;

use crate::application::repos::{RepoError, UsersRepo};

use super::PostgresRepositories;

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn id_by_username(&self, username: &str) -> Result<Option<i64>, RepoError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT user_id
            FROM users
            WHERE username = $1
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(RepoError::from_persistence)
    }

    async fn username(&self, user_id: i64) -> Result<Option<String>, RepoError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT username
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(RepoError::from_persistence)
    }

    async fn active(&self, user_id: i64) -> Result<Option<bool>, RepoError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT active
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(RepoError::from_persistence)
    }

    async fn password_hash(&self, user_id: i64) -> Result<Option<String>, RepoError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT password_hash
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(RepoError::from_persistence)
    }
}
