use async_trait::async_trait;

use crate::application::repos::{ObjectsRepo, RepoError};

use super::PostgresRepositories;

#[async_trait]
impl ObjectsRepo for PostgresRepositories {
    async fn file_path(
        &self,
        shortname: &str,
        domain_id: i64,
        subdomain: Option<&str>,
    ) -> Result<Option<String>, RepoError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT fspath
            FROM files
            WHERE filename = $1
              AND domain = $2
              AND deleted = false
              AND ($3::text IS NULL OR subdomain = $3)
            LIMIT 1
            "#,
        )
        .bind(shortname)
        .bind(domain_id)
        .bind(subdomain)
        .fetch_optional(self.pool())
        .await
        .map_err(RepoError::from_persistence)
    }

    async fn redirect_target(
        &self,
        shortname: &str,
        domain_id: i64,
        subdomain: Option<&str>,
    ) -> Result<Option<String>, RepoError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT redirto
            FROM shortens
            WHERE filename = $1
              AND domain = $2
              AND deleted = false
              AND ($3::text IS NULL OR subdomain = $3)
            LIMIT 1
            "#,
        )
        .bind(shortname)
        .bind(domain_id)
        .bind(subdomain)
        .fetch_optional(self.pool())
        .await
        .map_err(RepoError::from_persistence)
    }

    async fn file_mime(&self, shortname: &str) -> Result<Option<String>, RepoError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT mimetype
            FROM files
            WHERE filename = $1
              AND deleted = false
            LIMIT 1
            "#,
        )
        .bind(shortname)
        .fetch_optional(self.pool())
        .await
        .map_err(RepoError::from_persistence)
    }
}
