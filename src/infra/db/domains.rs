use async_trait::async_trait;
use sqlx::FromRow;

use crate::application::repos::{DomainRow, DomainsRepo, RepoError};

use super::PostgresRepositories;

#[derive(Debug, FromRow)]
struct DomainRecord {
    domain_id: i64,
    domain: String,
}

#[async_trait]
impl DomainsRepo for PostgresRepositories {
    async fn matching(&self, candidates: &[String]) -> Result<Vec<DomainRow>, RepoError> {
        let records = sqlx::query_as::<_, DomainRecord>(
            r#"
            SELECT domain_id, domain
            FROM domains
            WHERE domain = ANY($1)
            "#,
        )
        .bind(candidates.to_vec())
        .fetch_all(self.pool())
        .await
        .map_err(RepoError::from_persistence)?;

        Ok(records
            .into_iter()
            .map(|record| DomainRow {
                domain_id: record.domain_id,
                domain: record.domain,
            })
            .collect())
    }
}
