use async_trait::async_trait;
use ipnetwork::IpNetwork;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::application::repos::{BanRow, BansRepo, IpBanRow, RepoError};

use super::PostgresRepositories;

#[derive(Debug, FromRow)]
struct UserBanRecord {
    reason: String,
    end_timestamp: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct NetworkBanRecord {
    network: String,
    reason: String,
    end_timestamp: OffsetDateTime,
}

#[async_trait]
impl BansRepo for PostgresRepositories {
    async fn active_user_ban(&self, user_id: i64) -> Result<Option<BanRow>, RepoError> {
        let record = sqlx::query_as::<_, UserBanRecord>(
            r#"
            SELECT reason, end_timestamp
            FROM bans
            WHERE user_id = $1
              AND end_timestamp > now()
            ORDER BY end_timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(RepoError::from_persistence)?;

        Ok(record.map(|record| BanRow {
            reason: record.reason,
            end_timestamp: record.end_timestamp,
        }))
    }

    async fn narrowest_ip_ban(
        &self,
        network: IpNetwork,
    ) -> Result<Option<IpBanRow>, RepoError> {
        // `>>=` keeps rows whose stored network contains the probed one;
        // masklen ordering makes the narrowest containing ban win.
        let record = sqlx::query_as::<_, NetworkBanRecord>(
            r#"
            SELECT ip_address::text AS network, reason, end_timestamp
            FROM ip_bans
            WHERE ip_address >>= $1::cidr
              AND end_timestamp > now()
            ORDER BY masklen(ip_address) DESC
            LIMIT 1
            "#,
        )
        .bind(network.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(RepoError::from_persistence)?;

        record
            .map(|record| {
                let network = record.network.parse::<IpNetwork>().map_err(|err| {
                    RepoError::integrity(format!(
                        "unparseable ban network `{}`: {err}",
                        record.network
                    ))
                })?;

                Ok(IpBanRow {
                    network,
                    reason: record.reason,
                    end_timestamp: record.end_timestamp,
                })
            })
            .transpose()
    }
}
