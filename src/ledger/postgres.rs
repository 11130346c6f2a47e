/// Postgres 로그 저장소
/// (name, seq) 기본키로 한 경매의 항목 순서를 고정한다.
// region:    --- Imports
use super::LogStore;
use crate::auction::{AuctionEvent, EventKind, LogEntry, PeerIdentity};
use crate::database::DatabaseManager;
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use std::sync::Arc;

// endregion: --- Imports

// region:    --- Queries
const INSERT_NAME: &str =
    "INSERT INTO auction_names (name) VALUES ($1) ON CONFLICT (name) DO NOTHING";

const GET_LOG_LENGTH: &str = "SELECT COUNT(*) AS len FROM auction_log WHERE name = $1";

const GET_ENTRY: &str =
    "SELECT kind, name, owner, actor, price, ts FROM auction_log WHERE name = $1 AND seq = $2";

const APPEND_ENTRY: &str = r#"
    INSERT INTO auction_log (name, seq, kind, owner, actor, price, ts)
    VALUES ($1, (SELECT COALESCE(MAX(seq) + 1, 0) FROM auction_log WHERE name = $1), $2, $3, $4, $5, $6)
    RETURNING seq
"#;

const GET_NAMES: &str = "SELECT DISTINCT name FROM auction_log ORDER BY name";

// endregion: --- Queries

pub struct PostgresLogStore {
    pool: Arc<PgPool>,
}

impl PostgresLogStore {
    pub fn new(db_manager: &DatabaseManager) -> Self {
        Self {
            pool: db_manager.get_pool(),
        }
    }

    fn row_to_event(row: &PgRow, index: u64) -> Result<AuctionEvent, StorageError> {
        let name: String = row.try_get("name")?;
        let corrupt = |reason: String| StorageError::Corrupt {
            name: name.clone(),
            index,
            reason,
        };

        let kind = match row.try_get::<String, _>("kind")?.as_str() {
            "Open" => EventKind::Open,
            "Bid" => EventKind::Bid,
            "Close" => EventKind::Close,
            other => return Err(corrupt(format!("알 수 없는 종류: {}", other))),
        };
        let price_text: String = row.try_get("price")?;
        let price = Decimal::from_str(&price_text).map_err(|e| corrupt(e.to_string()))?;
        let timestamp: DateTime<Utc> = row.try_get("ts")?;

        let entry = LogEntry {
            kind,
            name: name.clone(),
            owner: PeerIdentity::new(row.try_get::<String, _>("owner")?),
            actor: PeerIdentity::new(row.try_get::<String, _>("actor")?),
            price,
            timestamp,
        };
        AuctionEvent::try_from(entry).map_err(corrupt)
    }
}

#[async_trait]
impl LogStore for PostgresLogStore {
    async fn open(&self, name: &str) -> Result<(), StorageError> {
        sqlx::query(INSERT_NAME)
            .bind(name)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn len(&self, name: &str) -> Result<u64, StorageError> {
        let row = sqlx::query(GET_LOG_LENGTH)
            .bind(name)
            .fetch_one(&*self.pool)
            .await?;
        let len: i64 = row.try_get("len")?;
        Ok(len as u64)
    }

    async fn get(&self, name: &str, index: u64) -> Result<Option<AuctionEvent>, StorageError> {
        let row = sqlx::query(GET_ENTRY)
            .bind(name)
            .bind(index as i64)
            .fetch_optional(&*self.pool)
            .await?;
        row.map(|row| Self::row_to_event(&row, index)).transpose()
    }

    async fn append(&self, name: &str, event: &AuctionEvent) -> Result<u64, StorageError> {
        let seq: i64 = sqlx::query_scalar(APPEND_ENTRY)
            .bind(name)
            .bind(event.kind().to_string())
            .bind(event.owner_field().as_str())
            .bind(event.actor_field().as_str())
            .bind(event.price().to_string())
            .bind(event.timestamp())
            .fetch_one(&*self.pool)
            .await?;
        Ok(seq as u64 + 1)
    }

    async fn names(&self) -> Result<Vec<String>, StorageError> {
        let names = sqlx::query_scalar::<_, String>(GET_NAMES)
            .fetch_all(&*self.pool)
            .await?;
        Ok(names)
    }
}
