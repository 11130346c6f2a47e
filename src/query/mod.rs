/// 경매 상태 조회
/// 별도 요약 객체 없이 로그의 마지막 항목에서 상태를 유도한다.
// region:    --- Imports
use crate::auction::{AuctionEvent, PeerIdentity};
use crate::error::StorageError;
use crate::ledger::Ledger;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

// endregion: --- Imports

// region:    --- Auction State
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum AuctionState {
    /// 진행 중: leader는 마지막 입찰자 (입찰이 없으면 판매자)
    Active {
        name: String,
        seller: PeerIdentity,
        leader: PeerIdentity,
        #[serde(with = "rust_decimal::serde::str")]
        price: Decimal,
        updated_at: DateTime<Utc>,
    },
    /// 종료: owner는 낙찰자이며 재개설 권한을 가진다
    Closed {
        name: String,
        owner: PeerIdentity,
        #[serde(with = "rust_decimal::serde::str")]
        price: Decimal,
        updated_at: DateTime<Utc>,
    },
}

impl AuctionState {
    pub fn from_tail(tail: &AuctionEvent) -> Self {
        match tail {
            AuctionEvent::Close {
                name,
                winner,
                price,
                timestamp,
                ..
            } => AuctionState::Closed {
                name: name.clone(),
                owner: winner.clone(),
                price: *price,
                updated_at: *timestamp,
            },
            _ => AuctionState::Active {
                name: tail.name().to_string(),
                seller: tail.owner_field().clone(),
                leader: tail.actor_field().clone(),
                price: tail.price(),
                updated_at: tail.timestamp(),
            },
        }
    }
}

// endregion: --- Auction State

// region:    --- Query Handlers
/// 경매 상태 조회 (로그가 비어 있으면 None)
/// 읽기 전용: 없는 이름을 조회해도 로그를 만들지 않는다.
pub async fn get_auction_state(
    ledger: &Ledger,
    name: &str,
) -> Result<Option<AuctionState>, StorageError> {
    info!("{:<12} --> 경매 상태 조회 name: {}", "Query", name);
    Ok(ledger
        .last_entry(name)
        .await?
        .as_ref()
        .map(AuctionState::from_tail))
}

/// 경매 이력 조회
pub async fn get_auction_history(
    ledger: &Ledger,
    name: &str,
) -> Result<Vec<AuctionEvent>, StorageError> {
    info!("{:<12} --> 경매 이력 조회 name: {}", "Query", name);
    ledger.history(name).await
}

// endregion: --- Query Handlers
