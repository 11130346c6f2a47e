// region:    --- Imports
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// endregion: --- Imports

// region:    --- Identity
/// 피어 식별자 (Ed25519 공개키 hex)
/// 서명으로 묶여 있지 않으므로 신뢰 근거는 전송 계층 연결뿐이다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerIdentity(String);

impl PeerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerIdentity {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// endregion: --- Identity

// region:    --- Event Kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Open,
    Bid,
    Close,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            EventKind::Open => "Open",
            EventKind::Bid => "Bid",
            EventKind::Close => "Close",
        };
        f.write_str(kind)
    }
}

// endregion: --- Event Kind

// region:    --- Proposal
/// 상태 변경 제안 (로컬 커맨드와 가십 메시지가 공유)
/// 행위자 식별자는 포함하지 않는다. 로컬이면 자신의 식별자, 원격이면 연결의 식별자를 사용한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    Open { name: String, price: Decimal },
    Bid { name: String, price: Decimal },
    Close { name: String, price: Decimal },
}

impl Proposal {
    pub fn kind(&self) -> EventKind {
        match self {
            Proposal::Open { .. } => EventKind::Open,
            Proposal::Bid { .. } => EventKind::Bid,
            Proposal::Close { .. } => EventKind::Close,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Proposal::Open { name, .. }
            | Proposal::Bid { name, .. }
            | Proposal::Close { name, .. } => name,
        }
    }

    pub fn new(kind: EventKind, name: impl Into<String>, price: Decimal) -> Self {
        let name = name.into();
        match kind {
            EventKind::Open => Proposal::Open { name, price },
            EventKind::Bid => Proposal::Bid { name, price },
            EventKind::Close => Proposal::Close { name, price },
        }
    }

    pub fn price(&self) -> Decimal {
        match self {
            Proposal::Open { price, .. }
            | Proposal::Bid { price, .. }
            | Proposal::Close { price, .. } => *price,
        }
    }
}

// endregion: --- Proposal

// region:    --- Auction Event
/// 경매 로그에 기록되는 불변 이벤트
/// - Bid: 판매자는 Open 이벤트에서 이어받고, 입찰자가 행위자
/// - Close: 직전 항목의 행위자가 새 소유자(낙찰자), 종료한 판매자가 행위자
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "LogEntry", try_from = "LogEntry")]
pub enum AuctionEvent {
    Open {
        name: String,
        owner: PeerIdentity,
        price: Decimal,
        timestamp: DateTime<Utc>,
    },
    Bid {
        name: String,
        seller: PeerIdentity,
        bidder: PeerIdentity,
        price: Decimal,
        timestamp: DateTime<Utc>,
    },
    Close {
        name: String,
        winner: PeerIdentity,
        closer: PeerIdentity,
        price: Decimal,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AuctionEvent::Open { .. } => EventKind::Open,
            AuctionEvent::Bid { .. } => EventKind::Bid,
            AuctionEvent::Close { .. } => EventKind::Close,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AuctionEvent::Open { name, .. }
            | AuctionEvent::Bid { name, .. }
            | AuctionEvent::Close { name, .. } => name,
        }
    }

    /// 소유자 필드 (의미는 종류에 따라 다름)
    pub fn owner_field(&self) -> &PeerIdentity {
        match self {
            AuctionEvent::Open { owner, .. } => owner,
            AuctionEvent::Bid { seller, .. } => seller,
            AuctionEvent::Close { winner, .. } => winner,
        }
    }

    /// 이 이벤트를 만든 피어
    pub fn actor_field(&self) -> &PeerIdentity {
        match self {
            AuctionEvent::Open { owner, .. } => owner,
            AuctionEvent::Bid { bidder, .. } => bidder,
            AuctionEvent::Close { closer, .. } => closer,
        }
    }

    pub fn price(&self) -> Decimal {
        match self {
            AuctionEvent::Open { price, .. }
            | AuctionEvent::Bid { price, .. }
            | AuctionEvent::Close { price, .. } => *price,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            AuctionEvent::Open { timestamp, .. }
            | AuctionEvent::Bid { timestamp, .. }
            | AuctionEvent::Close { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, AuctionEvent::Close { .. })
    }
}

// endregion: --- Auction Event

// region:    --- Log Entry
/// 저장 형식: 종류와 무관하게 평탄한 레코드 하나
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: EventKind,
    pub name: String,
    pub owner: PeerIdentity,
    pub actor: PeerIdentity,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl From<AuctionEvent> for LogEntry {
    fn from(event: AuctionEvent) -> Self {
        Self {
            kind: event.kind(),
            owner: event.owner_field().clone(),
            actor: event.actor_field().clone(),
            price: event.price(),
            timestamp: event.timestamp(),
            name: event.name().to_string(),
        }
    }
}

impl TryFrom<LogEntry> for AuctionEvent {
    type Error = String;

    fn try_from(entry: LogEntry) -> Result<Self, Self::Error> {
        let LogEntry {
            kind,
            name,
            owner,
            actor,
            price,
            timestamp,
        } = entry;

        match kind {
            EventKind::Open if owner != actor => Err(format!(
                "Open 항목의 소유자({owner})와 행위자({actor})가 다릅니다."
            )),
            EventKind::Open => Ok(AuctionEvent::Open {
                name,
                owner,
                price,
                timestamp,
            }),
            EventKind::Bid => Ok(AuctionEvent::Bid {
                name,
                seller: owner,
                bidder: actor,
                price,
                timestamp,
            }),
            EventKind::Close => Ok(AuctionEvent::Close {
                name,
                winner: owner,
                closer: actor,
                price,
                timestamp,
            }),
        }
    }
}

// endregion: --- Log Entry
