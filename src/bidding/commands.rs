/// 로컬 운영자 커맨드 처리
/// 1. 개설: open <name> <price>
/// 2. 입찰: bid <name> <price>
/// 3. 종료: close <name> <price>
// region:    --- Imports
use crate::auction::{AuctionEvent, EventKind, PeerIdentity, Proposal};
use crate::error::CommandError;
use crate::gossip::{wire, BroadcastRouter};
use crate::ledger::Ledger;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Commands
/// HTTP 요청 본문 ({name, price})
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuctionRequest {
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// 경매 커맨드
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: EventKind,
    pub name: String,
    pub price: Decimal,
}

impl Command {
    /// HTTP 요청에서 커맨드 생성 (이름/가격 검증 포함)
    pub fn new(kind: EventKind, request: AuctionRequest) -> Result<Self, CommandError> {
        let cmd = Self {
            kind,
            name: request.name,
            price: request.price,
        };
        cmd.validate()?;
        Ok(cmd)
    }

    /// 수신 측 디코더와 같은 기준으로 검증
    pub fn validate(&self) -> Result<(), CommandError> {
        wire::validate_fields(&self.name, self.price)?;
        Ok(())
    }

    pub fn to_proposal(&self) -> Proposal {
        Proposal::new(self.kind, self.name.clone(), self.price)
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [action, name, price] = parts.as_slice() else {
            return Err(CommandError::Parse(format!(
                "사용법: open|bid|close <name> <price> (입력: {:?})",
                line.trim()
            )));
        };

        let kind = match action.to_ascii_lowercase().as_str() {
            "open" => EventKind::Open,
            "bid" => EventKind::Bid,
            "close" => EventKind::Close,
            other => return Err(CommandError::Parse(format!("알 수 없는 커맨드: {}", other))),
        };
        let price = Decimal::from_str(price)
            .map_err(|e| CommandError::Parse(format!("잘못된 가격 {:?}: {}", price, e)))?;

        let cmd = Self {
            kind,
            name: name.to_string(),
            price,
        };
        cmd.validate()?;
        Ok(cmd)
    }
}

/// 커맨드 실행
/// 로컬 원장에 수락된 경우에만 피어들에게 전파한다.
/// 전파는 이름별 잠금을 쥔 채 수행되어 송신 순서가 로컬 로그 순서와 같다.
pub async fn handle_command(
    cmd: Command,
    identity: &PeerIdentity,
    ledger: &Ledger,
    router: &BroadcastRouter,
) -> Result<AuctionEvent, CommandError> {
    info!("{:<12} --> 커맨드 처리 시작: {:?}", "Command", cmd);
    if let Err(e) = cmd.validate() {
        warn!("{:<12} --> 잘못된 커맨드: {}", "Command", e);
        return Err(e);
    }
    let proposal = cmd.to_proposal();

    match ledger.apply_guarded(identity, &proposal).await {
        Ok((event, _guard)) => {
            router.broadcast_local_action(&proposal).await;
            Ok(event)
        }
        Err(e) => {
            match e.reject_reason() {
                Some(reason) => warn!(
                    "{:<12} --> 커맨드 거절: name={}, code={}",
                    "Command",
                    cmd.name,
                    reason.code()
                ),
                None => error!("{:<12} --> 커맨드 실패: {}", "Command", e),
            }
            Err(e.into())
        }
    }
}

// endregion: --- Commands
