/// 경매 노드 전반에서 사용하는 에러 정의
/// - 비즈니스 거절(RejectReason)은 정상 흐름의 일부
/// - 저장소 에러(StorageError)는 해당 요청에만 치명적
// region:    --- Imports
use crate::auction::PeerIdentity;
use rust_decimal::Decimal;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Reject Reason
/// 상태 전이 검증 거절 사유
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("존재하지 않는 경매입니다.")]
    AuctionNotFound,

    #[error("이미 종료된 경매입니다.")]
    AuctionClosed,

    #[error("입찰 금액({offered})이 현재 가격({current})보다 높지 않습니다.")]
    PriceNotHigher { offered: Decimal, current: Decimal },

    #[error("경매 소유자만 종료할 수 있습니다. (소유자: {owner})")]
    NotOwner { owner: PeerIdentity },

    #[error("종료 가격({offered})이 최종 가격({expected})과 다릅니다.")]
    PriceMismatch { offered: Decimal, expected: Decimal },

    #[error("경매를 다시 열 권한이 없습니다.")]
    ReopenForbidden,
}

impl RejectReason {
    /// 외부 노출용 코드
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::AuctionNotFound => "AUCTION_NOT_FOUND",
            RejectReason::AuctionClosed => "AUCTION_CLOSED",
            RejectReason::PriceNotHigher { .. } => "PRICE_NOT_HIGHER",
            RejectReason::NotOwner { .. } => "NOT_OWNER",
            RejectReason::PriceMismatch { .. } => "PRICE_MISMATCH",
            RejectReason::ReopenForbidden => "REOPEN_FORBIDDEN",
        }
    }
}

// endregion: --- Reject Reason

// region:    --- Decode Error
/// 가십 페이로드 디코딩 에러
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("잘못된 메시지 구조: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("경매 이름이 비어 있습니다.")]
    EmptyName,

    #[error("경매 이름에 공백을 포함할 수 없습니다: {0:?}")]
    InvalidName(String),

    #[error("가격은 음수일 수 없습니다: {0}")]
    NegativePrice(Decimal),
}

// endregion: --- Decode Error

// region:    --- Storage Error
/// 로그 저장소 에러
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("데이터베이스 에러: {0}")]
    Database(#[from] sqlx::Error),

    #[error("손상된 로그 항목 ({name}#{index}): {reason}")]
    Corrupt {
        name: String,
        index: u64,
        reason: String,
    },
}

// endregion: --- Storage Error

// region:    --- Pipeline Errors
/// 제안 → 검증 → 추가 파이프라인 에러
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("거절됨: {0}")]
    Rejected(#[from] RejectReason),

    #[error("저장소 에러: {0}")]
    Storage(#[from] StorageError),
}

impl ApplyError {
    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            ApplyError::Rejected(reason) => Some(reason),
            ApplyError::Storage(_) => None,
        }
    }
}

/// 로컬 커맨드 처리 에러
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("커맨드 파싱 실패: {0}")]
    Parse(String),

    #[error("잘못된 커맨드: {0}")]
    Invalid(#[from] DecodeError),

    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// 수신 메시지 처리 에러 (원격 피어에게는 전달되지 않음)
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("디코딩 실패: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Apply(#[from] ApplyError),
}

// endregion: --- Pipeline Errors

// region:    --- Transport Error
/// 피어 연결 에러
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("핸드셰이크 실패: {0}")]
    Handshake(String),

    #[error("연결되지 않은 피어: {0}")]
    NotConnected(PeerIdentity),

    #[error("연결이 닫힘: {0}")]
    Closed(PeerIdentity),
}

// endregion: --- Transport Error

// region:    --- Config Error
/// 설정 에러
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("잘못된 주소 {key}={value}: {reason}")]
    InvalidAddr {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("알 수 없는 저장소 종류: {0}")]
    UnknownStore(String),

    #[error("{0} 환경변수가 필요합니다.")]
    Missing(&'static str),

    #[error("잘못된 식별자 시드: {0}")]
    InvalidSeed(String),

    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),
}

// endregion: --- Config Error
