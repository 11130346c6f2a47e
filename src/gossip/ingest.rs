/// 피어로부터 받은 메시지 처리
/// 디코딩 → 검증 → 추가. 재전파하지 않으며 실패는 발신자에게 알리지 않는다.
// region:    --- Imports
use super::wire;
use crate::auction::{AuctionEvent, PeerIdentity};
use crate::error::IngestError;
use crate::ledger::Ledger;
use std::sync::Arc;
use tracing::{debug, error, warn};

// endregion: --- Imports

#[derive(Clone)]
pub struct MessageIngest {
    ledger: Arc<Ledger>,
}

impl MessageIngest {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// sender는 전송 계층이 확인한 연결 식별자
    pub async fn ingest(
        &self,
        sender: &PeerIdentity,
        payload: &[u8],
    ) -> Result<AuctionEvent, IngestError> {
        let proposal = wire::decode(payload).map_err(|e| {
            warn!(
                "{:<12} --> 잘못된 페이로드 폐기: sender={}, error={}",
                "Ingest", sender, e
            );
            e
        })?;
        debug!(
            "{:<12} --> 수신: sender={}, proposal={:?}",
            "Ingest", sender, proposal
        );

        self.ledger.apply(sender, &proposal).await.map_err(|e| {
            if e.reject_reason().is_none() {
                error!("{:<12} --> 저장소 에러: {}", "Ingest", e);
            }
            IngestError::from(e)
        })
    }
}
