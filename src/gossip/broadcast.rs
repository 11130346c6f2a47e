/// 로컬에서 성공한 동작을 연결된 모든 피어에게 1홉 전파
/// 응답 대기, 재시도, 중복 제거 없음
// region:    --- Imports
use super::registry::PeerRegistry;
use super::wire;
use crate::auction::{PeerIdentity, Proposal};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

/// 전파 결과
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<PeerIdentity>,
    pub failed: Vec<PeerIdentity>,
}

#[derive(Clone)]
pub struct BroadcastRouter {
    registry: Arc<dyn PeerRegistry>,
}

impl BroadcastRouter {
    pub fn new(registry: Arc<dyn PeerRegistry>) -> Self {
        Self { registry }
    }

    /// 로컬 검증/추가가 끝난 동작만 호출할 것
    pub async fn broadcast_local_action(&self, proposal: &Proposal) -> BroadcastReport {
        let payload = wire::encode(proposal);
        // 전파 도중 새로 연결된 피어는 포함되지 않는다.
        let peers = self.registry.connected_peers().await;
        let mut report = BroadcastReport::default();

        for peer in peers {
            match self.registry.send(&peer, payload.clone()).await {
                Ok(()) => report.delivered.push(peer),
                Err(e) => {
                    warn!("{:<12} --> 전송 실패: peer={}, error={}", "Broadcast", peer, e);
                    report.failed.push(peer);
                }
            }
        }

        info!(
            "{:<12} --> 전파 완료: origin={}, name={}, kind={}, delivered={}, failed={}",
            "Broadcast",
            self.registry.local_identity(),
            proposal.name(),
            proposal.kind(),
            report.delivered.len(),
            report.failed.len()
        );
        report
    }
}
