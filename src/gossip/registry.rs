/// 연결된 피어 목록
/// 전송 계층이 연결/해제 시 갱신하고, 브로드캐스트 시점에 스냅샷으로 조회한다.
// region:    --- Imports
use crate::auction::PeerIdentity;
use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::info;

// endregion: --- Imports

// region:    --- Peer Registry Trait
#[async_trait]
pub trait PeerRegistry: Send + Sync {
    fn local_identity(&self) -> &PeerIdentity;

    /// 현재 연결된 피어 스냅샷
    async fn connected_peers(&self) -> Vec<PeerIdentity>;

    /// 한 연결로 페이로드 전송
    async fn send(&self, peer: &PeerIdentity, payload: Vec<u8>) -> Result<(), TransportError>;
}

// endregion: --- Peer Registry Trait

// region:    --- Connection Set
pub type Outbound = mpsc::UnboundedSender<Vec<u8>>;

/// 식별자 → 송신 채널
pub struct ConnectionSet {
    local: PeerIdentity,
    connections: RwLock<HashMap<PeerIdentity, Outbound>>,
}

impl ConnectionSet {
    pub fn new(local: PeerIdentity) -> Self {
        Self {
            local,
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// 연결 등록. 같은 식별자의 기존 연결은 교체된다.
    pub async fn register(&self, peer: PeerIdentity, outbound: Outbound) {
        info!("{:<12} --> 피어 연결: {}", "Registry", peer);
        self.connections.write().await.insert(peer, outbound);
    }

    /// 연결 해제. 이미 새 연결로 교체되었다면 건드리지 않는다.
    pub async fn unregister(&self, peer: &PeerIdentity, outbound: &Outbound) {
        let mut connections = self.connections.write().await;
        if connections
            .get(peer)
            .is_some_and(|current| current.same_channel(outbound))
        {
            connections.remove(peer);
            info!("{:<12} --> 피어 연결 해제: {}", "Registry", peer);
        }
    }
}

#[async_trait]
impl PeerRegistry for ConnectionSet {
    fn local_identity(&self) -> &PeerIdentity {
        &self.local
    }

    async fn connected_peers(&self) -> Vec<PeerIdentity> {
        let mut peers: Vec<PeerIdentity> = self.connections.read().await.keys().cloned().collect();
        peers.sort();
        peers
    }

    async fn send(&self, peer: &PeerIdentity, payload: Vec<u8>) -> Result<(), TransportError> {
        let connections = self.connections.read().await;
        let outbound = connections
            .get(peer)
            .ok_or_else(|| TransportError::NotConnected(peer.clone()))?;
        outbound
            .send(payload)
            .map_err(|_| TransportError::Closed(peer.clone()))
    }
}

// endregion: --- Connection Set
