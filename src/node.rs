/// 경매 피어 노드
/// 로컬 커맨드와 수신 메시지가 같은 원장 파이프라인으로 모인다.
// region:    --- Imports
use crate::auction::{AuctionEvent, PeerIdentity};
use crate::bidding::commands::{self, Command};
use crate::error::{CommandError, IngestError, StorageError};
use crate::gossip::{BroadcastRouter, ConnectionSet, MessageIngest, PeerRegistry};
use crate::ledger::{Ledger, LogStore, MemoryLogStore};
use crate::query::{self, AuctionState};
use std::sync::Arc;

// endregion: --- Imports

pub struct AuctionNode {
    identity: PeerIdentity,
    ledger: Arc<Ledger>,
    connections: Arc<ConnectionSet>,
    router: BroadcastRouter,
    ingest: MessageIngest,
}

impl AuctionNode {
    pub fn new(identity: PeerIdentity, store: Arc<dyn LogStore>) -> Self {
        let ledger = Arc::new(Ledger::new(store));
        let connections = Arc::new(ConnectionSet::new(identity.clone()));
        let router = BroadcastRouter::new(Arc::clone(&connections) as Arc<dyn PeerRegistry>);
        let ingest = MessageIngest::new(Arc::clone(&ledger));

        Self {
            identity,
            ledger,
            connections,
            router,
            ingest,
        }
    }

    /// 메모리 저장소를 쓰는 노드
    pub fn in_memory(identity: impl Into<PeerIdentity>) -> Self {
        Self::new(identity.into(), Arc::new(MemoryLogStore::new()))
    }

    pub fn identity(&self) -> &PeerIdentity {
        &self.identity
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn connections(&self) -> &Arc<ConnectionSet> {
        &self.connections
    }

    /// 로컬 커맨드 실행 (성공 시 전파)
    pub async fn execute(&self, cmd: Command) -> Result<AuctionEvent, CommandError> {
        commands::handle_command(cmd, &self.identity, &self.ledger, &self.router).await
    }

    /// 피어 메시지 처리 (전파하지 않음)
    pub async fn ingest(
        &self,
        sender: &PeerIdentity,
        payload: &[u8],
    ) -> Result<AuctionEvent, IngestError> {
        self.ingest.ingest(sender, payload).await
    }

    pub async fn state(&self, name: &str) -> Result<Option<AuctionState>, StorageError> {
        query::get_auction_state(&self.ledger, name).await
    }

    pub async fn history(&self, name: &str) -> Result<Vec<AuctionEvent>, StorageError> {
        query::get_auction_history(&self.ledger, name).await
    }

    pub async fn peers(&self) -> Vec<PeerIdentity> {
        self.connections.connected_peers().await
    }
}
