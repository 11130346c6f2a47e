/// 경매별 append-only 이벤트 로그
/// 1. 로그 저장소 트레이트 (메모리 / JSONL / Postgres)
/// 2. 이름별 직렬화를 보장하는 Ledger
// region:    --- Imports
use crate::auction::{evaluate, AuctionEvent, PeerIdentity, Proposal};
use crate::error::{ApplyError, StorageError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

// endregion: --- Imports

// region:    --- Modules
pub mod jsonl;
pub mod memory;
pub mod postgres;

pub use jsonl::JsonlLogStore;
pub use memory::MemoryLogStore;
pub use postgres::PostgresLogStore;

// endregion: --- Modules

// region:    --- Log Store Trait
/// 이름 단위 append-only 시퀀스 저장소
#[async_trait]
pub trait LogStore: Send + Sync {
    /// 로그가 없으면 생성 (멱등)
    async fn open(&self, name: &str) -> Result<(), StorageError>;

    async fn len(&self, name: &str) -> Result<u64, StorageError>;

    async fn get(&self, name: &str, index: u64) -> Result<Option<AuctionEvent>, StorageError>;

    /// 항목 하나를 추가하고 새 길이를 반환
    async fn append(&self, name: &str, event: &AuctionEvent) -> Result<u64, StorageError>;

    /// 알려진 경매 이름 목록
    async fn names(&self) -> Result<Vec<String>, StorageError>;
}

// endregion: --- Log Store Trait

// region:    --- Ledger
/// 열린 로그 핸들
#[derive(Debug, Clone)]
pub struct LogHandle {
    name: String,
}

impl LogHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 경매 원장
pub struct Ledger {
    store: Arc<dyn LogStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Ledger {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 메모리 저장소를 사용하는 원장
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryLogStore::new()))
    }

    /// 로그 열기 (최초 참조 시 생성)
    pub async fn open_log(&self, name: &str) -> Result<LogHandle, StorageError> {
        self.store.open(name).await?;
        Ok(LogHandle {
            name: name.to_string(),
        })
    }

    async fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(name.to_string()).or_default())
    }

    /// 거절된 제안이 남긴 빈 로그의 잠금 정리
    /// 다른 작업이 같은 잠금을 쥐고 있으면 남겨 둔다.
    async fn release_if_empty(&self, name: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        let unused = locks
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, &lock))
            && Arc::strong_count(&lock) == 2;
        if unused && matches!(self.store.len(name).await, Ok(0)) {
            locks.remove(name);
        }
    }

    /// 마지막 항목 조회 (비어 있으면 None)
    pub async fn tail(&self, handle: &LogHandle) -> Result<Option<AuctionEvent>, StorageError> {
        self.last_entry(&handle.name).await
    }

    /// 이름으로 마지막 항목 조회. 로그를 만들지 않는다.
    pub async fn last_entry(&self, name: &str) -> Result<Option<AuctionEvent>, StorageError> {
        let len = self.store.len(name).await?;
        if len == 0 {
            return Ok(None);
        }
        self.store.get(name, len - 1).await
    }

    /// 검증 없이 항목 추가
    /// 검증을 거친 추가는 `apply`를 사용한다.
    pub async fn append(
        &self,
        handle: &LogHandle,
        event: &AuctionEvent,
    ) -> Result<u64, StorageError> {
        let len = self.store.append(&handle.name, event).await?;
        debug!(
            "{:<12} --> 로그 추가: name={}, kind={}, len={}",
            "Ledger",
            handle.name,
            event.kind(),
            len
        );
        Ok(len)
    }

    /// 전체 이력 조회
    pub async fn history(&self, name: &str) -> Result<Vec<AuctionEvent>, StorageError> {
        let len = self.store.len(name).await?;
        let mut events = Vec::with_capacity(len as usize);
        for index in 0..len {
            let event = self
                .store
                .get(name, index)
                .await?
                .ok_or_else(|| StorageError::Corrupt {
                    name: name.to_string(),
                    index,
                    reason: "길이 내 항목이 없습니다.".to_string(),
                })?;
            events.push(event);
        }
        Ok(events)
    }

    pub async fn names(&self) -> Result<Vec<String>, StorageError> {
        self.store.names().await
    }

    /// 제안 → 검증 → 추가
    /// 같은 이름에 대한 tail 조회와 추가 사이에 다른 추가가 끼어들지 않는다. (프로세스 내)
    pub async fn apply(
        &self,
        actor: &PeerIdentity,
        proposal: &Proposal,
    ) -> Result<AuctionEvent, ApplyError> {
        let (event, _guard) = self.apply_guarded(actor, proposal).await?;
        Ok(event)
    }

    /// `apply`와 같되 이름별 잠금을 쥔 채 반환한다.
    /// 가드를 놓기 전까지 같은 이름의 다음 제안은 평가되지 않는다.
    pub async fn apply_guarded(
        &self,
        actor: &PeerIdentity,
        proposal: &Proposal,
    ) -> Result<(AuctionEvent, OwnedMutexGuard<()>), ApplyError> {
        let name = proposal.name();
        let lock = self.lock_for(name).await;
        let guard = Arc::clone(&lock).lock_owned().await;

        match self.evaluate_and_append(actor, proposal).await {
            Ok(event) => Ok((event, guard)),
            Err(e) => {
                drop(guard);
                self.release_if_empty(name, lock).await;
                Err(e)
            }
        }
    }

    async fn evaluate_and_append(
        &self,
        actor: &PeerIdentity,
        proposal: &Proposal,
    ) -> Result<AuctionEvent, ApplyError> {
        let name = proposal.name();
        let tail = self.last_entry(name).await?;
        let event = match evaluate(tail.as_ref(), actor, proposal, Utc::now()) {
            Ok(event) => event,
            Err(reason) => {
                warn!(
                    "{:<12} --> 거절: name={}, kind={}, actor={}, reason={}",
                    "Ledger",
                    name,
                    proposal.kind(),
                    actor,
                    reason
                );
                return Err(reason.into());
            }
        };

        let len = self.store.append(name, &event).await?;
        info!(
            "{:<12} --> 수락: name={}, kind={}, actor={}, price={}, len={}",
            "Ledger",
            name,
            event.kind(),
            actor,
            event.price(),
            len
        );
        Ok(event)
    }
}

// endregion: --- Ledger

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn bid(name: &str, price: i64) -> Proposal {
        Proposal::Bid {
            name: name.to_string(),
            price: Decimal::from(price),
        }
    }

    #[tokio::test]
    async fn rejected_unknown_names_leave_no_state() {
        let ledger = Ledger::in_memory();
        let peer = PeerIdentity::from("peer-x");

        for i in 0..50 {
            let result = ledger.apply(&peer, &bid(&format!("ghost-{i}"), 1)).await;
            assert!(matches!(
                result,
                Err(ApplyError::Rejected(crate::error::RejectReason::AuctionNotFound))
            ));
            assert!(ledger.last_entry(&format!("missing-{i}")).await.unwrap().is_none());
        }

        assert!(ledger.locks.lock().await.is_empty());
        assert!(ledger.names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn existing_logs_keep_their_lock() {
        let ledger = Ledger::in_memory();
        let seller = PeerIdentity::from("peer-a");
        let open = Proposal::Open {
            name: "pic1".to_string(),
            price: Decimal::from(10),
        };
        ledger.apply(&seller, &open).await.unwrap();
        assert!(ledger.apply(&seller, &bid("pic1", 5)).await.is_err());

        let locks = ledger.locks.lock().await;
        assert_eq!(locks.keys().collect::<Vec<_>>(), vec!["pic1"]);
    }

    #[tokio::test]
    async fn guard_blocks_next_proposal_on_same_name() {
        let ledger = Arc::new(Ledger::in_memory());
        let seller = PeerIdentity::from("peer-a");
        let open = Proposal::Open {
            name: "pic1".to_string(),
            price: Decimal::from(10),
        };
        let (_, guard) = ledger.apply_guarded(&seller, &open).await.unwrap();

        let pending = tokio::spawn({
            let ledger = Arc::clone(&ledger);
            async move { ledger.apply(&PeerIdentity::from("peer-b"), &bid("pic1", 11)).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!pending.is_finished());
        assert_eq!(ledger.history("pic1").await.unwrap().len(), 1);

        drop(guard);
        pending.await.unwrap().unwrap();
        assert_eq!(ledger.history("pic1").await.unwrap().len(), 2);
    }
}
