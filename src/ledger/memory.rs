use super::LogStore;
use crate::auction::AuctionEvent;
use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 프로세스 메모리 저장소 (재시작 시 소실)
#[derive(Default)]
pub struct MemoryLogStore {
    logs: RwLock<HashMap<String, Vec<AuctionEvent>>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn open(&self, name: &str) -> Result<(), StorageError> {
        self.logs
            .write()
            .await
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn len(&self, name: &str) -> Result<u64, StorageError> {
        let logs = self.logs.read().await;
        Ok(logs.get(name).map_or(0, |log| log.len() as u64))
    }

    async fn get(&self, name: &str, index: u64) -> Result<Option<AuctionEvent>, StorageError> {
        let logs = self.logs.read().await;
        Ok(logs
            .get(name)
            .and_then(|log| log.get(index as usize))
            .cloned())
    }

    async fn append(&self, name: &str, event: &AuctionEvent) -> Result<u64, StorageError> {
        let mut logs = self.logs.write().await;
        let log = logs.entry(name.to_string()).or_default();
        log.push(event.clone());
        Ok(log.len() as u64)
    }

    async fn names(&self) -> Result<Vec<String>, StorageError> {
        let logs = self.logs.read().await;
        let mut names: Vec<String> = logs
            .iter()
            .filter(|(_, log)| !log.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}
