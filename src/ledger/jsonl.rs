/// JSONL 파일 저장소
/// 경매 하나당 파일 하나 (파일명 = 이름의 hex), 한 줄에 항목 하나
// region:    --- Imports
use super::LogStore;
use crate::auction::AuctionEvent;
use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::info;

// endregion: --- Imports

const EXTENSION: &str = "jsonl";

pub struct JsonlLogStore {
    base_path: PathBuf,
    // 파일 내용의 메모리 사본
    logs: RwLock<HashMap<String, Vec<AuctionEvent>>>,
}

impl JsonlLogStore {
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).await?;
        info!(
            "{:<12} --> JSONL 저장소 경로: {}",
            "JsonlStore",
            base_path.display()
        );

        Ok(Self {
            base_path,
            logs: RwLock::new(HashMap::new()),
        })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.{}", hex::encode(name.as_bytes()), EXTENSION))
    }

    /// 파일에서 전체 항목 읽기
    async fn read_file(&self, name: &str) -> Result<Vec<AuctionEvent>, StorageError> {
        let path = self.file_path(name);
        if !fs::try_exists(&path).await? {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let mut events = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let event: AuctionEvent =
                serde_json::from_str(line).map_err(|e| StorageError::Corrupt {
                    name: name.to_string(),
                    index: index as u64,
                    reason: e.to_string(),
                })?;
            events.push(event);
        }
        Ok(events)
    }

    async fn ensure_loaded(&self, name: &str) -> Result<(), StorageError> {
        if self.logs.read().await.contains_key(name) {
            return Ok(());
        }
        let events = self.read_file(name).await?;
        // 없는 로그는 캐시하지 않는다. 첫 추가 시 만들어진다.
        if events.is_empty() {
            return Ok(());
        }
        self.logs
            .write()
            .await
            .entry(name.to_string())
            .or_insert(events);
        Ok(())
    }
}

#[async_trait]
impl LogStore for JsonlLogStore {
    async fn open(&self, name: &str) -> Result<(), StorageError> {
        self.ensure_loaded(name).await
    }

    async fn len(&self, name: &str) -> Result<u64, StorageError> {
        self.ensure_loaded(name).await?;
        let logs = self.logs.read().await;
        Ok(logs.get(name).map_or(0, |log| log.len() as u64))
    }

    async fn get(&self, name: &str, index: u64) -> Result<Option<AuctionEvent>, StorageError> {
        self.ensure_loaded(name).await?;
        let logs = self.logs.read().await;
        Ok(logs
            .get(name)
            .and_then(|log| log.get(index as usize))
            .cloned())
    }

    async fn append(&self, name: &str, event: &AuctionEvent) -> Result<u64, StorageError> {
        self.ensure_loaded(name).await?;
        let line = serde_json::to_string(event)?;

        // 쓰기 잠금을 유지한 채 파일과 사본을 함께 갱신
        let mut logs = self.logs.write().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_path(name))
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;

        let log = logs.entry(name.to_string()).or_default();
        log.push(event.clone());
        Ok(log.len() as u64)
    }

    async fn names(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != EXTENSION) {
                continue;
            }
            let decoded = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| hex::decode(stem).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok());
            if let Some(name) = decoded {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
