/// 노드 설정 (환경변수)
// region:    --- Imports
use crate::auction::LocalIdentity;
use crate::database::DatabaseManager;
use crate::error::ConfigError;
use crate::ledger::{JsonlLogStore, LogStore, MemoryLogStore, PostgresLogStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Store Kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Jsonl,
    Postgres { database_url: String },
}

// endregion: --- Store Kind

// region:    --- Node Config
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub gossip_addr: SocketAddr,
    pub http_addr: SocketAddr,
    pub peers: Vec<String>,
    pub data_dir: PathBuf,
    pub store: StoreKind,
    pub identity_seed: Option<String>,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 조회 함수로부터 설정 구성
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gossip_addr = parse_addr(
            "AUCTION_GOSSIP_ADDR",
            lookup("AUCTION_GOSSIP_ADDR").unwrap_or_else(|| "0.0.0.0:7000".to_string()),
        )?;
        let http_addr = parse_addr(
            "AUCTION_HTTP_ADDR",
            lookup("AUCTION_HTTP_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        )?;

        let peers = lookup("AUCTION_PEERS")
            .map(|peers| {
                peers
                    .split(',')
                    .map(str::trim)
                    .filter(|peer| !peer.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let data_dir = PathBuf::from(
            lookup("AUCTION_DATA_DIR").unwrap_or_else(|| "./data".to_string()),
        );

        let store = match lookup("AUCTION_STORE")
            .unwrap_or_else(|| "jsonl".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => StoreKind::Memory,
            "jsonl" => StoreKind::Jsonl,
            "postgres" => StoreKind::Postgres {
                database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            other => return Err(ConfigError::UnknownStore(other.to_string())),
        };

        Ok(Self {
            gossip_addr,
            http_addr,
            peers,
            data_dir,
            store,
            identity_seed: lookup("AUCTION_IDENTITY_SEED"),
        })
    }

    /// 로컬 식별자 로드
    pub fn load_identity(&self) -> Result<LocalIdentity, ConfigError> {
        match &self.identity_seed {
            Some(seed) => LocalIdentity::from_hex(seed),
            None => LocalIdentity::load_or_create(&self.data_dir),
        }
    }

    /// 설정된 로그 저장소 생성
    pub async fn build_store(&self) -> Result<Arc<dyn LogStore>, Box<dyn std::error::Error>> {
        let store: Arc<dyn LogStore> = match &self.store {
            StoreKind::Memory => Arc::new(MemoryLogStore::new()),
            StoreKind::Jsonl => Arc::new(JsonlLogStore::new(self.data_dir.join("auctions")).await?),
            StoreKind::Postgres { database_url } => {
                let db_manager = DatabaseManager::connect(database_url).await?;
                db_manager.initialize_database().await?;
                Arc::new(PostgresLogStore::new(&db_manager))
            }
        };
        info!("{:<12} --> 로그 저장소: {:?}", "Config", self.store_label());
        Ok(store)
    }

    fn store_label(&self) -> &'static str {
        match self.store {
            StoreKind::Memory => "memory",
            StoreKind::Jsonl => "jsonl",
            StoreKind::Postgres { .. } => "postgres",
        }
    }
}

fn parse_addr(key: &'static str, value: String) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidAddr {
        key,
        reason: e.to_string(),
        value,
    })
}

// endregion: --- Node Config
