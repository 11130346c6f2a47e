/// 로컬 피어 식별자
/// Ed25519 공개키를 hex로 표현한 값. 서명에는 사용하지 않는다.
// region:    --- Imports
use super::events::PeerIdentity;
use crate::error::ConfigError;
use ed25519_dalek::SigningKey;
use std::path::Path;
use tracing::info;

// endregion: --- Imports

const SEED_FILE: &str = "identity.seed";

pub struct LocalIdentity {
    signing_key: SigningKey,
}

impl LocalIdentity {
    /// hex 시드(32바이트)로부터 생성
    pub fn from_hex(hex_seed: &str) -> Result<Self, ConfigError> {
        let bytes = hex::decode(hex_seed.trim())
            .map_err(|e| ConfigError::InvalidSeed(format!("hex 디코딩 실패: {}", e)))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ConfigError::InvalidSeed("시드는 32바이트여야 합니다.".to_string()))?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// 데이터 디렉터리의 시드 파일을 읽거나, 없으면 새로 만들어 저장
    pub fn load_or_create(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(SEED_FILE);
        if path.exists() {
            let seed = std::fs::read_to_string(&path)?;
            return Self::from_hex(&seed);
        }

        std::fs::create_dir_all(data_dir)?;
        let identity = Self::generate();
        std::fs::write(&path, identity.seed_hex())?;
        info!(
            "{:<12} --> 새 식별자 생성: {}",
            "Identity",
            identity.peer_identity()
        );
        Ok(identity)
    }

    pub fn seed_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn peer_identity(&self) -> PeerIdentity {
        PeerIdentity::new(hex::encode(self.signing_key.verifying_key().to_bytes()))
    }
}
