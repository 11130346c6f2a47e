/// 피어 연결 관리
/// - TCP 위에 줄 단위 프레임 (첫 줄은 식별자 교환, 이후 한 줄이 가십 페이로드 하나)
/// - 피어 탐색, 암호화, 재연결은 하지 않는다
// region:    --- Imports
use crate::auction::PeerIdentity;
use crate::error::TransportError;
use crate::node::AuctionNode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Handshake
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Hello {
    hello: PeerIdentity,
}

/// 식별자 교환. 상대의 식별자를 반환한다.
async fn handshake(
    reader: &mut BufReader<OwnedReadHalf>,
    writer: &mut OwnedWriteHalf,
    local: &PeerIdentity,
) -> Result<PeerIdentity, TransportError> {
    let hello = serde_json::to_string(&Hello {
        hello: local.clone(),
    })
    .map_err(|e| TransportError::Handshake(e.to_string()))?;
    writer.write_all(format!("{}\n", hello).as_bytes()).await?;
    writer.flush().await?;

    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(TransportError::Handshake(
            "식별자 교환 전에 연결이 닫혔습니다.".to_string(),
        ));
    }
    let Hello { hello: peer } = serde_json::from_str(line.trim_end())
        .map_err(|e| TransportError::Handshake(e.to_string()))?;

    if &peer == local {
        return Err(TransportError::Handshake(
            "자기 자신과는 연결할 수 없습니다.".to_string(),
        ));
    }
    Ok(peer)
}

// endregion: --- Handshake

// region:    --- Connection
/// 핸드셰이크 후 연결 등록, 송신 태스크와 수신 루프 실행
async fn run_connection(stream: TcpStream, node: Arc<AuctionNode>) -> Result<(), TransportError> {
    let peer_addr = stream.peer_addr()?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let peer = handshake(&mut reader, &mut write_half, node.identity()).await?;
    info!(
        "{:<12} --> 핸드셰이크 완료: peer={}, addr={}",
        "Transport", peer, peer_addr
    );

    let (outbound, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    node.connections()
        .register(peer.clone(), outbound.clone())
        .await;

    // 송신 태스크
    let writer_peer = peer.clone();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            let write = async {
                write_half.write_all(&payload).await?;
                write_half.write_all(b"\n").await?;
                write_half.flush().await
            };
            if let Err(e) = write.await {
                warn!(
                    "{:<12} --> 송신 실패: peer={}, error={}",
                    "Transport", writer_peer, e
                );
                break;
            }
        }
    });

    // 수신 루프
    let mut lines = reader.lines();
    let result = loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                // 결과는 MessageIngest가 기록한다
                let _ = node.ingest(&peer, line.as_bytes()).await;
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(TransportError::Io(e)),
        }
    };

    node.connections().unregister(&peer, &outbound).await;
    writer.abort();
    info!("{:<12} --> 연결 종료: peer={}", "Transport", peer);
    result
}

/// 들어오는 연결 수락
pub async fn serve(listener: TcpListener, node: Arc<AuctionNode>) -> Result<(), TransportError> {
    info!(
        "{:<12} --> 가십 리스너 시작: {}",
        "Transport",
        listener.local_addr()?
    );
    loop {
        let (stream, addr) = listener.accept().await?;
        debug!("{:<12} --> 연결 수락: {}", "Transport", addr);
        let node = Arc::clone(&node);
        tokio::spawn(async move {
            if let Err(e) = run_connection(stream, node).await {
                error!("{:<12} --> 연결 오류 ({}): {}", "Transport", addr, e);
            }
        });
    }
}

/// 피어에 연결. 연결 처리는 백그라운드 태스크에서 계속된다.
pub async fn connect(
    addr: impl ToSocketAddrs,
    node: Arc<AuctionNode>,
) -> Result<JoinHandle<()>, TransportError> {
    let stream = TcpStream::connect(addr).await?;
    let remote = stream.peer_addr()?;
    info!("{:<12} --> 피어 연결 시도: {}", "Transport", remote);

    Ok(tokio::spawn(async move {
        if let Err(e) = run_connection(stream, node).await {
            error!("{:<12} --> 연결 오류 ({}): {}", "Transport", remote, e);
        }
    }))
}

// endregion: --- Connection

// region:    --- In-process Link
/// 소켓 없이 두 노드를 채널로 연결 (양방향)
pub async fn link_in_process(a: &Arc<AuctionNode>, b: &Arc<AuctionNode>) -> Vec<JoinHandle<()>> {
    vec![pump(a, b).await, pump(b, a).await]
}

/// from → to 단방향 채널
async fn pump(from: &Arc<AuctionNode>, to: &Arc<AuctionNode>) -> JoinHandle<()> {
    let (outbound, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    from.connections()
        .register(to.identity().clone(), outbound)
        .await;

    let sender = from.identity().clone();
    let to = Arc::clone(to);
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            let _ = to.ingest(&sender, &payload).await;
        }
    })
}

// endregion: --- In-process Link
