// region:    --- Imports
use gossip_auction::bidding::commands::Command;
use gossip_auction::config::NodeConfig;
use gossip_auction::handlers;
use gossip_auction::node::AuctionNode;
use gossip_auction::transport;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 설정 로드
    let config = NodeConfig::from_env()?;
    let identity = config.load_identity()?.peer_identity();
    info!("{:<12} --> 로컬 식별자: {}", "Main", identity);

    // 로그 저장소 및 노드 생성
    let store = config.build_store().await?;
    let node = Arc::new(AuctionNode::new(identity, store));

    // 가십 리스너
    let gossip_listener = TcpListener::bind(config.gossip_addr).await?;
    let listener_node = Arc::clone(&node);
    tokio::spawn(async move {
        if let Err(e) = transport::serve(gossip_listener, listener_node).await {
            error!("{:<12} --> 가십 리스너 종료: {}", "Main", e);
        }
    });

    // 설정된 피어에 연결
    for peer in &config.peers {
        if let Err(e) = transport::connect(peer.as_str(), Arc::clone(&node)).await {
            warn!("{:<12} --> 피어 연결 실패 ({}): {}", "Main", peer, e);
        }
    }

    // 표준 입력 커맨드
    let stdin_node = Arc::clone(&node);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(cmd) => match stdin_node.execute(cmd).await {
                    Ok(event) => info!("{:<12} --> 성공: {:?}", "Console", event),
                    Err(e) => warn!("{:<12} --> 실패: {}", "Console", e),
                },
                Err(e) => warn!("{:<12} --> {}", "Console", e),
            }
        }
    });

    // HTTP 서버
    let listener = TcpListener::bind(config.http_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, handlers::routes(node).into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
