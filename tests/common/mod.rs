#![allow(dead_code)]

use gossip_auction::auction::AuctionEvent;
use gossip_auction::node::AuctionNode;
use std::time::Duration;

/// 트레이싱 초기화 (여러 테스트에서 호출해도 안전)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// 로그 길이가 기대값이 될 때까지 대기
pub async fn wait_for_len(node: &AuctionNode, name: &str, len: usize) -> Vec<AuctionEvent> {
    for _ in 0..200 {
        let history = node.history(name).await.expect("이력 조회 실패");
        if history.len() == len {
            return history;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "{} 노드의 {} 로그 길이가 {}에 도달하지 않았습니다.",
        node.identity(),
        name,
        len
    );
}

/// 전파가 일어나지 않았음을 확인하기 위한 대기
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
