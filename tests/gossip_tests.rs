mod common;

use common::{init_tracing, settle, wait_for_len};
use gossip_auction::auction::{AuctionEvent, EventKind, PeerIdentity, Proposal};
use gossip_auction::bidding::commands::Command;
use gossip_auction::error::{ApplyError, CommandError, IngestError, RejectReason};
use gossip_auction::gossip::wire;
use gossip_auction::node::AuctionNode;
use gossip_auction::transport;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn cmd(kind: EventKind, name: &str, price: Decimal) -> Command {
    Command {
        kind,
        name: name.to_string(),
        price,
    }
}

fn rejection(result: Result<AuctionEvent, CommandError>) -> RejectReason {
    match result {
        Err(CommandError::Apply(ApplyError::Rejected(reason))) => reason,
        other => panic!("거절을 기대했으나: {:?}", other),
    }
}

async fn mesh(names: &[&str]) -> Vec<Arc<AuctionNode>> {
    let nodes: Vec<Arc<AuctionNode>> = names
        .iter()
        .map(|name| Arc::new(AuctionNode::in_memory(*name)))
        .collect();
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            transport::link_in_process(&nodes[i], &nodes[j]).await;
        }
    }
    nodes
}

async fn prices(node: &AuctionNode, name: &str) -> Vec<Decimal> {
    node.history(name)
        .await
        .unwrap()
        .iter()
        .map(|e| e.price())
        .collect()
}

async fn wait_all(nodes: &[Arc<AuctionNode>], name: &str, len: usize) {
    for node in nodes {
        wait_for_len(node, name, len).await;
    }
}

/// 개설 → 입찰 → 종료 → 재개설 시나리오
#[tokio::test]
async fn test_auction_scenario_across_peers() {
    init_tracing();
    let nodes = mesh(&["peer-a", "peer-b", "peer-c"]).await;
    let (a, b, c) = (&nodes[0], &nodes[1], &nodes[2]);

    a.execute(cmd(EventKind::Open, "pic1", dec!(75))).await.unwrap();
    wait_all(&nodes, "pic1", 1).await;

    // 같은 가격 입찰은 거절되고 전파되지 않음
    let reason = rejection(b.execute(cmd(EventKind::Bid, "pic1", dec!(75))).await);
    assert!(matches!(reason, RejectReason::PriceNotHigher { .. }));

    c.execute(cmd(EventKind::Bid, "pic1", dec!(75.5))).await.unwrap();
    wait_all(&nodes, "pic1", 2).await;

    b.execute(cmd(EventKind::Bid, "pic1", dec!(80))).await.unwrap();
    wait_all(&nodes, "pic1", 3).await;

    let closed = a.execute(cmd(EventKind::Close, "pic1", dec!(80))).await.unwrap();
    assert_eq!(closed.owner_field(), b.identity());
    wait_all(&nodes, "pic1", 4).await;

    // 모든 피어가 같은 이력을 가짐 (행위자는 연결 식별자)
    for node in &nodes {
        let history = node.history("pic1").await.unwrap();
        let actors: Vec<&str> = history.iter().map(|e| e.actor_field().as_str()).collect();
        assert_eq!(actors, vec!["peer-a", "peer-c", "peer-b", "peer-a"]);
        assert_eq!(history[1].owner_field().as_str(), "peer-a");
        assert_eq!(history[3].owner_field().as_str(), "peer-b");
        assert_eq!(history[3].price(), dec!(80));
    }

    // 낙찰자만 재개설 가능
    let reason = rejection(a.execute(cmd(EventKind::Open, "pic1", dec!(90))).await);
    assert_eq!(reason, RejectReason::ReopenForbidden);

    let reopened = b.execute(cmd(EventKind::Open, "pic1", dec!(90))).await.unwrap();
    assert_eq!(reopened.owner_field(), b.identity());
    wait_all(&nodes, "pic1", 5).await;
}

/// 늦게 참여한 피어는 이전 이벤트를 받지 못함 (알려진 한계)
#[tokio::test]
async fn test_late_joiner_has_no_history() {
    init_tracing();
    let nodes = mesh(&["peer-a", "peer-b"]).await;
    let (a, b) = (&nodes[0], &nodes[1]);

    a.execute(cmd(EventKind::Open, "pic1", dec!(10))).await.unwrap();
    wait_for_len(b, "pic1", 1).await;
    b.execute(cmd(EventKind::Bid, "pic1", dec!(11))).await.unwrap();
    wait_all(&nodes, "pic1", 2).await;

    let late = Arc::new(AuctionNode::in_memory("peer-late"));
    transport::link_in_process(a, &late).await;
    settle().await;

    assert!(late.history("pic1").await.unwrap().is_empty());
    assert!(late.state("pic1").await.unwrap().is_none());

    // 이후 전파된 입찰도 개설 기록이 없어 거절된다
    a.execute(cmd(EventKind::Bid, "pic1", dec!(12))).await.unwrap();
    wait_for_len(b, "pic1", 3).await;
    settle().await;
    assert!(late.history("pic1").await.unwrap().is_empty());
}

/// 수신 메시지는 재전파되지 않음 (1홉)
#[tokio::test]
async fn test_ingest_does_not_relay() {
    init_tracing();
    let a = Arc::new(AuctionNode::in_memory("peer-a"));
    let b = Arc::new(AuctionNode::in_memory("peer-b"));
    let c = Arc::new(AuctionNode::in_memory("peer-c"));
    // a - b - c 직선 연결
    transport::link_in_process(&a, &b).await;
    transport::link_in_process(&b, &c).await;

    a.execute(cmd(EventKind::Open, "vase", dec!(5))).await.unwrap();
    wait_for_len(&b, "vase", 1).await;
    settle().await;

    assert!(c.history("vase").await.unwrap().is_empty());
}

/// 잘못된 페이로드는 폐기되고 원장에 영향 없음
#[tokio::test]
async fn test_malformed_payload_is_discarded() {
    init_tracing();
    let node = AuctionNode::in_memory("peer-a");
    let sender = PeerIdentity::from("peer-x");

    let result = node.ingest(&sender, b"{\"kind\":\"Open\"}").await;
    assert!(matches!(result, Err(IngestError::Decode(_))));
    assert!(node.ledger().names().await.unwrap().is_empty());

    let payload = wire::encode(&Proposal::Bid {
        name: "ghost".to_string(),
        price: dec!(1),
    });
    let result = node.ingest(&sender, &payload).await;
    assert!(matches!(
        result,
        Err(IngestError::Apply(ApplyError::Rejected(
            RejectReason::AuctionNotFound
        )))
    ));
}

/// 중복 전달은 두 번째에서 거절됨
#[tokio::test]
async fn test_duplicate_delivery_is_rejected() {
    let node = AuctionNode::in_memory("peer-a");
    let seller = PeerIdentity::from("peer-s");
    let bidder = PeerIdentity::from("peer-b");

    let open = wire::encode(&Proposal::Open {
        name: "clock".to_string(),
        price: dec!(20),
    });
    let bid = wire::encode(&Proposal::Bid {
        name: "clock".to_string(),
        price: dec!(25),
    });

    node.ingest(&seller, &open).await.unwrap();
    node.ingest(&bidder, &bid).await.unwrap();
    assert!(node.ingest(&bidder, &bid).await.is_err());
    assert_eq!(node.history("clock").await.unwrap().len(), 2);
}

/// 경쟁 입찰이 전달 순서에 따라 피어별로 다른 내용을 남김 (조정 프로토콜 없음)
#[tokio::test]
async fn test_concurrent_bids_fork_replicas() {
    init_tracing();
    let seller = PeerIdentity::from("peer-s");
    let b = AuctionNode::in_memory("peer-b");
    let c = AuctionNode::in_memory("peer-c");

    let open = wire::encode(&Proposal::Open {
        name: "pic1".to_string(),
        price: dec!(75),
    });
    b.ingest(&seller, &open).await.unwrap();
    c.ingest(&seller, &open).await.unwrap();

    // 각자 로컬 입찰 후 상대의 입찰을 수신
    let bid_80 = Proposal::Bid {
        name: "pic1".to_string(),
        price: dec!(80),
    };
    let bid_85 = Proposal::Bid {
        name: "pic1".to_string(),
        price: dec!(85),
    };
    b.ledger().apply(b.identity(), &bid_80).await.unwrap();
    c.ledger().apply(c.identity(), &bid_85).await.unwrap();

    assert!(b.ingest(c.identity(), &wire::encode(&bid_85)).await.is_ok());
    assert!(c.ingest(b.identity(), &wire::encode(&bid_80)).await.is_err());

    assert_eq!(prices(&b, "pic1").await, vec![dec!(75), dec!(80), dec!(85)]);
    assert_eq!(prices(&c, "pic1").await, vec![dec!(75), dec!(85)]);
}

/// 동시에 실행된 로컬 커맨드도 로컬 로그 순서대로 송신됨
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_local_commands_broadcast_in_log_order() {
    use tokio::sync::mpsc;

    let node = Arc::new(AuctionNode::in_memory("peer-a"));
    let (tx, mut rx) = mpsc::unbounded_channel();
    node.connections()
        .register(PeerIdentity::from("peer-b"), tx)
        .await;

    node.execute(cmd(EventKind::Open, "pic1", dec!(1))).await.unwrap();

    let tasks: Vec<_> = (2..40)
        .map(|price| {
            let node = Arc::clone(&node);
            tokio::spawn(async move {
                node.execute(cmd(EventKind::Bid, "pic1", Decimal::from(price)))
                    .await
            })
        })
        .collect();
    for task in tasks {
        let _ = task.await.unwrap();
    }

    let mut sent = Vec::new();
    while let Ok(payload) = rx.try_recv() {
        sent.push(wire::decode(&payload).unwrap().price());
    }
    assert_eq!(sent, prices(&node, "pic1").await);
}

/// TCP 연결 위에서의 전파와 연결 식별자
#[tokio::test]
async fn test_tcp_transport_propagates_with_connection_identity() {
    init_tracing();
    let a = Arc::new(AuctionNode::in_memory("peer-a"));
    let b = Arc::new(AuctionNode::in_memory("peer-b"));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(transport::serve(listener, Arc::clone(&a)));
    transport::connect(addr, Arc::clone(&b)).await.unwrap();

    for _ in 0..200 {
        if a.peers().await.len() == 1 && b.peers().await.len() == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(a.peers().await, vec![b.identity().clone()]);
    assert_eq!(b.peers().await, vec![a.identity().clone()]);

    a.execute(cmd(EventKind::Open, "lamp", dec!(30))).await.unwrap();
    wait_for_len(&b, "lamp", 1).await;

    b.execute(cmd(EventKind::Bid, "lamp", dec!(31.25))).await.unwrap();
    let history = wait_for_len(&a, "lamp", 2).await;
    assert_eq!(history[1].actor_field(), b.identity());
    assert_eq!(history[1].owner_field(), a.identity());
    assert_eq!(history[1].price(), dec!(31.25));
}

/// 닫힌 연결로의 전송은 실패로 기록되고 재시도하지 않음
#[tokio::test]
async fn test_broadcast_reports_closed_connections() {
    use gossip_auction::gossip::{BroadcastRouter, ConnectionSet};
    use tokio::sync::mpsc;

    let connections = Arc::new(ConnectionSet::new(PeerIdentity::from("peer-a")));
    let (live, mut live_rx) = mpsc::unbounded_channel();
    let (dead, dead_rx) = mpsc::unbounded_channel();
    drop(dead_rx);
    connections.register(PeerIdentity::from("peer-b"), live).await;
    connections.register(PeerIdentity::from("peer-c"), dead).await;

    let router = BroadcastRouter::new(connections.clone());
    let proposal = Proposal::Open {
        name: "pic1".to_string(),
        price: dec!(75),
    };
    let report = router.broadcast_local_action(&proposal).await;

    assert_eq!(report.delivered, vec![PeerIdentity::from("peer-b")]);
    assert_eq!(report.failed, vec![PeerIdentity::from("peer-c")]);

    let payload = live_rx.recv().await.unwrap();
    assert_eq!(wire::decode(&payload).unwrap(), proposal);
    assert!(live_rx.try_recv().is_err());
}
