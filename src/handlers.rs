// region:    --- Imports
use crate::auction::EventKind;
use crate::bidding::commands::{AuctionRequest, Command};
use crate::error::{ApplyError, CommandError, RejectReason};
use crate::node::AuctionNode;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

// region:    --- Router
pub fn routes(node: Arc<AuctionNode>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/open", post(handle_open))
        .route("/bid", post(handle_bid))
        .route("/close", post(handle_close))
        .route("/auctions", get(handle_get_auctions))
        .route("/auction/:name", get(handle_get_auction_state))
        .route("/auction/:name/history", get(handle_get_auction_history))
        .route("/peers", get(handle_get_peers))
        .layer(cors)
        .with_state(node)
}

// endregion: --- Router

// region:    --- Command Handlers

/// 경매 개설 요청 처리
pub async fn handle_open(
    State(node): State<Arc<AuctionNode>>,
    payload: Result<Json<AuctionRequest>, JsonRejection>,
) -> Response {
    run_request(&node, EventKind::Open, payload).await
}

/// 입찰 요청 처리
pub async fn handle_bid(
    State(node): State<Arc<AuctionNode>>,
    payload: Result<Json<AuctionRequest>, JsonRejection>,
) -> Response {
    run_request(&node, EventKind::Bid, payload).await
}

/// 경매 종료 요청 처리
pub async fn handle_close(
    State(node): State<Arc<AuctionNode>>,
    payload: Result<Json<AuctionRequest>, JsonRejection>,
) -> Response {
    run_request(&node, EventKind::Close, payload).await
}

/// 요청 본문 → 커맨드 (형식/검증 실패는 400)
async fn run_request(
    node: &AuctionNode,
    kind: EventKind,
    payload: Result<Json<AuctionRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_command(rejection.body_text()),
    };
    match Command::new(kind, request) {
        Ok(cmd) => run_command(node, cmd).await,
        Err(e) => invalid_command(e.to_string()),
    }
}

async fn run_command(node: &AuctionNode, cmd: Command) -> Response {
    info!("{:<12} --> {} 요청: {}", "Handler", cmd.kind, cmd.name);
    match node.execute(cmd).await {
        Ok(event) => (StatusCode::OK, Json(event)).into_response(),
        Err(CommandError::Apply(ApplyError::Rejected(reason))) => {
            let status = match reason {
                RejectReason::AuctionNotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::CONFLICT,
            };
            (
                status,
                Json(serde_json::json!({
                    "error": reason.to_string(),
                    "code": reason.code(),
                })),
            )
                .into_response()
        }
        Err(e @ (CommandError::Parse(_) | CommandError::Invalid(_))) => {
            invalid_command(e.to_string())
        }
        Err(e) => internal_error(e),
    }
}

fn invalid_command(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message, "code": "INVALID_COMMAND"})),
    )
        .into_response()
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 경매 상태 조회
pub async fn handle_get_auction_state(
    State(node): State<Arc<AuctionNode>>,
    Path(name): Path<String>,
) -> Response {
    match node.state(&name).await {
        Ok(Some(state)) => Json(state).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": RejectReason::AuctionNotFound.to_string(),
                "code": RejectReason::AuctionNotFound.code(),
            })),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

/// 경매 이력 조회
pub async fn handle_get_auction_history(
    State(node): State<Arc<AuctionNode>>,
    Path(name): Path<String>,
) -> Response {
    match node.history(&name).await {
        Ok(history) => Json(history).into_response(),
        Err(e) => internal_error(e),
    }
}

/// 경매 목록 조회
pub async fn handle_get_auctions(State(node): State<Arc<AuctionNode>>) -> Response {
    match node.ledger().names().await {
        Ok(names) => Json(names).into_response(),
        Err(e) => internal_error(e),
    }
}

/// 연결된 피어 조회
pub async fn handle_get_peers(State(node): State<Arc<AuctionNode>>) -> Response {
    Json(node.peers().await).into_response()
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": e.to_string(), "code": "STORAGE_ERROR"})),
    )
        .into_response()
}

// endregion: --- Query Handlers
