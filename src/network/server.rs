//! HTTP surface of the node.
//!
//! A thin layer that marshals the node operations: decode, delegate, map
//! errors to status codes. Validation failures surface as 400, internal
//! mining failures as 500, and method mismatches as 405 via method routing.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde::Deserialize;

use crate::core::{Block, Transaction};
use crate::error::NodeError;
use crate::network::node::{Node, NODE_ADDRESS_HEADER};

pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/chain", get(get_chain))
        .route("/peers", get(get_peers).post(add_peer))
        .route("/balance", get(get_balance))
        .route("/mine", post(mine))
        .route("/transaction", post(receive_transaction))
        .route("/block", post(receive_block))
        .with_state(node)
}

/// Bind the node's address and serve requests until shutdown.
pub async fn serve(node: Arc<Node>) -> Result<(), NodeError> {
    let address = node.address().to_string();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| NodeError::Network(format!("Failed to bind to {address}: {e}")))?;

    info!("[{address}] Starting server...");
    axum::serve(listener, router(node))
        .await
        .map_err(|e| NodeError::Network(format!("Server error: {e}")))
}

async fn get_chain(State(node): State<Arc<Node>>) -> Response {
    let chain = node.chain_snapshot();
    Json(&*chain).into_response()
}

async fn get_peers(State(node): State<Arc<Node>>) -> Json<Vec<String>> {
    Json(node.get_peers())
}

#[derive(Debug, Deserialize)]
struct PeerRequest {
    peer: String,
}

async fn add_peer(
    State(node): State<Arc<Node>>,
    body: Result<Json<PeerRequest>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(request)) => {
            node.add_peer(&request.peer);
            (StatusCode::OK, "Peer added").into_response()
        }
        Err(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct BalanceParams {
    address: Option<String>,
}

async fn get_balance(
    State(node): State<Arc<Node>>,
    Query(params): Query<BalanceParams>,
) -> Response {
    match params.address {
        Some(address) if !address.is_empty() => {
            let balance = node.chain_snapshot().get_balance(&address);
            Json(serde_json::json!({ "balance": balance })).into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "address parameter required").into_response(),
    }
}

async fn mine(State(node): State<Arc<Node>>) -> Response {
    match node.mine().await {
        Ok(()) => (StatusCode::OK, "Block mined successfully").into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn receive_transaction(
    State(node): State<Arc<Node>>,
    headers: HeaderMap,
    body: Result<Json<Transaction>, JsonRejection>,
) -> Response {
    add_sender_as_peer(&node, &headers);

    let Json(tx) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response()
        }
    };

    match node.receive_transaction(tx) {
        Ok(()) => (StatusCode::OK, "Transaction received").into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

async fn receive_block(
    State(node): State<Arc<Node>>,
    headers: HeaderMap,
    body: Result<Json<Block>, JsonRejection>,
) -> Response {
    add_sender_as_peer(&node, &headers);

    let Json(block) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response()
        }
    };

    match node.receive_block(block).await {
        Ok(()) => (StatusCode::OK, "Block received, syncing chain").into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// Implicit peer discovery: gossip requests carry the sender's address.
fn add_sender_as_peer(node: &Node, headers: &HeaderMap) {
    if let Some(sender) = headers
        .get(NODE_ADDRESS_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        if !sender.is_empty() {
            node.add_peer(sender);
        }
    }
}
