//! # REST + WebSocket API
//!
//! Builds the axum router that exposes the hosted vault over HTTP.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path       | Description                               |
//! |--------|------------|-------------------------------------------|
//! | GET    | `/health`  | Liveness probe                            |
//! | GET    | `/vault`   | Vault snapshot                            |
//! | GET    | `/events`  | Event log, optionally `?since=<index>`    |
//! | POST   | `/rpc`     | JSON-RPC 2.0 gateway                      |
//! | GET    | `/ws`      | WebSocket for live vault events           |
//!
//! ## JSON-RPC methods
//!
//! | Method                          | Params                               |
//! |---------------------------------|--------------------------------------|
//! | `vault_execute`                 | `{ caller, op, ...arguments }`       |
//! | `vault_call`                    | `{ caller?, data }` (ABI calldata)   |
//! | `vault_snapshot`                | none                                 |
//! | `vault_totalUnderlyingAtPrice`  | `[priceX96]`                         |
//! | `vault_version`                 | none                                 |
//!
//! Rejected vault calls answer with code `-32000` and the ABI error name,
//! message and revert data in `error.data`.

use alloy_primitives::{aliases::U160, Address, Bytes};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metavault_contracts::MetaVault;
use metavault_protocol::{VaultError, VaultEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::SharedMetrics;
use crate::scenario::ScenarioCall;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The hosted vault. Writers are serialized by the lock.
    pub vault: Arc<RwLock<MetaVault>>,
    /// Broadcast channel for live event notifications.
    pub event_tx: broadcast::Sender<NodeEvent>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

/// Events pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum NodeEvent {
    /// The vault emitted an event.
    #[serde(rename = "vault_event")]
    Vault {
        /// Position in the vault's event log.
        index: usize,
        /// Unix timestamp (milliseconds) at which the node observed it.
        timestamp: u64,
        #[serde(flatten)]
        event: VaultEvent,
    },
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/vault", get(vault_handler))
        .route("/events", get(events_handler))
        .route("/rpc", post(rpc_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// JSON-RPC Types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Method parameters (positional or named).
    pub params: Option<serde_json::Value>,
    /// Request identifier. Echoed back in the response.
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version. Always "2.0".
    pub jsonrpc: String,
    /// The result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier, echoed from the request.
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Short human-readable error description.
    pub message: String,
    /// Optional structured error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: None,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: message.into(),
            data: None,
        }
    }

    /// A rejected vault call, in the shape EVM nodes use for reverts.
    fn reverted(err: &VaultError) -> Self {
        Self {
            code: -32000,
            message: format!("execution reverted: {}", err),
            data: Some(serde_json::json!({
                "error": err.name(),
                "revertData": err.revert_data(),
            })),
        }
    }
}

/// Params of `vault_call`.
#[derive(Debug, Deserialize)]
pub struct CallParams {
    /// Sender of the call. Zero when omitted, which suits view calls.
    #[serde(default)]
    pub caller: Address,
    /// ABI calldata.
    pub data: Bytes,
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// An event together with its position in the log.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexedEvent {
    pub index: usize,
    #[serde(flatten)]
    pub event: VaultEvent,
}

/// Response payload for `GET /events`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<IndexedEvent>,
    /// Cursor to pass as `since` on the next poll.
    pub next: usize,
}

/// Query string of `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /vault`: current vault snapshot.
async fn vault_handler(State(state): State<AppState>) -> impl IntoResponse {
    let vault = state.vault.read().await;
    Json(vault.snapshot())
}

/// `GET /events?since=N`: events from index `N` on.
async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> impl IntoResponse {
    let vault = state.vault.read().await;
    let start = query.since.min(vault.events().len());
    let events = vault
        .events_since(start)
        .iter()
        .enumerate()
        .map(|(offset, event)| IndexedEvent {
            index: start + offset,
            event: event.clone(),
        })
        .collect();
    Json(EventsResponse {
        events,
        next: vault.events().len(),
    })
}

/// `POST /rpc`: JSON-RPC 2.0 gateway.
///
/// Routes method calls to internal handlers. Unknown methods return
/// error code -32601 (Method not found).
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    if req.jsonrpc != "2.0" {
        return Json(JsonRpcResponse {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(JsonRpcError {
                code: -32600,
                message: "Invalid Request: jsonrpc must be \"2.0\"".into(),
                data: None,
            }),
            id: req.id,
        });
    }

    let params = req.params.unwrap_or(serde_json::Value::Null);
    let outcome = match req.method.as_str() {
        "vault_execute" => rpc_execute(&state, params).await,
        "vault_call" => rpc_call(&state, params).await,
        "vault_snapshot" => {
            let vault = state.vault.read().await;
            to_json(&vault.snapshot())
        }
        "vault_totalUnderlyingAtPrice" => rpc_total_underlying_at_price(&state, params).await,
        "vault_version" => Ok(serde_json::json!(state.version)),
        _ => Err(JsonRpcError {
            code: -32601,
            message: format!("Method not found: {}", req.method),
            data: None,
        }),
    };

    let (result, error) = match outcome {
        Ok(value) => (Some(value), None),
        Err(error) => (None, Some(error)),
    };
    Json(JsonRpcResponse {
        jsonrpc: "2.0".into(),
        result,
        error,
        id: req.id,
    })
}

type RpcResult = Result<serde_json::Value, JsonRpcError>;

fn to_json<T: Serialize>(value: &T) -> RpcResult {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal(format!("Internal error: {}", e)))
}

/// `vault_execute`: runs a typed call.
async fn rpc_execute(state: &AppState, params: serde_json::Value) -> RpcResult {
    let ScenarioCall { caller, call } = serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))?;

    let events = submit(state, |vault| vault.execute(caller, call)).await?;
    to_json(&serde_json::json!({ "events": events }))
}

/// `vault_call`: runs raw ABI calldata and returns the return data.
///
/// Views are answered under the read lock and are not counted as calls.
async fn rpc_call(state: &AppState, params: serde_json::Value) -> RpcResult {
    let CallParams { caller, data } = serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))?;

    {
        let vault = state.vault.read().await;
        if let Some(ret) = vault.view_abi(&data).map_err(|e| JsonRpcError::reverted(&e))? {
            return to_json(&ret);
        }
    }

    let mut ret = Bytes::new();
    submit(state, |vault| {
        let cursor = vault.events().len();
        ret = vault.call_abi(caller, &data)?;
        Ok(vault.events_since(cursor).to_vec())
    })
    .await?;
    to_json(&ret)
}

/// `vault_totalUnderlyingAtPrice`: expects `[priceX96]`.
async fn rpc_total_underlying_at_price(state: &AppState, params: serde_json::Value) -> RpcResult {
    let (price_x96,): (U160,) = serde_json::from_value(params)
        .map_err(|_| JsonRpcError::invalid_params("Invalid params: expected [priceX96]"))?;

    let vault = state.vault.read().await;
    let (amount0, amount1) = vault
        .total_underlying_at_price(price_x96)
        .map_err(|e| JsonRpcError::reverted(&e))?;
    to_json(&serde_json::json!({ "amount0": amount0, "amount1": amount1 }))
}

/// Runs a mutating call under the write lock, records it, and broadcasts the
/// events it emitted.
async fn submit<F>(state: &AppState, f: F) -> Result<Vec<VaultEvent>, JsonRpcError>
where
    F: FnOnce(&mut MetaVault) -> Result<Vec<VaultEvent>, VaultError>,
{
    let mut vault = state.vault.write().await;
    let first_index = vault.events().len();

    let started = Instant::now();
    let result = f(&mut *vault);
    state
        .metrics
        .call_latency_seconds
        .observe(started.elapsed().as_secs_f64());
    state.metrics.record_call(&result);
    state.metrics.observe_vault(&vault);

    let events = result.map_err(|e| JsonRpcError::reverted(&e))?;
    let timestamp = chrono::Utc::now().timestamp_millis() as u64;
    for (offset, event) in events.iter().enumerate() {
        // No subscribers is fine.
        let _ = state.event_tx.send(NodeEvent::Vault {
            index: first_index + offset,
            timestamp,
            event: event.clone(),
        });
    }
    Ok(events)
}

/// `GET /ws`: WebSocket upgrade for live event streaming.
///
/// Clients receive JSON-encoded [`NodeEvent`] messages for every event the
/// vault emits. The connection is read-only from the server's perspective;
/// client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
