//! Collection snapshot listeners over WebSocket.
//!
//! `GET /ws/collections/:collection` upgrades to a socket that receives the
//! full collection as a `snapshot` message on connect and again after every
//! committed change to it. A `resync` change (the listener fell behind the
//! feed) is answered the same way, since every message is a full snapshot.
//!
//! Connection lifecycle:
//! 1. Client opens the socket; unknown collections are refused with 404
//! 2. Server subscribes to the change feed, then sends the first snapshot
//! 3. Each change triggers a fresh snapshot; a heartbeat goes out every 30s
//! 4. The socket closes when the client sends `unsubscribe` or closes, or
//!    when the listener is cancelled server-side

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::api::error::ApiError;
use crate::api::types::{parse_collection, ApiContext};
use crate::db::{ChangeEvent, Document, DocumentStore};
use crate::models::enums::Collection;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Outgoing buffer per socket. Snapshots are large; keep it short.
const OUTGOING_BUFFER: usize = 16;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WsOutgoing {
    Snapshot {
        collection: Collection,
        /// Absent on the first snapshot.
        #[serde(skip_serializing_if = "Option::is_none")]
        change: Option<ChangeEvent>,
        documents: Vec<Document>,
    },
    #[serde(rename_all = "camelCase")]
    Heartbeat { server_time: String },
    Error { message: String },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WsIncoming {
    Unsubscribe,
}

fn snapshot(store: &DocumentStore, collection: Collection, change: Option<ChangeEvent>) -> WsOutgoing {
    match store.get_all(collection) {
        Ok(documents) => WsOutgoing::Snapshot {
            collection,
            change,
            documents,
        },
        Err(e) => {
            tracing::warn!(collection = collection.as_str(), "Snapshot load failed: {e}");
            WsOutgoing::Error {
                message: format!("could not load {collection}"),
            }
        }
    }
}

/// WebSocket upgrade handler. The collection is checked before upgrading.
pub async fn ws_subscribe(
    ws: WebSocketUpgrade,
    State(ctx): State<ApiContext>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = parse_collection(&collection)?;
    tracing::info!(collection = collection.as_str(), "Snapshot listener connecting");
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, ctx, collection)))
}

/// Spawns a sender task for channel→WS forwarding, then runs the change +
/// receive + heartbeat loop until the listener ends.
async fn handle_ws(socket: WebSocket, ctx: ApiContext, collection: Collection) {
    let (ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<WsOutgoing>(OUTGOING_BUFFER);

    let sender_handle = tokio::spawn(async move {
        let mut sink = ws_sink;
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(j) => j,
                Err(_) => continue,
            };
            if sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Subscribe before the first snapshot so no change falls in between.
    let mut subscription = ctx.store().subscribe(collection);
    let listener_id = subscription.id;

    if tx.send(snapshot(ctx.store(), collection, None)).await.is_ok() {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                change = subscription.next_change() => match change {
                    Some(event) => {
                        if tx.send(snapshot(ctx.store(), collection, Some(event))).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!(listener = %listener_id, "Listener cancelled");
                        break;
                    }
                },
                msg = ws_stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<WsIncoming>(&text) {
                        Ok(WsIncoming::Unsubscribe) => break,
                        Err(_) => {
                            let _ = tx
                                .send(WsOutgoing::Error {
                                    message: "unrecognised message".into(),
                                })
                                .await;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                },
                _ = heartbeat.tick() => {
                    let _ = tx
                        .send(WsOutgoing::Heartbeat {
                            server_time: chrono::Utc::now().to_rfc3339(),
                        })
                        .await;
                }
            }
        }
    }

    drop(subscription);
    drop(tx);
    let _ = sender_handle.await;

    tracing::info!(listener = %listener_id, collection = collection.as_str(), "Snapshot listener closed");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::router::api_router;
    use crate::config::Config;
    use crate::core_state::CoreState;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite;

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn setup_ws_server() -> (String, Arc<CoreState>, tokio::task::JoinHandle<()>) {
        let core = Arc::new(CoreState::with_store(
            DocumentStore::open_in_memory().unwrap(),
            Config::default(),
        ));
        let app = api_router(core.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("ws://127.0.0.1:{}", addr.port()), core, handle)
    }

    /// Next JSON message, skipping heartbeats. `None` once the socket ends.
    async fn next_json(ws: &mut Client) -> Option<Value> {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("timeout waiting for message");
            match msg {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    let v: Value = serde_json::from_str(&text).unwrap();
                    if v["type"] != "heartbeat" {
                        return Some(v);
                    }
                }
                Some(Ok(tungstenite::Message::Close(_))) | None | Some(Err(_)) => return None,
                Some(Ok(_)) => {}
            }
        }
    }

    fn patient(first: &str) -> Value {
        json!({ "firstName": first, "lastName": "Test" })
    }

    #[tokio::test]
    async fn first_message_is_a_snapshot() {
        let (base, core, server) = setup_ws_server().await;
        core.store().create(Collection::Patients, patient("Ali")).unwrap();

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("{base}/ws/collections/patients"))
            .await
            .expect("WS connect failed");

        let first = next_json(&mut ws).await.unwrap();
        assert_eq!(first["type"], "snapshot");
        assert_eq!(first["collection"], "patients");
        assert!(first.get("change").is_none());
        assert_eq!(first["documents"].as_array().unwrap().len(), 1);
        assert_eq!(first["documents"][0]["firstName"], "Ali");

        let _ = ws.close(None).await;
        server.abort();
    }

    #[tokio::test]
    async fn changes_push_fresh_snapshots() {
        let (base, core, server) = setup_ws_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("{base}/ws/collections/patients"))
            .await
            .unwrap();
        let first = next_json(&mut ws).await.unwrap();
        assert!(first["documents"].as_array().unwrap().is_empty());

        let doc = core.store().create(Collection::Patients, patient("Mariam")).unwrap();
        let update = next_json(&mut ws).await.unwrap();
        assert_eq!(update["change"]["kind"], "created");
        assert_eq!(update["change"]["id"], doc.id.as_str());
        assert_eq!(update["documents"].as_array().unwrap().len(), 1);

        core.store().delete(Collection::Patients, &doc.id).unwrap();
        let update = next_json(&mut ws).await.unwrap();
        assert_eq!(update["change"]["kind"], "deleted");
        assert!(update["documents"].as_array().unwrap().is_empty());

        let _ = ws.close(None).await;
        server.abort();
    }

    #[tokio::test]
    async fn other_collections_do_not_trigger_snapshots() {
        let (base, core, server) = setup_ws_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("{base}/ws/collections/patients"))
            .await
            .unwrap();
        next_json(&mut ws).await.unwrap();

        core.store()
            .create(Collection::Staff, json!({ "firstName": "Nour" }))
            .unwrap();
        core.store().create(Collection::Patients, patient("Youssef")).unwrap();

        let update = next_json(&mut ws).await.unwrap();
        assert_eq!(update["collection"], "patients");
        assert_eq!(update["documents"][0]["firstName"], "Youssef");

        let _ = ws.close(None).await;
        server.abort();
    }

    #[tokio::test]
    async fn unsubscribe_message_closes_listener() {
        let (base, core, server) = setup_ws_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("{base}/ws/collections/waitingList"))
            .await
            .unwrap();
        next_json(&mut ws).await.unwrap();
        assert_eq!(core.store().active_listeners(), 1);

        ws.send(tungstenite::Message::Text(r#"{"type":"unsubscribe"}"#.into()))
            .await
            .unwrap();
        assert!(next_json(&mut ws).await.is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(core.store().active_listeners(), 0);
        server.abort();
    }

    #[tokio::test]
    async fn unsubscribe_all_closes_open_sockets() {
        let (base, core, server) = setup_ws_server().await;
        let (mut a, _) = tokio_tungstenite::connect_async(format!("{base}/ws/collections/patients"))
            .await
            .unwrap();
        let (mut b, _) = tokio_tungstenite::connect_async(format!("{base}/ws/collections/invoices"))
            .await
            .unwrap();
        next_json(&mut a).await.unwrap();
        next_json(&mut b).await.unwrap();

        assert_eq!(core.store().unsubscribe_all(), 2);
        assert!(next_json(&mut a).await.is_none());
        assert!(next_json(&mut b).await.is_none());
        server.abort();
    }

    #[tokio::test]
    async fn malformed_message_keeps_connection() {
        let (base, core, server) = setup_ws_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("{base}/ws/collections/patients"))
            .await
            .unwrap();
        next_json(&mut ws).await.unwrap();

        ws.send(tungstenite::Message::Text("not json".into())).await.unwrap();
        let reply = next_json(&mut ws).await.unwrap();
        assert_eq!(reply["type"], "error");

        core.store().create(Collection::Patients, patient("Nadia")).unwrap();
        let update = next_json(&mut ws).await.unwrap();
        assert_eq!(update["type"], "snapshot");

        let _ = ws.close(None).await;
        server.abort();
    }

    #[tokio::test]
    async fn unknown_collection_rejects_upgrade() {
        let (base, _core, server) = setup_ws_server().await;
        let result = tokio_tungstenite::connect_async(format!("{base}/ws/collections/secrets")).await;
        assert!(result.is_err());
        server.abort();
    }

    #[test]
    fn outgoing_messages_are_tagged() {
        let v = serde_json::to_value(WsOutgoing::Heartbeat {
            server_time: "2026-01-01T00:00:00Z".into(),
        })
        .unwrap();
        assert_eq!(v["type"], "heartbeat");
        assert!(v["serverTime"].is_string());

        let incoming: WsIncoming = serde_json::from_str(r#"{"type":"unsubscribe"}"#).unwrap();
        assert!(matches!(incoming, WsIncoming::Unsubscribe));
    }
}
