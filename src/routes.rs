use crate::{
    error::AppError,
    hub::{
        Hub,
        HubEvent,
    },
};
use axum::{
    extract::{
        ws::{
            Message,
            WebSocket,
            WebSocketUpgrade,
        },
        State,
    },
    response::Response,
    routing::get,
    Json,
    Router,
};
use deskfleet_model::{
    AgentMessage,
    HubMessage,
};
use eyre::Result;
use futures::{
    sink::SinkExt,
    stream::{
        SplitSink,
        SplitStream,
        StreamExt,
    },
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
}

pub fn create_router(hub: Arc<Hub>) -> Router {
    let state = AppState { hub };

    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(summary))
        .route("/export", get(export))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn summary(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "agents": state.hub.summarize(),
    }))
}

async fn export(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (headers, rows) = state.hub.export_rows();
    Json(serde_json::json!({
        "headers": headers,
        "rows": rows,
    }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<Hub>) {
    let connection = hub.next_connection();
    info!(%connection, "new websocket connection");

    let (mut sender, receiver) = socket.split();

    let hello = HubMessage::Hello {
        msg: "connected".to_string(),
    };
    if sender.send(Message::Text(hello.to_json().into())).await.is_err() {
        return;
    }

    if let Err(e) = handle_socket_inner(&mut sender, receiver, &hub, connection).await {
        error!(%connection, "error handling websocket connection: {}", e);
        sender
            .send(AppError::Socket(e).into_message())
            .await
            .unwrap_or_else(|e| error!("failed to send error message: {}", e));
    }

    // Disconnect cleanup; a second call for an already-removed connection
    // is a no-op, so racing close paths are fine.
    hub.unregister(connection);
    info!(%connection, "websocket connection closed");
}

async fn handle_socket_inner(
    sender: &mut SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    hub: &Hub,
    connection: crate::registry::ConnectionId,
) -> Result<()> {
    // Subscribed before the first message so a registration's own host-list
    // broadcast reaches this connection too.
    let mut events = hub.subscribe();

    loop {
        tokio::select! {
            message = receiver.next() => {
                let Some(message) = message else {
                    return Ok(());
                };
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<AgentMessage>(&text) {
                        Ok(AgentMessage::Register { host }) => {
                            debug!(%connection, %host, "agent registered");
                            hub.register(connection, host.clone());
                            let reply = HubMessage::Registered { host };
                            sender.send(Message::Text(reply.to_json().into())).await?;
                        }
                        Ok(AgentMessage::Snapshot(snapshot)) => {
                            hub.ingest(connection, snapshot);
                        }
                        Err(e) => {
                            // A malformed payload gets an error reply; the
                            // connection and its registration survive.
                            debug!(%connection, "unparseable agent message: {}", e);
                            sender.send(AppError::Payload(e).into_message()).await?;
                        }
                    },
                    Ok(Message::Close(_)) => {
                        return Ok(());
                    }
                    Ok(Message::Ping(ping)) => {
                        sender.send(Message::Pong(ping)).await?;
                    }
                    Ok(Message::Pong(_)) | Ok(Message::Binary(_)) => {}
                    Err(e) => {
                        return Err(e.into());
                    }
                }
            },
            event = events.recv() => match event {
                Ok(event) => {
                    let message = match event {
                        HubEvent::HostList(hosts) => HubMessage::HostList { hosts },
                        HubEvent::Telemetry(snapshot) => HubMessage::Telemetry((*snapshot).clone()),
                    };
                    sender.send(Message::Text(message.to_json().into())).await?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%connection, skipped, "subscriber lagging, events dropped");
                }
                Err(RecvError::Closed) => {
                    return Ok(());
                }
            },
        }
    }
}
