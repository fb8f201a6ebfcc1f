// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live leaderboard streaming over WebSocket.
//!
//! Updates pushed here are read-only, non-authoritative mirrors of
//! committed state; clients fetch canonical snapshots over HTTP. A
//! connecting client authenticates once with the ids it wants to
//! watch and is placed into the matching topics; leaving an auction or
//! disconnecting drops the subscriptions. A client can always request
//! a fresh leaderboard instead of waiting for the next mutation.
//!
//! # Protocol
//!
//! Client messages (JSON, tagged by `type`):
//! - `authenticate` with optional `bidder_id`, `auction_id`, `event_id`
//! - `request_leaderboard` with `auction_id`
//! - `leave_auction` with `auction_id`
//!
//! Server messages are [`LiveUpdate`] payloads, starting with
//! `connected` on upgrade.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::{SplitSink, StreamExt}};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_stream::{StreamMap, wrappers::BroadcastStream};
use tracing::{debug, info, warn};

use crate::AppState;
use hive_auction_domain::{AuctionId, BidderId, EventId, format_timestamp};
use hive_auction_notify::{LiveUpdate, Topic, UpdateKind};

/// Messages a client may send over the live stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Join the topics for the given ids.
    Authenticate {
        /// The bidder identity, for bidder-addressed updates.
        bidder_id: Option<String>,
        /// An auction to watch.
        auction_id: Option<i64>,
        /// An event to watch.
        event_id: Option<String>,
    },
    /// Ask for an immediate leaderboard push.
    RequestLeaderboard {
        /// The auction to refresh.
        auction_id: i64,
    },
    /// Stop watching an auction.
    LeaveAuction {
        /// The auction to leave.
        auction_id: i64,
    },
}

/// Error payload sent back to a misbehaving client.
#[derive(Debug, Clone, Serialize)]
struct ClientError {
    r#type: &'static str,
    message: String,
}

/// Handles WebSocket upgrade requests for the live stream.
pub async fn live_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("Client connected to live stream");

    let (mut sender, mut receiver) = socket.split();
    let mut subscriptions: StreamMap<String, BroadcastStream<LiveUpdate>> = StreamMap::new();

    let connected: LiveUpdate = LiveUpdate::Connected {
        timestamp: format_timestamp(OffsetDateTime::now_utc())
            .unwrap_or_else(|_| String::from("unknown")),
    };
    if send_update(&mut sender, &connected).await.is_err() {
        warn!("Failed to send connection confirmation");
        return;
    }

    loop {
        tokio::select! {
            Some((topic, update)) = subscriptions.next() => {
                match update {
                    Ok(update) => {
                        if send_update(&mut sender, &update).await.is_err() {
                            // Client disconnected
                            break;
                        }
                    }
                    Err(lagged) => {
                        // Slow consumer; skip dropped updates
                        debug!(topic = %topic, ?lagged, "Subscriber lagged behind");
                    }
                }
            }
            maybe_message = receiver.next() => {
                match maybe_message {
                    Some(Ok(Message::Text(text))) => {
                        if handle_client_message(&text, &state, &mut sender, &mut subscriptions)
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!("Received unexpected binary message from client, ignoring");
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!("Client sent close frame");
                        break;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by Axum
                    }
                    Some(Err(e)) => {
                        debug!(?e, "WebSocket receive error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    info!("Client disconnected from live stream");
}

async fn send_update(
    sender: &mut SplitSink<WebSocket, Message>,
    update: &LiveUpdate,
) -> Result<(), ()> {
    match serde_json::to_string(update) {
        Ok(json) => sender.send(Message::Text(json.into())).await.map_err(|_| ()),
        Err(e) => {
            warn!(?e, "Failed to serialize live update");
            Ok(())
        }
    }
}

async fn send_error(sender: &mut SplitSink<WebSocket, Message>, message: String) {
    let payload: ClientError = ClientError {
        r#type: "error",
        message,
    };
    if let Ok(json) = serde_json::to_string(&payload) {
        let _ = sender.send(Message::Text(json.into())).await;
    }
}

/// Applies one client message. Returns `Err` only when the connection
/// should close.
async fn handle_client_message(
    text: &str,
    state: &AppState,
    sender: &mut SplitSink<WebSocket, Message>,
    subscriptions: &mut StreamMap<String, BroadcastStream<LiveUpdate>>,
) -> Result<(), ()> {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            debug!(?e, "Unparseable client message");
            send_error(sender, format!("Unrecognized message: {e}")).await;
            return Ok(());
        }
    };

    match message {
        ClientMessage::Authenticate {
            bidder_id,
            auction_id,
            event_id,
        } => {
            if let Some(bidder) = bidder_id {
                subscribe(state, subscriptions, Topic::Bidder(BidderId::new(&bidder))).await;
            }
            if let Some(event) = event_id {
                subscribe(state, subscriptions, Topic::Event(EventId::new(&event))).await;
            }
            if let Some(auction) = auction_id {
                let topic: Topic = Topic::Auction(AuctionId::new(auction));
                subscribe(state, subscriptions, topic).await;

                // Replay current state so the client doesn't wait for
                // the next mutation
                push_snapshot(state, sender, auction, UpdateKind::InitialLoad).await;
            }
            Ok(())
        }
        ClientMessage::RequestLeaderboard { auction_id } => {
            push_snapshot(state, sender, auction_id, UpdateKind::ManualRefresh).await;
            Ok(())
        }
        ClientMessage::LeaveAuction { auction_id } => {
            let topic: Topic = Topic::Auction(AuctionId::new(auction_id));
            subscriptions.remove(&topic.to_string());
            debug!(auction_id, "Client left auction topic");
            Ok(())
        }
    }
}

async fn subscribe(
    state: &AppState,
    subscriptions: &mut StreamMap<String, BroadcastStream<LiveUpdate>>,
    topic: Topic,
) {
    let key: String = topic.to_string();
    if subscriptions.contains_key(&key) {
        debug!(topic = %key, "Already subscribed");
        return;
    }
    let receiver = state.service.broadcaster().subscribe(topic).await;
    subscriptions.insert(key.clone(), BroadcastStream::new(receiver));
    debug!(topic = %key, "Client subscribed");
}

async fn push_snapshot(
    state: &AppState,
    sender: &mut SplitSink<WebSocket, Message>,
    auction_id: i64,
    kind: UpdateKind,
) {
    match state
        .service
        .snapshot_update(AuctionId::new(auction_id), kind, OffsetDateTime::now_utc())
        .await
    {
        Ok(update) => {
            let _ = send_update(sender, &update).await;
        }
        Err(e) => {
            debug!(auction_id, error = %e, "Snapshot request failed");
            send_error(sender, format!("Failed to load auction {auction_id}: {e}")).await;
        }
    }
}
