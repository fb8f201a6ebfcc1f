// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info};

use hive_auction::BidPolicy;
use hive_auction_api::{
    ApiError, AuctionInfo, AuctionService, CreateAuctionRequest, GetAuctionResponse,
    InMemoryDirectory, PlaceBidRequest, PlaceBidResponse, QueueStatusResponse,
    RegisterEventRequest, RetryFailedResponse,
};
use hive_auction_domain::{AuctionId, BidderContact, BidderId, EventDetails, EventId};
use hive_auction_notify::{LogMailer, MailQueue, QueueConfig, TopicBroadcaster};
use hive_auction_persistence::{AuctionStore, Database, JobStore};

mod live;

/// Hive Auction Server - bidding backend for event sponsorship auctions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Allow a bidder to outbid themselves with consecutive bids
    #[arg(long)]
    allow_consecutive_bids: bool,

    /// Create auctions in `pending` status instead of opening them immediately
    #[arg(long)]
    create_pending: bool,

    /// Number of outbound notification workers
    #[arg(long, default_value_t = 5)]
    mail_workers: usize,

    /// Delivery attempts before a notification job is marked failed
    #[arg(long, default_value_t = 3)]
    mail_attempts: i32,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The auction service boundary.
    pub service: AuctionService,
    /// The event/bidder registry (stand-in for external collaborators).
    pub directory: Arc<InMemoryDirectory>,
}

/// API request for registering a bidder's contact details.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RegisterBidderRequest {
    /// The bidder identity.
    bidder_id: String,
    /// Display name.
    name: String,
    /// Contact address for outbound notifications.
    email: String,
}

/// Generic success response for registration endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegisterResponse {
    /// Success indicator.
    success: bool,
    /// A human-readable message.
    message: String,
}

/// Structured error detail in HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorDetail {
    /// Stable error kind for client-side mapping.
    kind: String,
    /// Human-readable message.
    message: String,
    /// Present on `bid_too_low`: the current highest bid.
    #[serde(skip_serializing_if = "Option::is_none")]
    current_highest_bid: Option<i64>,
    /// Present on `bid_too_low`: the minimum acceptable next bid.
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum_next_bid: Option<i64>,
    /// Present on `auction_ended`: when bidding closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// The error detail.
    error: ErrorDetail,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The structured error detail.
    detail: ErrorDetail,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse { error: self.detail });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::NotFound { .. } | ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::AuctionNotActive { .. }
            | ApiError::AuctionEnded { .. }
            | ApiError::ConsecutiveBidderNotAllowed
            | ApiError::BidTooLow { .. }
            | ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::HostCannotBid => StatusCode::FORBIDDEN,
            ApiError::StoreConflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "Internal error");
        }

        let mut detail: ErrorDetail = ErrorDetail {
            kind: err.kind().to_string(),
            message: err.to_string(),
            current_highest_bid: None,
            minimum_next_bid: None,
            end_time: None,
        };

        match err {
            ApiError::BidTooLow {
                current_highest_bid,
                minimum_next_bid,
                ..
            } => {
                detail.current_highest_bid = Some(current_highest_bid);
                detail.minimum_next_bid = Some(minimum_next_bid);
            }
            ApiError::AuctionEnded { end_time } => {
                detail.end_time = Some(end_time);
            }
            _ => {}
        }

        Self { status, detail }
    }
}

/// Handler for POST `/events` endpoint.
///
/// Registers event and host metadata. In production this data comes
/// from the event catalog; the endpoint stands in for that feed.
async fn handle_register_event(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegisterEventRequest>,
) -> Json<RegisterResponse> {
    info!(event_id = %req.event_id, host = %req.host_id, "Registering event");

    let host: BidderId = BidderId::new(&req.host_id);
    app_state.directory.register_bidder(BidderContact::new(
        host.clone(),
        req.host_name.clone(),
        req.host_email.clone(),
    ));
    app_state.directory.register_event(EventDetails::new(
        EventId::new(&req.event_id),
        req.title,
        host,
        req.host_name,
        req.host_email,
    ));

    Json(RegisterResponse {
        success: true,
        message: format!("Event '{}' registered", req.event_id),
    })
}

/// Handler for POST `/bidders` endpoint.
///
/// Registers a bidder's contact details on behalf of the identity
/// collaborator.
async fn handle_register_bidder(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegisterBidderRequest>,
) -> Json<RegisterResponse> {
    info!(bidder_id = %req.bidder_id, "Registering bidder contact");

    app_state.directory.register_bidder(BidderContact::new(
        BidderId::new(&req.bidder_id),
        req.name,
        req.email,
    ));

    Json(RegisterResponse {
        success: true,
        message: format!("Bidder '{}' registered", req.bidder_id),
    })
}

/// Handler for POST `/auctions` endpoint.
async fn handle_create_auction(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreateAuctionRequest>,
) -> Result<(StatusCode, Json<AuctionInfo>), HttpError> {
    info!(event_id = %req.event_id, item = %req.item_name, "Handling create_auction request");

    let info: AuctionInfo = app_state
        .service
        .create_auction(req, OffsetDateTime::now_utc())
        .await?;
    Ok((StatusCode::CREATED, Json(info)))
}

/// Handler for GET `/auctions` endpoint.
async fn handle_list_auctions(
    AxumState(app_state): AxumState<AppState>,
) -> Json<Vec<AuctionInfo>> {
    Json(app_state.service.list_auctions().await)
}

/// Handler for GET `/auctions/{auction_id}` endpoint.
///
/// Fetching is also a lifecycle trigger point: an active auction past
/// its end time is finished before the response is built.
async fn handle_get_auction(
    AxumState(app_state): AxumState<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<Json<GetAuctionResponse>, HttpError> {
    let response: GetAuctionResponse = app_state
        .service
        .get_auction(AuctionId::new(auction_id), OffsetDateTime::now_utc())
        .await?;
    Ok(Json(response))
}

/// Handler for GET `/events/{event_id}/auctions/{auction_id}` endpoint.
async fn handle_get_auction_for_event(
    AxumState(app_state): AxumState<AppState>,
    Path((event_id, auction_id)): Path<(String, i64)>,
) -> Result<Json<GetAuctionResponse>, HttpError> {
    let response: GetAuctionResponse = app_state
        .service
        .get_auction_for_event(
            &EventId::new(&event_id),
            AuctionId::new(auction_id),
            OffsetDateTime::now_utc(),
        )
        .await?;
    Ok(Json(response))
}

/// Handler for POST `/auctions/{auction_id}/activate` endpoint.
async fn handle_activate_auction(
    AxumState(app_state): AxumState<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<Json<AuctionInfo>, HttpError> {
    info!(auction_id, "Handling activate request");

    let info: AuctionInfo = app_state
        .service
        .activate_auction(AuctionId::new(auction_id))
        .await?;
    Ok(Json(info))
}

/// Handler for POST `/auctions/{auction_id}/bids` endpoint.
async fn handle_place_bid(
    AxumState(app_state): AxumState<AppState>,
    Path(auction_id): Path<i64>,
    Json(req): Json<PlaceBidRequest>,
) -> Result<Json<PlaceBidResponse>, HttpError> {
    info!(
        auction_id,
        bidder = %req.bidder_id,
        amount = req.amount,
        "Handling place_bid request"
    );

    let response: PlaceBidResponse = app_state
        .service
        .place_bid(
            AuctionId::new(auction_id),
            BidderId::new(&req.bidder_id),
            req.amount,
            OffsetDateTime::now_utc(),
        )
        .await?;
    Ok(Json(response))
}

/// Handler for GET `/notifications/queue` endpoint.
async fn handle_queue_status(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<QueueStatusResponse>, HttpError> {
    let status: QueueStatusResponse = app_state.service.queue_status().await?;
    Ok(Json(status))
}

/// Handler for POST `/notifications/retry` endpoint.
async fn handle_retry_failed(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<RetryFailedResponse>, HttpError> {
    info!("Handling notification retry request");

    let response: RetryFailedResponse = app_state.service.retry_failed_jobs().await?;
    Ok(Json(response))
}

/// Builds the application router.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/events", post(handle_register_event))
        .route("/bidders", post(handle_register_bidder))
        .route("/auctions", post(handle_create_auction))
        .route("/auctions", get(handle_list_auctions))
        .route("/auctions/{auction_id}", get(handle_get_auction))
        .route("/auctions/{auction_id}/activate", post(handle_activate_auction))
        .route("/auctions/{auction_id}/bids", post(handle_place_bid))
        .route(
            "/events/{event_id}/auctions/{auction_id}",
            get(handle_get_auction_for_event),
        )
        .route("/notifications/queue", get(handle_queue_status))
        .route("/notifications/retry", post(handle_retry_failed))
        .route("/live", get(live::live_handler))
        .with_state(app_state)
}

/// Wires the full application over an opened database.
async fn build_app_state(
    db: Arc<Mutex<Database>>,
    policy: BidPolicy,
    queue_config: QueueConfig,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let store: Arc<AuctionStore> = Arc::new(AuctionStore::load(db.clone()).await?);

    let mail: Arc<MailQueue> = MailQueue::new(JobStore::new(db), Arc::new(LogMailer), queue_config);
    mail.start().await?;

    let directory: Arc<InMemoryDirectory> = Arc::new(InMemoryDirectory::new());
    let service: AuctionService = AuctionService::new(
        store,
        directory.clone(),
        directory.clone(),
        Arc::new(TopicBroadcaster::new()),
        mail,
        policy,
    );

    Ok(AppState { service, directory })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Hive Auction Server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let database: Database = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Database::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Database::new_in_memory()?
    };

    let policy: BidPolicy = BidPolicy::new(args.allow_consecutive_bids, !args.create_pending);
    let queue_config: QueueConfig = QueueConfig {
        workers: args.mail_workers,
        max_attempts: args.mail_attempts,
        ..QueueConfig::default()
    };

    let app_state: AppState =
        build_app_state(Arc::new(Mutex::new(database)), policy, queue_config).await?;

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use std::time::Duration;
    use tower::ServiceExt;

    /// Helper to create test app state with in-memory persistence.
    async fn create_test_app_state(policy: BidPolicy) -> AppState {
        let db = Arc::new(Mutex::new(Database::new_in_memory().unwrap()));
        let queue_config: QueueConfig = QueueConfig {
            workers: 2,
            max_attempts: 3,
            backoff_base: Duration::from_millis(10),
            backoff_cap: Duration::from_millis(50),
        };
        build_app_state(db, policy, queue_config).await.unwrap()
    }

    async fn post_json(app: Router, uri: &str, body: String) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn get_path(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    fn register_event_body() -> String {
        serde_json::to_string(&RegisterEventRequest {
            event_id: String::from("evt-1"),
            title: String::from("Launch Gala"),
            host_id: String::from("host-1"),
            host_name: String::from("Harper Host"),
            host_email: String::from("host@example.com"),
        })
        .unwrap()
    }

    fn create_auction_body() -> String {
        serde_json::to_string(&CreateAuctionRequest {
            event_id: String::from("evt-1"),
            item_name: String::from("Stage banner"),
            item_description: String::from("Banner placement above the main stage"),
            starting_bid: 100,
            bid_increment: 10,
            duration_minutes: 60,
        })
        .unwrap()
    }

    fn place_bid_body(bidder: &str, amount: i64) -> String {
        serde_json::to_string(&PlaceBidRequest {
            bidder_id: bidder.to_string(),
            amount,
        })
        .unwrap()
    }

    /// Registers the test event and creates the standard auction,
    /// returning its id.
    async fn bootstrap_auction(app: &Router) -> i64 {
        let response = post_json(app.clone(), "/events", register_event_body()).await;
        assert_eq!(response.status(), HttpStatusCode::OK);

        let response = post_json(app.clone(), "/auctions", create_auction_body()).await;
        assert_eq!(response.status(), HttpStatusCode::CREATED);
        let info: AuctionInfo = body_json(response).await;
        info.auction_id
    }

    #[tokio::test]
    async fn test_create_and_fetch_auction() {
        let app_state: AppState = create_test_app_state(BidPolicy::default()).await;
        let app: Router = build_router(app_state);
        let auction_id: i64 = bootstrap_auction(&app).await;

        let response = get_path(app.clone(), &format!("/auctions/{auction_id}")).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let fetched: GetAuctionResponse = body_json(response).await;
        assert_eq!(fetched.auction.item_name, "Stage banner");
        assert_eq!(fetched.auction.current_highest_bid, 0);
        assert_eq!(fetched.leaderboard.minimum_next_bid, 100);
        assert_eq!(fetched.auction.total_bids, 0);
    }

    #[tokio::test]
    async fn test_place_bid_and_leaderboard() {
        let app_state: AppState = create_test_app_state(BidPolicy::default()).await;
        let app: Router = build_router(app_state);
        let auction_id: i64 = bootstrap_auction(&app).await;

        let response = post_json(
            app.clone(),
            &format!("/auctions/{auction_id}/bids"),
            place_bid_body("sponsor-1", 100),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let placed: PlaceBidResponse = body_json(response).await;
        assert_eq!(placed.auction.current_highest_bid, 100);
        assert_eq!(placed.leaderboard.minimum_next_bid, 110);
        assert_eq!(placed.leaderboard.current_leader.as_deref(), Some("sponsor-1"));
    }

    #[tokio::test]
    async fn test_bid_too_low_returns_minimum() {
        let app_state: AppState = create_test_app_state(BidPolicy::default()).await;
        let app: Router = build_router(app_state);
        let auction_id: i64 = bootstrap_auction(&app).await;

        post_json(
            app.clone(),
            &format!("/auctions/{auction_id}/bids"),
            place_bid_body("sponsor-1", 100),
        )
        .await;

        let response = post_json(
            app.clone(),
            &format!("/auctions/{auction_id}/bids"),
            place_bid_body("sponsor-2", 105),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
        let body: ErrorResponse = body_json(response).await;
        assert_eq!(body.error.kind, "bid_too_low");
        assert_eq!(body.error.current_highest_bid, Some(100));
        assert_eq!(body.error.minimum_next_bid, Some(110));
    }

    #[tokio::test]
    async fn test_host_bid_is_forbidden() {
        let app_state: AppState = create_test_app_state(BidPolicy::default()).await;
        let app: Router = build_router(app_state);
        let auction_id: i64 = bootstrap_auction(&app).await;

        let response = post_json(
            app.clone(),
            &format!("/auctions/{auction_id}/bids"),
            place_bid_body("host-1", 100),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::FORBIDDEN);
        let body: ErrorResponse = body_json(response).await;
        assert_eq!(body.error.kind, "host_cannot_bid");
    }

    #[tokio::test]
    async fn test_unknown_auction_is_not_found() {
        let app_state: AppState = create_test_app_state(BidPolicy::default()).await;
        let app: Router = build_router(app_state);

        let response = get_path(app.clone(), "/auctions/999").await;
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
        let body: ErrorResponse = body_json(response).await;
        assert_eq!(body.error.kind, "not_found");
    }

    #[tokio::test]
    async fn test_create_auction_for_unknown_event_fails() {
        let app_state: AppState = create_test_app_state(BidPolicy::default()).await;
        let app: Router = build_router(app_state);

        let response = post_json(app.clone(), "/auctions", create_auction_body()).await;
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
        let body: ErrorResponse = body_json(response).await;
        assert_eq!(body.error.kind, "resource_not_found");
    }

    #[tokio::test]
    async fn test_event_scoped_fetch() {
        let app_state: AppState = create_test_app_state(BidPolicy::default()).await;
        let app: Router = build_router(app_state);
        let auction_id: i64 = bootstrap_auction(&app).await;

        let response = get_path(
            app.clone(),
            &format!("/events/evt-1/auctions/{auction_id}"),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);

        let response = get_path(
            app.clone(),
            &format!("/events/evt-2/auctions/{auction_id}"),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pending_auction_activation_flow() {
        let app_state: AppState = create_test_app_state(BidPolicy::new(false, false)).await;
        let app: Router = build_router(app_state);
        let auction_id: i64 = bootstrap_auction(&app).await;

        let response = post_json(
            app.clone(),
            &format!("/auctions/{auction_id}/bids"),
            place_bid_body("sponsor-1", 100),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
        let body: ErrorResponse = body_json(response).await;
        assert_eq!(body.error.kind, "auction_not_active");

        let response = post_json(
            app.clone(),
            &format!("/auctions/{auction_id}/activate"),
            String::new(),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);

        let response = post_json(
            app.clone(),
            &format!("/auctions/{auction_id}/bids"),
            place_bid_body("sponsor-1", 100),
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
    }

    #[tokio::test]
    async fn test_queue_inspection_endpoints() {
        let app_state: AppState = create_test_app_state(BidPolicy::default()).await;
        let app: Router = build_router(app_state);

        let response = get_path(app.clone(), "/notifications/queue").await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let status: QueueStatusResponse = body_json(response).await;
        assert_eq!(status.failed, 0);

        let response = post_json(app.clone(), "/notifications/retry", String::new()).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let retry: RetryFailedResponse = body_json(response).await;
        assert_eq!(retry.retried, 0);
    }

    #[tokio::test]
    async fn test_list_auctions() {
        let app_state: AppState = create_test_app_state(BidPolicy::default()).await;
        let app: Router = build_router(app_state);
        bootstrap_auction(&app).await;

        let response = post_json(app.clone(), "/auctions", create_auction_body()).await;
        assert_eq!(response.status(), HttpStatusCode::CREATED);

        let response = get_path(app.clone(), "/auctions").await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let listed: Vec<AuctionInfo> = body_json(response).await;
        assert_eq!(listed.len(), 2);
    }
}
