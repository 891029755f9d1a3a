// region:    --- Imports
use crate::auction::model::{AuctionId, AuctionWindow, NewAuction};
use crate::bidding::commands::PlaceBidCommand;
use crate::engine::AuctionEngine;
use crate::error::AuctionError;
use crate::identity::Caller;
use crate::payment::PaymentProof;
use crate::phase::Phase;
use crate::query::{AuctionFilter, AuctionSort};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

type EngineState = State<Arc<AuctionEngine>>;

// region:    --- Router
pub fn router(engine: Arc<AuctionEngine>) -> Router {
    Router::new()
        .route(
            "/auctions",
            get(handle_list_auctions).post(handle_create_auction),
        )
        .route(
            "/auctions/:id",
            get(handle_get_auction).delete(handle_delete_auction),
        )
        .route(
            "/auctions/:id/bids",
            get(handle_get_bid_history).post(handle_place_bid),
        )
        .route("/auctions/:id/winner", get(handle_get_winner))
        .route("/auctions/:id/payment", post(handle_confirm_payment))
        .route("/auctions/:id/republish", put(handle_republish))
        .with_state(engine)
}

// endregion: --- Router

// region:    --- Error Response
impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuctionError::Phase { .. } | AuctionError::BidTooLow { .. } => StatusCode::CONFLICT,
            AuctionError::SelfBid | AuctionError::InvalidAuction(_) => StatusCode::BAD_REQUEST,
            AuctionError::InvalidWindow => StatusCode::UNPROCESSABLE_ENTITY,
            AuctionError::Authorization { .. } => StatusCode::FORBIDDEN,
            AuctionError::NotFound(_) => StatusCode::NOT_FOUND,
            AuctionError::Retryable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
                "code": self.code()
            })),
        )
            .into_response()
    }
}

// endregion: --- Error Response

// region:    --- Command Handlers
#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub amount: i64,
}

/// 경매 등록
pub async fn handle_create_auction(
    State(engine): EngineState,
    Caller(principal): Caller,
    Json(auction): Json<NewAuction>,
) -> Result<impl IntoResponse, AuctionError> {
    let view = engine.create_auction(principal, auction).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(engine): EngineState,
    Path(auction_id): Path<AuctionId>,
    Caller(principal): Caller,
    Json(req): Json<BidRequest>,
) -> Result<impl IntoResponse, AuctionError> {
    let cmd = PlaceBidCommand {
        auction_id,
        bidder_id: principal.id,
        amount: req.amount,
    };
    let receipt = engine.place_bid(cmd).await?;
    Ok(Json(receipt))
}

/// 결제 확정 (게이트웨이 검증 결과 전달)
pub async fn handle_confirm_payment(
    State(engine): EngineState,
    Path(auction_id): Path<AuctionId>,
    Caller(principal): Caller,
    Json(proof): Json<PaymentProof>,
) -> Result<impl IntoResponse, AuctionError> {
    let outcome = engine.confirm_payment(auction_id, principal, proof).await?;
    Ok(Json(serde_json::json!({ "outcome": outcome })))
}

/// 재등록
pub async fn handle_republish(
    State(engine): EngineState,
    Path(auction_id): Path<AuctionId>,
    Caller(principal): Caller,
    Json(window): Json<AuctionWindow>,
) -> Result<impl IntoResponse, AuctionError> {
    let view = engine
        .republish_auction(principal, auction_id, window)
        .await?;
    Ok(Json(view))
}

/// 삭제
pub async fn handle_delete_auction(
    State(engine): EngineState,
    Path(auction_id): Path<AuctionId>,
    Caller(principal): Caller,
) -> Result<impl IntoResponse, AuctionError> {
    engine.delete_auction(principal, auction_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// endregion: --- Command Handlers

// region:    --- Query Handlers
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub phase: Option<Phase>,
    #[serde(default)]
    pub sort: AuctionSort,
}

/// 경매 목록 조회
pub async fn handle_list_auctions(
    State(engine): EngineState,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 경매 목록 조회: {:?}", "HandlerQuery", params);
    let filter = AuctionFilter {
        category: params.category,
        search: params.search,
        phase: params.phase,
    };
    let auctions = engine.list_auctions(&filter, params.sort).await?;
    Ok(Json(auctions))
}

/// 경매 조회
pub async fn handle_get_auction(
    State(engine): EngineState,
    Path(auction_id): Path<AuctionId>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", auction_id);
    Ok(Json(engine.get_auction(auction_id).await?))
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(engine): EngineState,
    Path(auction_id): Path<AuctionId>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "HandlerQuery", auction_id);
    Ok(Json(engine.bid_history(auction_id).await?))
}

/// 낙찰 조회
pub async fn handle_get_winner(
    State(engine): EngineState,
    Path(auction_id): Path<AuctionId>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 낙찰 조회 id: {}", "HandlerQuery", auction_id);
    Ok(Json(engine.winner(auction_id).await?))
}

// endregion: --- Query Handlers
