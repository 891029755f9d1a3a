/// 입찰 관련 커맨드 처리
/// 입찰은 경매 단위 트랜잭션 안에서 현재 가격을 읽고 새 가격을 쓰는 하나의 비교 후 교체(CAS)로 처리한다.
/// 엔진은 자동 재시도를 하지 않는다. 일시적 오류는 그대로 호출자에게 전달한다.
// region:    --- Imports
use crate::auction::model::{AuctionId, AuctionRecord, Bid, UserId};
use crate::error::{AuctionError, AuctionResult};
use crate::phase::{Clock, Phase};
use crate::store::{AuctionStore, Change};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: AuctionId,
    pub bidder_id: UserId,
    pub amount: i64,
}

/// 입찰 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidReceipt {
    pub auction_id: AuctionId,
    pub bid: Bid,
    pub current_bid: i64,
    pub bidder_count: usize,
}

/// 입찰 검증 및 반영
/// 판매자 본인 입찰 → 진행 단계 → 금액 순서로 검사한다. 실패하면 레코드는 그대로다.
pub fn admit_bid(
    record: &mut AuctionRecord,
    bidder_id: UserId,
    amount: i64,
    now: DateTime<Utc>,
) -> AuctionResult<()> {
    let auction = &record.auction;

    if bidder_id == auction.owner_id {
        return Err(AuctionError::SelfBid);
    }

    let phase = auction.phase_at(now);
    if phase != Phase::Active {
        return Err(AuctionError::Phase {
            expected: Phase::Active,
            actual: phase,
        });
    }

    if amount <= auction.current_bid {
        return Err(AuctionError::BidTooLow {
            amount,
            current_bid: auction.current_bid,
        });
    }

    let bid = Bid {
        id: 0,
        auction_id: auction.id,
        bidder_id,
        amount,
        placed_at: now,
    };
    record.auction.current_bid = amount;
    record.bids.insert(0, bid);
    Ok(())
}

/// 입찰
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &dyn AuctionStore,
    clock: &Arc<dyn Clock>,
) -> AuctionResult<(AuctionRecord, BidReceipt)> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);
    let PlaceBidCommand {
        auction_id,
        bidder_id,
        amount,
    } = cmd;

    // 단계 판단 시각은 잠금을 잡은 뒤에 읽는다. 경계 직전에 도착한 요청도 종료 후 처리되면 거절된다.
    let clock = Arc::clone(clock);
    let (record, _) = store
        .transact(
            auction_id,
            Box::new(move |record: &mut AuctionRecord| -> AuctionResult<Change> {
                admit_bid(record, bidder_id, amount, clock.now())?;
                Ok(Change::Updated)
            }),
        )
        .await
        .map_err(|e| {
            warn!(
                "{:<12} --> 입찰 거절 id: {}, 금액: {}, 사유: {}",
                "Command", auction_id, amount, e
            );
            e
        })?;

    let bid = record
        .bids
        .first()
        .cloned()
        .ok_or_else(|| AuctionError::Retryable("커밋된 입찰을 찾을 수 없습니다.".to_string()))?;
    info!(
        "{:<12} --> 입찰 성공 id: {}, 현재 가격: {}",
        "Command", auction_id, record.auction.current_bid
    );

    let receipt = BidReceipt {
        auction_id,
        bid,
        current_bid: record.auction.current_bid,
        bidder_count: record.bidder_count(),
    };
    Ok((record, receipt))
}

// endregion: --- Commands
