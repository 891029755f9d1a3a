use crate::auction::model::{AuctionId, AuctionRecord};
use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateReason {
    // 입찰 성공
    BidPlaced,
    // 단계 전환 (스케줄러)
    PhaseChanged,
    // 결제 완료
    PaymentConfirmed,
    // 재등록
    Republished,
    // 삭제
    Deleted,
}

/// 구독자에게 전달되는 경매 변경 알림
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionUpdate {
    pub auction_id: AuctionId,
    pub current_bid: i64,
    pub bidder_count: usize,
    pub phase: Phase,
    pub version: i64,
    pub reason: UpdateReason,
    pub timestamp: DateTime<Utc>,
}

impl AuctionUpdate {
    pub fn from_record(record: &AuctionRecord, reason: UpdateReason, now: DateTime<Utc>) -> Self {
        Self {
            auction_id: record.id(),
            current_bid: record.auction.current_bid,
            bidder_count: record.bidder_count(),
            phase: record.auction.phase_at(now),
            version: record.auction.version,
            reason,
            timestamp: now,
        }
    }

    /// 같은 경매의 `other`를 대체하는 알림인지
    /// 알림은 커밋 후에 전파되므로 도착 순서가 커밋 순서와 다를 수 있다. 버전이 같으면 단계 전환 알림이다.
    pub fn supersedes(&self, other: &AuctionUpdate) -> bool {
        self.auction_id == other.auction_id && self.version >= other.version
    }
}
