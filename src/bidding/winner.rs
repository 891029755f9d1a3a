use crate::auction::model::{AuctionRecord, Bid};
use crate::phase::Phase;
use chrono::{DateTime, Utc};

/// 낙찰 입찰
/// 종료된 경매에서만 정의된다. 입찰 금액은 계속 오르므로 이력의 첫 번째가 최고가다.
pub fn resolve_winner(phase: Phase, bids: &[Bid]) -> Option<&Bid> {
    match phase {
        Phase::Ended => bids.first(),
        Phase::Upcoming | Phase::Active => None,
    }
}

pub fn winner_at(record: &AuctionRecord, now: DateTime<Utc>) -> Option<&Bid> {
    resolve_winner(record.auction.phase_at(now), &record.bids)
}
