/// 경매 조회 모델
/// 단계와 남은 시간은 조회 시점의 서버 시각으로 매번 계산한다.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionRecord, Bid};
use crate::bidding::winner::resolve_winner;
use crate::phase::{self, Phase, PhaseSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Views
/// 경매 상세
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionView {
    pub auction: Auction,
    pub status: PhaseSnapshot,
    pub countdown: String,
    pub bidder_count: usize,
    pub bids: Vec<Bid>,
    pub winner: Option<Bid>,
}

impl AuctionView {
    pub fn new(record: AuctionRecord, now: DateTime<Utc>) -> Self {
        let status = phase::snapshot(now, record.auction.start_time, record.auction.end_time);
        let winner = resolve_winner(status.phase, &record.bids).cloned();
        Self {
            countdown: status.time_left.to_string(),
            bidder_count: record.bidder_count(),
            status,
            winner,
            auction: record.auction,
            bids: record.bids,
        }
    }
}

/// 경매 목록 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction: Auction,
    pub status: PhaseSnapshot,
    pub countdown: String,
    pub bidder_count: usize,
}

impl AuctionSummary {
    pub fn new(record: AuctionRecord, now: DateTime<Utc>) -> Self {
        let status = phase::snapshot(now, record.auction.start_time, record.auction.end_time);
        Self {
            countdown: status.time_left.to_string(),
            bidder_count: record.bidder_count(),
            status,
            auction: record.auction,
        }
    }
}

// endregion: --- Views

// region:    --- Filter & Sort
/// 목록 필터
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuctionFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub phase: Option<Phase>,
}

impl AuctionFilter {
    fn matches(&self, auction: &Auction, phase: Phase) -> bool {
        if let Some(category) = self.category.as_deref() {
            if auction.category != category {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref() {
            if !auction.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        self.phase.map_or(true, |wanted| wanted == phase)
    }
}

/// 목록 정렬
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuctionSort {
    // 종료 임박순
    #[default]
    EndingSoon,
    // 최근 시작순
    NewlyListed,
    // 시작 가격 낮은순
    PriceLowHigh,
    // 시작 가격 높은순
    PriceHighLow,
}

/// 필터 적용 후 정렬
pub fn list_view(
    records: Vec<AuctionRecord>,
    filter: &AuctionFilter,
    sort: AuctionSort,
    now: DateTime<Utc>,
) -> Vec<AuctionSummary> {
    let mut summaries: Vec<AuctionSummary> = records
        .into_iter()
        .map(|record| AuctionSummary::new(record, now))
        .filter(|summary| filter.matches(&summary.auction, summary.status.phase))
        .collect();

    summaries.sort_by(|a, b| {
        let (a, b) = (&a.auction, &b.auction);
        match sort {
            AuctionSort::EndingSoon => a.end_time.cmp(&b.end_time),
            AuctionSort::NewlyListed => b.start_time.cmp(&a.start_time),
            AuctionSort::PriceLowHigh => a.starting_bid.cmp(&b.starting_bid),
            AuctionSort::PriceHighLow => b.starting_bid.cmp(&a.starting_bid),
        }
        .then(a.id.cmp(&b.id))
    });
    summaries
}

// endregion: --- Filter & Sort

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: i64, title: &str, category: &str, starting_bid: i64, start: i64, end: i64) -> AuctionRecord {
        let now = Utc::now();
        AuctionRecord {
            auction: Auction {
                id,
                title: title.to_string(),
                description: String::new(),
                category: category.to_string(),
                condition: "New".to_string(),
                starting_bid,
                current_bid: starting_bid,
                start_time: now + Duration::minutes(start),
                end_time: now + Duration::minutes(end),
                owner_id: 1,
                paid: false,
                payment_order_id: None,
                version: 0,
                created_at: now,
            },
            bids: Vec::new(),
        }
    }

    fn catalog() -> Vec<AuctionRecord> {
        vec![
            record(1, "Leica M6", "Electronics", 900, -30, 30),
            record(2, "Oak Table", "Furniture", 150, -60, 10),
            record(3, "Leica Lens", "Electronics", 400, 20, 120),
            record(4, "Old Map", "Collectibles", 50, -120, -5),
        ]
    }

    fn ids(summaries: &[AuctionSummary]) -> Vec<i64> {
        summaries.iter().map(|summary| summary.auction.id).collect()
    }

    #[test]
    fn default_sort_is_ending_soon() {
        let listed = list_view(catalog(), &AuctionFilter::default(), AuctionSort::default(), Utc::now());
        assert_eq!(ids(&listed), vec![4, 2, 1, 3]);
    }

    #[test]
    fn price_and_recency_sorts() {
        let now = Utc::now();
        let filter = AuctionFilter::default();
        assert_eq!(ids(&list_view(catalog(), &filter, AuctionSort::PriceLowHigh, now)), vec![4, 2, 3, 1]);
        assert_eq!(ids(&list_view(catalog(), &filter, AuctionSort::PriceHighLow, now)), vec![1, 3, 2, 4]);
        assert_eq!(ids(&list_view(catalog(), &filter, AuctionSort::NewlyListed, now)), vec![3, 1, 2, 4]);
    }

    #[test]
    fn filters_combine() {
        let now = Utc::now();
        let filter = AuctionFilter {
            category: Some("Electronics".to_string()),
            search: Some("leica".to_string()),
            phase: Some(Phase::Active),
        };
        assert_eq!(ids(&list_view(catalog(), &filter, AuctionSort::EndingSoon, now)), vec![1]);

        let ended = AuctionFilter {
            phase: Some(Phase::Ended),
            ..Default::default()
        };
        assert_eq!(ids(&list_view(catalog(), &ended, AuctionSort::EndingSoon, now)), vec![4]);
    }

    #[test]
    fn view_exposes_winner_only_after_close() {
        let now = Utc::now();
        let mut closed = record(9, "Lamp", "Furniture", 10, -60, -1);
        closed.bids.push(Bid {
            id: 1,
            auction_id: 9,
            bidder_id: 5,
            amount: 20,
            placed_at: now - Duration::minutes(30),
        });
        closed.auction.current_bid = 20;

        let view = AuctionView::new(closed.clone(), now);
        assert_eq!(view.status.phase, Phase::Ended);
        assert_eq!(view.winner.map(|bid| bid.bidder_id), Some(5));
        assert_eq!(view.countdown, "00:00:00");

        closed.auction.end_time = now + Duration::minutes(1);
        let open = AuctionView::new(closed, now);
        assert_eq!(open.status.phase, Phase::Active);
        assert!(open.winner.is_none());
        assert_eq!(open.bidder_count, 1);
    }
}
