/// 경매 저장소
/// 경매 단위(auction id)로 단일 작성자 트랜잭션을 제공한다.
/// 같은 경매에 대한 입찰, 결제, 재등록, 삭제는 서로 직렬화되고, 서로 다른 경매는 병렬로 처리된다.
// region:    --- Imports
use crate::auction::model::{AuctionId, AuctionRecord, Bid, NewAuction, UserId};
use crate::error::AuctionResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

mod memory;
mod postgres;
mod queries;

pub use memory::MemoryAuctionStore;
pub use postgres::PostgresAuctionStore;

// endregion: --- Imports

// region:    --- Store Trait
/// 트랜잭션 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    // 변경 사항 반영
    Updated,
    // 아무것도 쓰지 않음
    Unchanged,
}

/// 잠금을 잡은 상태에서 레코드 사본에 적용되는 변경
/// 오류를 반환하면 사본은 버려지고 저장소는 그대로 유지된다.
pub type Mutation = Box<dyn FnOnce(&mut AuctionRecord) -> AuctionResult<Change> + Send>;

/// 삭제 직전에 잠금 안에서 실행되는 검사
pub type RemoveGuard = Box<dyn FnOnce(&AuctionRecord) -> AuctionResult<()> + Send>;

#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// 경매 생성 (현재 가격 = 시작 가격, 미결제)
    async fn insert(
        &self,
        auction: NewAuction,
        owner_id: UserId,
        created_at: DateTime<Utc>,
    ) -> AuctionResult<AuctionRecord>;

    /// 경매 조회 (입찰 이력 포함)
    async fn fetch(&self, id: AuctionId) -> AuctionResult<AuctionRecord>;

    /// 모든 경매 조회
    async fn list(&self) -> AuctionResult<Vec<AuctionRecord>>;

    /// 경매 단위 트랜잭션
    /// 커밋된 레코드를 반환한다. 새 입찰(id = 0)에는 저장소가 id를 부여하고,
    /// 이력에서 빠진 입찰은 같은 트랜잭션 안에서 보관 이력으로 옮긴다.
    async fn transact(
        &self,
        id: AuctionId,
        mutation: Mutation,
    ) -> AuctionResult<(AuctionRecord, Change)>;

    /// 경매 삭제 (진행 중인 트랜잭션이 끝난 뒤 적용)
    async fn remove(&self, id: AuctionId, guard: RemoveGuard) -> AuctionResult<AuctionRecord>;

    /// 재등록으로 비워진 입찰 이력
    async fn archived_bids(&self, id: AuctionId) -> AuctionResult<Vec<Bid>>;
}

/// `before`에는 있지만 `after`에는 없는 저장된 입찰
pub(crate) fn removed_bids(before: &[Bid], after: &[Bid]) -> Vec<Bid> {
    let kept: HashSet<i64> = after.iter().map(|bid| bid.id).collect();
    before
        .iter()
        .filter(|bid| bid.id != 0 && !kept.contains(&bid.id))
        .cloned()
        .collect()
}

// endregion: --- Store Trait

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(id: i64, amount: i64) -> Bid {
        Bid {
            id,
            auction_id: 1,
            bidder_id: 10 + id,
            amount,
            placed_at: Utc::now(),
        }
    }

    #[test]
    fn removed_bids_reports_cleared_history() {
        let before = vec![bid(2, 200), bid(1, 150)];
        assert_eq!(removed_bids(&before, &[]), before);
    }

    #[test]
    fn removed_bids_ignores_new_bids() {
        let before = vec![bid(1, 150)];
        let after = vec![bid(0, 200), bid(1, 150)];
        assert!(removed_bids(&before, &after).is_empty());
    }
}
