/// 경매 엔진
/// 저장소, 시계, 알림 채널을 묶어 외부에 노출되는 모든 연산을 제공한다.
/// 쓰기 연산은 커밋된 뒤에만 알림을 전파한다.
// region:    --- Imports
use crate::auction::commands::{handle_create_auction, handle_delete_auction, handle_republish};
use crate::auction::events::{AuctionUpdate, UpdateReason};
use crate::auction::model::{AuctionId, AuctionRecord, AuctionWindow, Bid, NewAuction, Principal};
use crate::bidding::commands::{handle_place_bid, BidReceipt, PlaceBidCommand};
use crate::bidding::winner::winner_at;
use crate::error::AuctionResult;
use crate::notify::{publish_all, Notifier};
use crate::payment::{handle_confirm_payment, ConfirmPaymentCommand, PaymentOutcome, PaymentProof};
use crate::phase::Clock;
use crate::query::{list_view, AuctionFilter, AuctionSort, AuctionSummary, AuctionView};
use crate::store::AuctionStore;
use std::sync::Arc;
use tracing::debug;

// endregion: --- Imports

// region:    --- Engine
pub struct AuctionEngine {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl AuctionEngine {
    pub fn new(store: Arc<dyn AuctionStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            notifiers: Vec::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn store(&self) -> Arc<dyn AuctionStore> {
        Arc::clone(&self.store)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn notifiers(&self) -> Vec<Arc<dyn Notifier>> {
        self.notifiers.clone()
    }

    async fn announce(&self, record: &AuctionRecord, reason: UpdateReason) {
        let update = AuctionUpdate::from_record(record, reason, self.clock.now());
        debug!("{:<12} --> 알림 생성: {:?}", "Engine", update);
        publish_all(&self.notifiers, &update).await;
    }

    // region:    --- Commands
    pub async fn create_auction(
        &self,
        principal: Principal,
        auction: NewAuction,
    ) -> AuctionResult<AuctionView> {
        let record =
            handle_create_auction(principal, auction, self.store.as_ref(), self.clock.now()).await?;
        Ok(AuctionView::new(record, self.clock.now()))
    }

    pub async fn place_bid(&self, cmd: PlaceBidCommand) -> AuctionResult<BidReceipt> {
        let (record, receipt) = handle_place_bid(cmd, self.store.as_ref(), &self.clock).await?;
        self.announce(&record, UpdateReason::BidPlaced).await;
        Ok(receipt)
    }

    pub async fn confirm_payment(
        &self,
        auction_id: AuctionId,
        payer: Principal,
        proof: PaymentProof,
    ) -> AuctionResult<PaymentOutcome> {
        let cmd = ConfirmPaymentCommand {
            auction_id,
            payer,
            proof,
        };
        let (record, outcome) = handle_confirm_payment(cmd, self.store.as_ref(), &self.clock).await?;
        if outcome == PaymentOutcome::Settled {
            self.announce(&record, UpdateReason::PaymentConfirmed).await;
        }
        Ok(outcome)
    }

    pub async fn republish_auction(
        &self,
        principal: Principal,
        auction_id: AuctionId,
        window: AuctionWindow,
    ) -> AuctionResult<AuctionView> {
        let record =
            handle_republish(principal, auction_id, window, self.store.as_ref(), &self.clock).await?;
        self.announce(&record, UpdateReason::Republished).await;
        Ok(AuctionView::new(record, self.clock.now()))
    }

    pub async fn delete_auction(
        &self,
        principal: Principal,
        auction_id: AuctionId,
    ) -> AuctionResult<()> {
        let record = handle_delete_auction(principal, auction_id, self.store.as_ref()).await?;
        self.announce(&record, UpdateReason::Deleted).await;
        Ok(())
    }

    // endregion: --- Commands

    // region:    --- Queries
    pub async fn get_auction(&self, auction_id: AuctionId) -> AuctionResult<AuctionView> {
        let record = self.store.fetch(auction_id).await?;
        Ok(AuctionView::new(record, self.clock.now()))
    }

    pub async fn list_auctions(
        &self,
        filter: &AuctionFilter,
        sort: AuctionSort,
    ) -> AuctionResult<Vec<AuctionSummary>> {
        let records = self.store.list().await?;
        Ok(list_view(records, filter, sort, self.clock.now()))
    }

    /// 입찰 이력 (최신순)
    pub async fn bid_history(&self, auction_id: AuctionId) -> AuctionResult<Vec<Bid>> {
        Ok(self.store.fetch(auction_id).await?.bids)
    }

    /// 낙찰 입찰 (종료 전이거나 입찰이 없으면 None)
    pub async fn winner(&self, auction_id: AuctionId) -> AuctionResult<Option<Bid>> {
        let record = self.store.fetch(auction_id).await?;
        Ok(winner_at(&record, self.clock.now()).cloned())
    }

    pub async fn archived_bids(&self, auction_id: AuctionId) -> AuctionResult<Vec<Bid>> {
        self.store.archived_bids(auction_id).await
    }

    // endregion: --- Queries
}

// endregion: --- Engine
