// region:    --- Imports
use super::{removed_bids, AuctionStore, Change, Mutation, RemoveGuard};
use crate::auction::model::{Auction, AuctionId, AuctionRecord, Bid, NewAuction, UserId};
use crate::error::{AuctionError, AuctionResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

// endregion: --- Imports

// region:    --- Memory Store
/// 경매별 슬롯. 삭제되면 None이 되어 대기 중이던 요청은 NotFound를 받는다.
type Slot = Arc<Mutex<Option<AuctionRecord>>>;

/// 메모리 저장소
/// 경매 id별 tokio 뮤텍스가 트랜잭션 경계다.
pub struct MemoryAuctionStore {
    slots: RwLock<HashMap<AuctionId, Slot>>,
    archive: RwLock<HashMap<AuctionId, Vec<Bid>>>,
    next_auction_id: AtomicI64,
    next_bid_id: AtomicI64,
    lock_timeout: Duration,
}

impl Default for MemoryAuctionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

impl MemoryAuctionStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            archive: RwLock::new(HashMap::new()),
            next_auction_id: AtomicI64::new(1),
            next_bid_id: AtomicI64::new(1),
            lock_timeout,
        }
    }

    fn slot(&self, id: AuctionId) -> AuctionResult<Slot> {
        self.slots
            .read()
            .get(&id)
            .cloned()
            .ok_or(AuctionError::NotFound(id))
    }

    /// 슬롯 잠금 (제한 시간 초과 시 재시도 가능 오류)
    async fn lock<'a>(
        &self,
        id: AuctionId,
        slot: &'a Slot,
    ) -> AuctionResult<MutexGuard<'a, Option<AuctionRecord>>> {
        tokio::time::timeout(self.lock_timeout, slot.lock())
            .await
            .map_err(|_| {
                warn!("{:<12} --> 경매 잠금 대기 시간 초과 id: {}", "Store", id);
                AuctionError::Retryable(format!("경매 {} 잠금 대기 시간 초과", id))
            })
    }
}

#[async_trait]
impl AuctionStore for MemoryAuctionStore {
    async fn insert(
        &self,
        auction: NewAuction,
        owner_id: UserId,
        created_at: DateTime<Utc>,
    ) -> AuctionResult<AuctionRecord> {
        let id = self.next_auction_id.fetch_add(1, Ordering::SeqCst);
        let record = AuctionRecord {
            auction: Auction {
                id,
                title: auction.title,
                description: auction.description,
                category: auction.category,
                condition: auction.condition,
                starting_bid: auction.starting_bid,
                current_bid: auction.starting_bid,
                start_time: auction.start_time,
                end_time: auction.end_time,
                owner_id,
                paid: false,
                payment_order_id: None,
                version: 0,
                created_at,
            },
            bids: Vec::new(),
        };
        self.slots
            .write()
            .insert(id, Arc::new(Mutex::new(Some(record.clone()))));
        debug!("{:<12} --> 경매 생성 id: {}", "Store", id);
        Ok(record)
    }

    async fn fetch(&self, id: AuctionId) -> AuctionResult<AuctionRecord> {
        let slot = self.slot(id)?;
        let guard = self.lock(id, &slot).await?;
        guard.clone().ok_or(AuctionError::NotFound(id))
    }

    async fn list(&self) -> AuctionResult<Vec<AuctionRecord>> {
        let slots: Vec<(AuctionId, Slot)> = self
            .slots
            .read()
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect();

        let mut records = Vec::with_capacity(slots.len());
        for (id, slot) in slots {
            if let Some(record) = self.lock(id, &slot).await?.clone() {
                records.push(record);
            }
        }
        records.sort_by_key(|record| record.id());
        Ok(records)
    }

    async fn transact(
        &self,
        id: AuctionId,
        mutation: Mutation,
    ) -> AuctionResult<(AuctionRecord, Change)> {
        let slot = self.slot(id)?;
        let mut guard = self.lock(id, &slot).await?;
        let current = guard.as_ref().ok_or(AuctionError::NotFound(id))?;

        let mut next = current.clone();
        let change = mutation(&mut next)?;
        if change == Change::Unchanged {
            return Ok((current.clone(), change));
        }
        next.auction.version = current.auction.version + 1;

        // 새 입찰은 오래된 것부터 id 부여
        for bid in next.bids.iter_mut().rev().filter(|bid| bid.id == 0) {
            bid.id = self.next_bid_id.fetch_add(1, Ordering::SeqCst);
        }

        let removed = removed_bids(&current.bids, &next.bids);
        if !removed.is_empty() {
            debug!(
                "{:<12} --> 입찰 이력 보관 id: {}, 건수: {}",
                "Store",
                id,
                removed.len()
            );
            self.archive.write().entry(id).or_default().extend(removed);
        }

        *guard = Some(next.clone());
        Ok((next, change))
    }

    async fn remove(&self, id: AuctionId, guard: RemoveGuard) -> AuctionResult<AuctionRecord> {
        let slot = self.slot(id)?;
        let mut locked = self.lock(id, &slot).await?;
        let current = locked.as_ref().ok_or(AuctionError::NotFound(id))?;
        guard(current)?;

        let mut removed = locked.take().ok_or(AuctionError::NotFound(id))?;
        removed.auction.version += 1;
        self.slots.write().remove(&id);
        self.archive.write().remove(&id);
        debug!("{:<12} --> 경매 삭제 id: {}", "Store", id);
        Ok(removed)
    }

    async fn archived_bids(&self, id: AuctionId) -> AuctionResult<Vec<Bid>> {
        if !self.slots.read().contains_key(&id) {
            return Err(AuctionError::NotFound(id));
        }
        Ok(self.archive.read().get(&id).cloned().unwrap_or_default())
    }
}

// endregion: --- Memory Store
