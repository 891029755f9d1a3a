/// 경매 단계 전환 스케줄러
/// 단계는 저장하지 않고 시각으로 계산하므로, 스케줄러는 상태를 바꾸지 않는다.
/// 주기마다 모든 경매의 단계를 다시 계산해 직전과 달라진 경매에 대해서만 알림을 보낸다.
// region:    --- Imports
use crate::auction::events::{AuctionUpdate, UpdateReason};
use crate::auction::model::AuctionId;
use crate::error::AuctionResult;
use crate::notify::{publish_all, Notifier};
use crate::phase::{Clock, Phase};
use crate::store::AuctionStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Phase Ticker
pub struct PhaseTicker {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    notifiers: Vec<Arc<dyn Notifier>>,
    period: Duration,
    // 마지막으로 관찰한 단계
    seen: Mutex<HashMap<AuctionId, Phase>>,
}

impl PhaseTicker {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        notifiers: Vec<Arc<dyn Notifier>>,
        period: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            notifiers,
            period,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// 스케줄러 시작
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            "{:<12} --> 단계 전환 스케줄러 시작 (주기: {:?})",
            "Scheduler", self.period
        );
        tokio::spawn(async move {
            let mut interval = interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = self.tick().await {
                    error!(
                        "{:<12} --> 경매 단계 확인 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        })
    }

    /// 한 번 확인하고 전파한 알림을 반환한다.
    /// 처음 보는 경매는 기록만 하고, 사라진 경매는 기록에서 지운다.
    pub async fn tick(&self) -> AuctionResult<Vec<AuctionUpdate>> {
        let records = self.store.list().await?;
        let now = self.clock.now();
        let mut updates = Vec::new();

        {
            let mut seen = self.seen.lock().await;
            seen.retain(|id, _| records.iter().any(|record| record.id() == *id));

            for record in &records {
                let phase = record.auction.phase_at(now);
                match seen.insert(record.id(), phase) {
                    Some(previous) if previous != phase => {
                        debug!(
                            "{:<12} --> 단계 전환 id: {}, {} -> {}",
                            "Scheduler",
                            record.id(),
                            previous,
                            phase
                        );
                        updates.push(AuctionUpdate::from_record(
                            record,
                            UpdateReason::PhaseChanged,
                            now,
                        ));
                    }
                    _ => {}
                }
            }
        }

        for update in &updates {
            publish_all(&self.notifiers, update).await;
        }
        Ok(updates)
    }
}

// endregion: --- Phase Ticker

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::NewAuction;
    use crate::notify::BroadcastNotifier;
    use crate::phase::ManualClock;
    use crate::store::MemoryAuctionStore;
    use chrono::{TimeZone, Utc};

    fn new_auction(start_min: i64, end_min: i64) -> NewAuction {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        NewAuction {
            title: "시계".to_string(),
            description: String::new(),
            category: "Collectibles".to_string(),
            condition: "Used".to_string(),
            starting_bid: 100,
            start_time: base + chrono::Duration::minutes(start_min),
            end_time: base + chrono::Duration::minutes(end_min),
        }
    }

    #[tokio::test]
    async fn reports_each_transition_once() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let store = Arc::new(MemoryAuctionStore::default());
        let record = store.insert(new_auction(10, 20), 1, start).await.unwrap();

        let notifier = Arc::new(BroadcastNotifier::new(16));
        let mut updates_rx = notifier.subscribe();
        let ticker = PhaseTicker::new(
            store.clone(),
            clock.clone(),
            vec![notifier.clone() as Arc<dyn Notifier>],
            Duration::from_secs(1),
        );

        // 첫 관찰은 기록만
        assert!(ticker.tick().await.unwrap().is_empty());
        assert!(ticker.tick().await.unwrap().is_empty());

        clock.advance(chrono::Duration::minutes(10));
        let updates = ticker.tick().await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].auction_id, record.id());
        assert_eq!(updates[0].phase, Phase::Active);
        assert_eq!(updates[0].reason, UpdateReason::PhaseChanged);
        assert!(ticker.tick().await.unwrap().is_empty());

        clock.advance(chrono::Duration::minutes(15));
        let updates = ticker.tick().await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].phase, Phase::Ended);

        let received = updates_rx.recv().await.unwrap();
        assert_eq!(received.phase, Phase::Active);
        let received = updates_rx.recv().await.unwrap();
        assert_eq!(received.phase, Phase::Ended);
    }

    #[tokio::test]
    async fn skipped_phase_is_reported_as_latest() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let store = Arc::new(MemoryAuctionStore::default());
        store.insert(new_auction(1, 2), 1, start).await.unwrap();

        let ticker = PhaseTicker::new(store, clock.clone(), Vec::new(), Duration::from_secs(1));
        ticker.tick().await.unwrap();

        clock.advance(chrono::Duration::hours(1));
        let updates = ticker.tick().await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].phase, Phase::Ended);
    }
}
