/// 경매 변경 알림
/// 입찰 성공, 단계 전환, 결제, 재등록, 삭제 후 `{auction_id, current_bid, bidder_count, phase}`를 전파한다.
/// 외부 화면은 이 알림으로만 캐시를 갱신한다.
// region:    --- Imports
use crate::auction::events::AuctionUpdate;
use crate::auction::model::AuctionId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

// endregion: --- Imports

// region:    --- Notifier
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, update: &AuctionUpdate) -> Result<(), String>;
}

/// 프로세스 내부 구독자용 브로드캐스트 채널
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<AuctionUpdate>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuctionUpdate> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn publish(&self, update: &AuctionUpdate) -> Result<(), String> {
        // 구독자가 없으면 버린다.
        match self.sender.send(update.clone()) {
            Ok(receivers) => debug!(
                "{:<12} --> 알림 전파 id: {}, 구독자: {}",
                "Notify", update.auction_id, receivers
            ),
            Err(_) => debug!("{:<12} --> 구독자 없음 id: {}", "Notify", update.auction_id),
        }
        Ok(())
    }
}

/// 등록된 모든 알림 채널로 전파한다. 실패는 기록만 하고 커밋된 변경을 되돌리지 않는다.
pub async fn publish_all(notifiers: &[Arc<dyn Notifier>], update: &AuctionUpdate) {
    for notifier in notifiers {
        if let Err(e) = notifier.publish(update).await {
            warn!(
                "{:<12} --> 알림 전파 실패 id: {}, 오류: {}",
                "Notify", update.auction_id, e
            );
        }
    }
}

/// 구독자 쪽 경매별 최신 알림
/// 늦게 도착한 이전 버전의 알림은 버린다.
#[derive(Debug, Default)]
pub struct LatestUpdates {
    latest: HashMap<AuctionId, AuctionUpdate>,
}

impl LatestUpdates {
    /// 반영했으면 true
    pub fn apply(&mut self, update: AuctionUpdate) -> bool {
        match self.latest.get(&update.auction_id) {
            Some(current) if !update.supersedes(current) => {
                debug!(
                    "{:<12} --> 이전 알림 무시 id: {}, 버전: {} < {}",
                    "Notify", update.auction_id, update.version, current.version
                );
                false
            }
            _ => {
                self.latest.insert(update.auction_id, update);
                true
            }
        }
    }

    pub fn get(&self, auction_id: AuctionId) -> Option<&AuctionUpdate> {
        self.latest.get(&auction_id)
    }
}

// endregion: --- Notifier

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::events::UpdateReason;
    use crate::phase::Phase;
    use chrono::Utc;

    fn update() -> AuctionUpdate {
        AuctionUpdate {
            auction_id: 3,
            current_bid: 150,
            bidder_count: 1,
            phase: Phase::Active,
            version: 1,
            reason: UpdateReason::BidPlaced,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let notifier = BroadcastNotifier::new(16);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.publish(&update()).await.unwrap();

        assert_eq!(first.recv().await.unwrap().current_bid, 150);
        assert_eq!(second.recv().await.unwrap().auction_id, 3);
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_not_an_error() {
        let notifier = BroadcastNotifier::new(4);
        assert!(notifier.publish(&update()).await.is_ok());
    }

    #[test]
    fn stale_update_does_not_replace_newer_one() {
        let mut latest = LatestUpdates::default();
        let older = update();
        let newer = AuctionUpdate {
            current_bid: 200,
            bidder_count: 2,
            version: 2,
            ..update()
        };

        assert!(latest.apply(newer));
        assert!(!latest.apply(older));
        assert_eq!(latest.get(3).map(|u| u.current_bid), Some(200));

        // 같은 버전의 단계 전환은 반영
        let closed = AuctionUpdate {
            current_bid: 200,
            bidder_count: 2,
            version: 2,
            phase: Phase::Ended,
            reason: UpdateReason::PhaseChanged,
            ..update()
        };
        assert!(latest.apply(closed));
        assert_eq!(latest.get(3).map(|u| u.phase), Some(Phase::Ended));
    }
}
