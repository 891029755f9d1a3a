/// 경매 관리 커맨드 처리
/// 1. 경매 등록
/// 2. 재등록 (종료된 경매를 새 기간으로 초기화)
/// 3. 삭제
// region:    --- Imports
use crate::auction::model::{
    AuctionId, AuctionRecord, AuctionWindow, NewAuction, Principal, Role,
};
use crate::error::{AuctionError, AuctionResult};
use crate::phase::{Clock, Phase};
use crate::store::{AuctionStore, Change};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
/// 등록 요청 검증
pub fn validate_new_auction(auction: &NewAuction, now: DateTime<Utc>) -> AuctionResult<()> {
    if auction.title.trim().is_empty() {
        return Err(AuctionError::InvalidAuction(
            "경매 제목이 비어 있습니다.".to_string(),
        ));
    }
    if auction.starting_bid < 0 {
        return Err(AuctionError::InvalidAuction(format!(
            "시작 가격은 0 이상이어야 합니다: {}",
            auction.starting_bid
        )));
    }
    let window = AuctionWindow {
        start_time: auction.start_time,
        end_time: auction.end_time,
    };
    if !window.is_open_at(now) {
        return Err(AuctionError::InvalidWindow);
    }
    Ok(())
}

/// 1. 경매 등록 (경매인만 가능)
pub async fn handle_create_auction(
    principal: Principal,
    auction: NewAuction,
    store: &dyn AuctionStore,
    now: DateTime<Utc>,
) -> AuctionResult<AuctionRecord> {
    info!(
        "{:<12} --> 경매 등록 요청: {}, 요청자: {}",
        "Command", auction.title, principal.id
    );
    if principal.role != Role::Auctioneer {
        return Err(AuctionError::unauthorized("경매 등록은 경매인만 가능합니다."));
    }
    validate_new_auction(&auction, now)?;

    let record = store.insert(auction, principal.id, now).await?;
    info!("{:<12} --> 경매 등록 완료 id: {}", "Command", record.id());
    Ok(record)
}

/// 재등록 검증 및 초기화
/// 종료 여부 → 권한 → 기간 순서로 검사한다. 새 기간은 아직 끝나지 않아야 한다 (재등록 후 시작 전 또는 진행 중).
pub fn reset_window(
    record: &mut AuctionRecord,
    principal: Principal,
    window: AuctionWindow,
    now: DateTime<Utc>,
) -> AuctionResult<()> {
    let phase = record.auction.phase_at(now);
    if phase != Phase::Ended {
        return Err(AuctionError::Phase {
            expected: Phase::Ended,
            actual: phase,
        });
    }
    if !principal.can_manage(&record.auction) {
        return Err(AuctionError::unauthorized(
            "경매 판매자 또는 관리자만 재등록할 수 있습니다.",
        ));
    }
    if !window.is_open_at(now) {
        return Err(AuctionError::InvalidWindow);
    }

    let auction = &mut record.auction;
    auction.current_bid = auction.starting_bid;
    auction.start_time = window.start_time;
    auction.end_time = window.end_time;
    auction.paid = false;
    auction.payment_order_id = None;
    record.bids.clear();
    Ok(())
}

/// 2. 재등록
pub async fn handle_republish(
    principal: Principal,
    auction_id: AuctionId,
    window: AuctionWindow,
    store: &dyn AuctionStore,
    clock: &Arc<dyn Clock>,
) -> AuctionResult<AuctionRecord> {
    info!(
        "{:<12} --> 재등록 요청 id: {}, 기간: {} ~ {}",
        "Republish", auction_id, window.start_time, window.end_time
    );

    let clock = Arc::clone(clock);
    let (record, _) = store
        .transact(
            auction_id,
            Box::new(move |record: &mut AuctionRecord| -> AuctionResult<Change> {
                reset_window(record, principal, window, clock.now())?;
                Ok(Change::Updated)
            }),
        )
        .await
        .map_err(|e| {
            warn!(
                "{:<12} --> 재등록 거절 id: {}, 사유: {}",
                "Republish", auction_id, e
            );
            e
        })?;

    info!("{:<12} --> 재등록 완료 id: {}", "Republish", auction_id);
    Ok(record)
}

/// 3. 삭제 (판매자 또는 관리자, 단계와 무관)
pub async fn handle_delete_auction(
    principal: Principal,
    auction_id: AuctionId,
    store: &dyn AuctionStore,
) -> AuctionResult<AuctionRecord> {
    info!(
        "{:<12} --> 경매 삭제 요청 id: {}, 요청자: {}",
        "Command", auction_id, principal.id
    );
    let record = store
        .remove(
            auction_id,
            Box::new(move |record: &AuctionRecord| -> AuctionResult<()> {
                if principal.can_manage(&record.auction) {
                    Ok(())
                } else {
                    Err(AuctionError::unauthorized(
                        "경매 판매자 또는 관리자만 삭제할 수 있습니다.",
                    ))
                }
            }),
        )
        .await?;
    info!("{:<12} --> 경매 삭제 완료 id: {}", "Command", auction_id);
    Ok(record)
}

// endregion: --- Commands

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::{Auction, Bid};
    use chrono::Duration;

    const OWNER: i64 = 3;

    fn ended(now: DateTime<Utc>) -> AuctionRecord {
        AuctionRecord {
            auction: Auction {
                id: 11,
                title: "책상".to_string(),
                description: String::new(),
                category: "Furniture".to_string(),
                condition: "Used".to_string(),
                starting_bid: 100,
                current_bid: 250,
                start_time: now - Duration::hours(2),
                end_time: now - Duration::hours(1),
                owner_id: OWNER,
                paid: true,
                payment_order_id: Some("order_1".to_string()),
                version: 3,
                created_at: now - Duration::hours(3),
            },
            bids: vec![Bid {
                id: 4,
                auction_id: 11,
                bidder_id: 8,
                amount: 250,
                placed_at: now - Duration::minutes(90),
            }],
        }
    }

    fn window(now: DateTime<Utc>, start: i64, end: i64) -> AuctionWindow {
        AuctionWindow {
            start_time: now + Duration::minutes(start),
            end_time: now + Duration::minutes(end),
        }
    }

    #[test]
    fn republish_clears_bidding_state() {
        let now = Utc::now();
        let mut record = ended(now);
        let owner = Principal::new(OWNER, Role::Auctioneer);

        reset_window(&mut record, owner, window(now, 10, 70), now).unwrap();

        assert_eq!(record.auction.current_bid, 100);
        assert!(record.bids.is_empty());
        assert!(!record.auction.paid);
        assert!(record.auction.payment_order_id.is_none());
        assert_eq!(record.auction.phase_at(now), Phase::Upcoming);
        assert_eq!(record.auction.title, "책상");
    }

    #[test]
    fn admin_may_republish_into_active_window() {
        let now = Utc::now();
        let mut record = ended(now);
        let admin = Principal::new(99, Role::SuperAdmin);

        reset_window(&mut record, admin, window(now, -1, 60), now).unwrap();
        assert_eq!(record.auction.phase_at(now), Phase::Active);
    }

    #[test]
    fn rejected_republish_changes_nothing() {
        let now = Utc::now();
        let owner = Principal::new(OWNER, Role::Auctioneer);

        let mut record = ended(now);
        let before = record.clone();
        assert_eq!(
            reset_window(&mut record, owner, window(now, 60, 10), now),
            Err(AuctionError::InvalidWindow)
        );
        assert_eq!(record, before);

        let stranger = Principal::new(50, Role::Auctioneer);
        assert!(matches!(
            reset_window(&mut record, stranger, window(now, 10, 60), now),
            Err(AuctionError::Authorization { .. })
        ));
        assert_eq!(record, before);

        record.auction.end_time = now + Duration::minutes(5);
        let active = record.clone();
        assert_eq!(
            reset_window(&mut record, owner, window(now, 10, 60), now),
            Err(AuctionError::Phase {
                expected: Phase::Ended,
                actual: Phase::Active
            })
        );
        assert_eq!(record, active);
    }

    #[test]
    fn new_auction_validation() {
        let now = Utc::now();
        let valid = NewAuction {
            title: "카메라".to_string(),
            description: String::new(),
            category: "Electronics".to_string(),
            condition: "New".to_string(),
            starting_bid: 0,
            start_time: now,
            end_time: now + Duration::hours(1),
        };
        assert!(validate_new_auction(&valid, now).is_ok());

        let mut empty_title = valid.clone();
        empty_title.title = "   ".to_string();
        assert_eq!(validate_new_auction(&empty_title, now).unwrap_err().code(), "INVALID_AUCTION");

        let mut negative = valid.clone();
        negative.starting_bid = -1;
        assert_eq!(validate_new_auction(&negative, now).unwrap_err().code(), "INVALID_AUCTION");

        let mut inverted = valid.clone();
        inverted.end_time = inverted.start_time;
        assert_eq!(validate_new_auction(&inverted, now), Err(AuctionError::InvalidWindow));

        let mut already_over = valid;
        already_over.start_time = now - Duration::hours(5);
        already_over.end_time = now - Duration::hours(4);
        assert_eq!(validate_new_auction(&already_over, now), Err(AuctionError::InvalidWindow));
        already_over.end_time = now;
        assert_eq!(validate_new_auction(&already_over, now), Err(AuctionError::InvalidWindow));
    }

    #[test]
    fn republish_into_elapsed_window_is_rejected() {
        let now = Utc::now();
        let owner = Principal::new(OWNER, Role::Auctioneer);
        let mut record = ended(now);
        let before = record.clone();

        assert_eq!(
            reset_window(&mut record, owner, window(now, -300, -240), now),
            Err(AuctionError::InvalidWindow)
        );
        assert_eq!(
            reset_window(&mut record, owner, window(now, -60, 0), now),
            Err(AuctionError::InvalidWindow)
        );
        assert_eq!(record, before);
        assert_eq!(record.bids.len(), 1);
    }
}
