/// 결제 게이트
/// 미결제 → 결제 완료로만 전환된다 (입찰 기간마다 한 번, 재등록으로만 초기화).
/// 결제 게이트웨이가 검증한 결과(주문 id, 금액, 서명 유효 여부)만 받는다.
// region:    --- Imports
use crate::auction::model::{AuctionId, AuctionRecord, Principal, UserId};
use crate::bidding::winner::resolve_winner;
use crate::error::{AuctionError, AuctionResult};
use crate::phase::{Clock, Phase};
use crate::store::{AuctionStore, Change};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Payment Gate
/// 게이트웨이 검증 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    pub order_id: String,
    pub amount: i64,
    pub signature_valid: bool,
}

/// 결제 확정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    // 이번 요청으로 결제 완료
    Settled,
    // 이미 결제 완료 (게이트웨이 재전송)
    AlreadyPaid,
}

/// 결제 확정 명령
#[derive(Debug, Clone)]
pub struct ConfirmPaymentCommand {
    pub auction_id: AuctionId,
    pub payer: Principal,
    pub proof: PaymentProof,
}

/// 결제 확정 검증 및 반영
/// 종료 여부 → 낙찰자 존재 → 요청자 = 낙찰자 → 서명/금액 → 이미 결제됨 순서로 검사한다.
pub fn settle_payment(
    record: &mut AuctionRecord,
    payer_id: UserId,
    proof: &PaymentProof,
    now: DateTime<Utc>,
) -> AuctionResult<PaymentOutcome> {
    let phase = record.auction.phase_at(now);
    if phase != Phase::Ended {
        return Err(AuctionError::Phase {
            expected: Phase::Ended,
            actual: phase,
        });
    }

    let (winner_id, winning_amount) = match resolve_winner(phase, &record.bids) {
        Some(winner) => (winner.bidder_id, winner.amount),
        None => return Err(AuctionError::unauthorized("낙찰자가 없는 경매입니다.")),
    };
    if payer_id != winner_id {
        return Err(AuctionError::unauthorized("낙찰자만 결제할 수 있습니다."));
    }
    if !proof.signature_valid {
        return Err(AuctionError::unauthorized("결제 서명 검증에 실패했습니다."));
    }
    if proof.amount != winning_amount {
        return Err(AuctionError::unauthorized(format!(
            "결제 금액({})이 낙찰가({})와 다릅니다.",
            proof.amount, winning_amount
        )));
    }

    if record.auction.paid {
        return Ok(PaymentOutcome::AlreadyPaid);
    }
    record.auction.paid = true;
    record.auction.payment_order_id = Some(proof.order_id.clone());
    Ok(PaymentOutcome::Settled)
}

/// 결제 확정
pub async fn handle_confirm_payment(
    cmd: ConfirmPaymentCommand,
    store: &dyn AuctionStore,
    clock: &Arc<dyn Clock>,
) -> AuctionResult<(AuctionRecord, PaymentOutcome)> {
    let ConfirmPaymentCommand {
        auction_id,
        payer,
        proof,
    } = cmd;
    info!(
        "{:<12} --> 결제 확정 요청 id: {}, 주문: {}, 요청자: {}",
        "Payment", auction_id, proof.order_id, payer.id
    );

    let clock = Arc::clone(clock);
    let (record, change) = store
        .transact(
            auction_id,
            Box::new(move |record: &mut AuctionRecord| -> AuctionResult<Change> {
                match settle_payment(record, payer.id, &proof, clock.now())? {
                    PaymentOutcome::Settled => Ok(Change::Updated),
                    PaymentOutcome::AlreadyPaid => Ok(Change::Unchanged),
                }
            }),
        )
        .await
        .map_err(|e| {
            warn!(
                "{:<12} --> 결제 확정 거절 id: {}, 사유: {}",
                "Payment", auction_id, e
            );
            e
        })?;

    let outcome = match change {
        Change::Updated => PaymentOutcome::Settled,
        Change::Unchanged => PaymentOutcome::AlreadyPaid,
    };
    info!(
        "{:<12} --> 결제 확정 완료 id: {}, 결과: {:?}",
        "Payment", auction_id, outcome
    );
    Ok((record, outcome))
}

// endregion: --- Payment Gate

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::{Auction, Bid};
    use chrono::Duration;

    const WINNER: UserId = 42;

    fn ended_record(now: DateTime<Utc>, with_bid: bool) -> AuctionRecord {
        let bids = if with_bid {
            vec![Bid {
                id: 1,
                auction_id: 5,
                bidder_id: WINNER,
                amount: 200,
                placed_at: now - Duration::minutes(5),
            }]
        } else {
            Vec::new()
        };
        AuctionRecord {
            auction: Auction {
                id: 5,
                title: "유화".to_string(),
                description: String::new(),
                category: "Art & Antiques".to_string(),
                condition: "Used".to_string(),
                starting_bid: 100,
                current_bid: if with_bid { 200 } else { 100 },
                start_time: now - Duration::hours(1),
                end_time: now - Duration::minutes(1),
                owner_id: 1,
                paid: false,
                payment_order_id: None,
                version: 0,
                created_at: now - Duration::hours(2),
            },
            bids,
        }
    }

    fn proof(amount: i64) -> PaymentProof {
        PaymentProof {
            order_id: "order_9A".to_string(),
            amount,
            signature_valid: true,
        }
    }

    #[test]
    fn winner_settles_once() {
        let now = Utc::now();
        let mut record = ended_record(now, true);

        assert_eq!(
            settle_payment(&mut record, WINNER, &proof(200), now),
            Ok(PaymentOutcome::Settled)
        );
        assert!(record.auction.paid);
        assert_eq!(record.auction.payment_order_id.as_deref(), Some("order_9A"));

        let settled = record.clone();
        assert_eq!(
            settle_payment(&mut record, WINNER, &proof(200), now),
            Ok(PaymentOutcome::AlreadyPaid)
        );
        assert_eq!(record, settled);
    }

    #[test]
    fn other_principals_are_rejected_even_with_correct_amount() {
        let now = Utc::now();
        for payer in [1, 7, WINNER + 1] {
            let mut record = ended_record(now, true);
            let err = settle_payment(&mut record, payer, &proof(200), now).unwrap_err();
            assert_eq!(err.code(), "UNAUTHORIZED");
            assert!(!record.auction.paid);
        }
    }

    #[test]
    fn unverified_or_mismatched_proof_is_rejected() {
        let now = Utc::now();
        let mut record = ended_record(now, true);

        let mut forged = proof(200);
        forged.signature_valid = false;
        assert!(matches!(
            settle_payment(&mut record, WINNER, &forged, now),
            Err(AuctionError::Authorization { .. })
        ));
        assert!(matches!(
            settle_payment(&mut record, WINNER, &proof(150), now),
            Err(AuctionError::Authorization { .. })
        ));
        assert!(!record.auction.paid);
    }

    #[test]
    fn no_winner_means_no_payment() {
        let now = Utc::now();
        let mut record = ended_record(now, false);
        assert!(matches!(
            settle_payment(&mut record, WINNER, &proof(100), now),
            Err(AuctionError::Authorization { .. })
        ));
    }

    #[test]
    fn payment_before_close_is_phase_error() {
        let now = Utc::now();
        let mut record = ended_record(now, true);
        record.auction.end_time = now + Duration::minutes(10);

        assert_eq!(
            settle_payment(&mut record, WINNER, &proof(200), now),
            Err(AuctionError::Phase {
                expected: Phase::Ended,
                actual: Phase::Active
            })
        );
    }
}
