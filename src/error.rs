/// 경매 엔진 오류 타입
// region:    --- Imports
use crate::auction::model::AuctionId;
use crate::phase::Phase;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Auction Error
/// 경매 엔진의 모든 연산이 반환하는 오류
///
/// `Retryable`을 제외한 모든 오류는 도메인 검증 실패이며, 상태를 전혀 변경하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("현재 경매 단계({actual})에서는 허용되지 않는 요청입니다. 필요 단계: {expected}")]
    Phase { expected: Phase, actual: Phase },

    #[error("자신의 경매에는 입찰할 수 없습니다.")]
    SelfBid,

    #[error("입찰 금액({amount})이 현재 가격({current_bid})보다 높아야 합니다.")]
    BidTooLow { amount: i64, current_bid: i64 },

    #[error("경매 시작 시간은 종료 시간보다 빨라야 합니다.")]
    InvalidWindow,

    #[error("권한이 없습니다: {reason}")]
    Authorization { reason: String },

    #[error("경매를 찾을 수 없습니다: {0}")]
    NotFound(AuctionId),

    #[error("잘못된 경매 정보입니다: {0}")]
    InvalidAuction(String),

    #[error("일시적인 오류입니다. 다시 시도해 주세요: {0}")]
    Retryable(String),
}

impl AuctionError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        AuctionError::Authorization {
            reason: reason.into(),
        }
    }

    /// 클라이언트용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::Phase { .. } => "PHASE",
            AuctionError::SelfBid => "SELF_BID",
            AuctionError::BidTooLow { .. } => "LOW_BID",
            AuctionError::InvalidWindow => "INVALID_WINDOW",
            AuctionError::Authorization { .. } => "UNAUTHORIZED",
            AuctionError::NotFound(_) => "NOT_FOUND",
            AuctionError::InvalidAuction(_) => "INVALID_AUCTION",
            AuctionError::Retryable(_) => "RETRYABLE",
        }
    }

    /// 재시도가 의미 있는 오류인지 여부
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuctionError::Retryable(_))
    }
}

/// 저장소 오류는 모두 일시적 오류로 취급한다.
impl From<sqlx::Error> for AuctionError {
    fn from(e: sqlx::Error) -> Self {
        AuctionError::Retryable(e.to_string())
    }
}

pub type AuctionResult<T> = Result<T, AuctionError>;

// endregion: --- Auction Error
