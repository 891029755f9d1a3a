use crate::phase::{self, Phase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type AuctionId = i64;
pub type UserId = i64;

// 경매 모델
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: AuctionId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub condition: String,
    pub starting_bid: i64,
    pub current_bid: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub owner_id: UserId,
    pub paid: bool,
    pub payment_order_id: Option<String>,
    // 커밋될 때마다 1씩 증가 (알림 순서 판단용)
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
        phase::resolve_phase(now, self.start_time, self.end_time)
    }
}

// 입찰 모델
// id가 0이면 아직 저장되지 않은 입찰이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: AuctionId,
    pub bidder_id: UserId,
    pub amount: i64,
    pub placed_at: DateTime<Utc>,
}

/// 경매 단위 트랜잭션의 대상
/// 입찰 이력은 최신 입찰이 앞에 온다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub auction: Auction,
    pub bids: Vec<Bid>,
}

impl AuctionRecord {
    pub fn id(&self) -> AuctionId {
        self.auction.id
    }

    pub fn bidder_count(&self) -> usize {
        self.bids.len()
    }
}

// 경매 생성 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuction {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub condition: String,
    pub starting_bid: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

// 경매 기간
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl AuctionWindow {
    pub fn is_valid(&self) -> bool {
        self.start_time < self.end_time
    }

    /// 올바른 기간이고 `now` 기준으로 아직 끝나지 않았는지
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_valid() && now < self.end_time
    }
}

/// 사용자 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Bidder,
    Auctioneer,
    SuperAdmin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bidder" | "bidder" => Ok(Role::Bidder),
            "Auctioneer" | "auctioneer" => Ok(Role::Auctioneer),
            "SuperAdmin" | "Super Admin" | "super_admin" => Ok(Role::SuperAdmin),
            other => Err(format!("알 수 없는 역할: {}", other)),
        }
    }
}

/// 요청자 (세션 제공자가 전달)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// 경매 소유자이거나 관리자인지
    pub fn can_manage(&self, auction: &Auction) -> bool {
        self.id == auction.owner_id || self.role == Role::SuperAdmin
    }
}
