const AUCTION_COLUMNS: &str = "id, title, description, category, condition, starting_bid, current_bid, start_time, end_time, owner_id, paid, payment_order_id, version, created_at";

/// 경매 생성
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (title, description, category, condition, starting_bid, current_bid, start_time, end_time, owner_id, paid, created_at)
    VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $8, FALSE, $9)
    RETURNING id, title, description, category, condition, starting_bid, current_bid, start_time, end_time, owner_id, paid, payment_order_id, version, created_at
"#;

/// 경매 조회
pub fn select_auction() -> String {
    format!("SELECT {} FROM auctions WHERE id = $1", AUCTION_COLUMNS)
}

/// 경매 조회 (행 잠금)
pub fn select_auction_for_update() -> String {
    format!("SELECT {} FROM auctions WHERE id = $1 FOR UPDATE", AUCTION_COLUMNS)
}

/// 모든 경매 조회
pub fn select_all_auctions() -> String {
    format!("SELECT {} FROM auctions ORDER BY id", AUCTION_COLUMNS)
}

/// 입찰 이력 조회 (금액이 계속 오르므로 금액 내림차순 = 최신순)
pub const SELECT_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, amount, placed_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC
"#;

/// 모든 입찰 이력 조회
pub const SELECT_ALL_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, amount, placed_at
    FROM bids
    ORDER BY auction_id, amount DESC
"#;

/// 경매 가변 필드 갱신
pub const UPDATE_AUCTION: &str = r#"
    UPDATE auctions
    SET current_bid = $1, start_time = $2, end_time = $3, paid = $4, payment_order_id = $5, version = $6
    WHERE id = $7
"#;

/// 입찰 기록 추가
pub const INSERT_BID: &str =
    "INSERT INTO bids (auction_id, bidder_id, amount, placed_at) VALUES ($1, $2, $3, $4) RETURNING id";

/// 입찰 이력 보관
pub const ARCHIVE_BIDS: &str = r#"
    INSERT INTO bid_archive (id, auction_id, bidder_id, amount, placed_at)
    SELECT id, auction_id, bidder_id, amount, placed_at FROM bids WHERE id = ANY($1)
    ON CONFLICT (id) DO NOTHING
"#;

/// 입찰 기록 삭제
pub const DELETE_BIDS: &str = "DELETE FROM bids WHERE id = ANY($1)";

/// 경매 삭제
pub const DELETE_AUCTION: &str = "DELETE FROM auctions WHERE id = $1";

/// 삭제된 경매의 보관 이력 삭제
pub const DELETE_ARCHIVED_BIDS: &str = "DELETE FROM bid_archive WHERE auction_id = $1";

/// 경매 존재 여부
pub const AUCTION_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM auctions WHERE id = $1)";

/// 보관된 입찰 이력 조회
pub const SELECT_ARCHIVED_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, amount, placed_at
    FROM bid_archive
    WHERE auction_id = $1
    ORDER BY id DESC
"#;
