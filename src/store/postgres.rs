// region:    --- Imports
use super::{queries, removed_bids, AuctionStore, Change, Mutation, RemoveGuard};
use crate::auction::model::{Auction, AuctionId, AuctionRecord, Bid, NewAuction, UserId};
use crate::error::{AuctionError, AuctionResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Postgres Store
/// Postgres 저장소
/// 경매 행에 대한 `SELECT ... FOR UPDATE`가 트랜잭션 경계다.
pub struct PostgresAuctionStore {
    pool: Arc<PgPool>,
    lock_timeout: Duration,
}

impl PostgresAuctionStore {
    /// 데이터베이스 연결
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        lock_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(lock_timeout)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
            lock_timeout,
        })
    }

    /// 데이터베이스 풀 가져오기
    pub fn get_pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// 스키마 초기화
    pub async fn initialize_database(&self) -> Result<(), sqlx::Error> {
        let create_schema_sql = include_str!("../../sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await?;
        info!("{:<12} --> 스키마 초기화 완료", "Store");
        Ok(())
    }

    /// 여러 쿼리 실행
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&*self.pool).await?;
            }
        }
        Ok(())
    }

    /// 잠금 대기 시간이 제한된 트랜잭션 시작
    /// `snapshot`이면 경매와 입찰 이력을 같은 스냅샷에서 읽도록 REPEATABLE READ로 시작한다.
    async fn begin(&self, snapshot: bool) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        if snapshot {
            sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;
        Ok(tx)
    }

    async fn load(
        tx: &mut Transaction<'static, Postgres>,
        id: AuctionId,
        for_update: bool,
    ) -> AuctionResult<AuctionRecord> {
        let sql = if for_update {
            queries::select_auction_for_update()
        } else {
            queries::select_auction()
        };
        let auction = sqlx::query_as::<_, Auction>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(AuctionError::NotFound(id))?;

        let bids = sqlx::query_as::<_, Bid>(queries::SELECT_BIDS)
            .bind(id)
            .fetch_all(&mut **tx)
            .await?;

        Ok(AuctionRecord { auction, bids })
    }

    /// 변경된 레코드 저장
    async fn persist(
        tx: &mut Transaction<'static, Postgres>,
        before: &AuctionRecord,
        after: &mut AuctionRecord,
    ) -> AuctionResult<()> {
        let auction = &after.auction;
        sqlx::query(queries::UPDATE_AUCTION)
            .bind(auction.current_bid)
            .bind(auction.start_time)
            .bind(auction.end_time)
            .bind(auction.paid)
            .bind(&auction.payment_order_id)
            .bind(auction.version)
            .bind(auction.id)
            .execute(&mut **tx)
            .await?;

        // 이력에서 빠진 입찰은 보관 후 삭제
        let removed: Vec<i64> = removed_bids(&before.bids, &after.bids)
            .iter()
            .map(|bid| bid.id)
            .collect();
        if !removed.is_empty() {
            sqlx::query(queries::ARCHIVE_BIDS)
                .bind(removed.as_slice())
                .execute(&mut **tx)
                .await?;
            sqlx::query(queries::DELETE_BIDS)
                .bind(removed.as_slice())
                .execute(&mut **tx)
                .await?;
            debug!(
                "{:<12} --> 입찰 이력 보관 id: {}, 건수: {}",
                "Store",
                auction.id,
                removed.len()
            );
        }

        // 새 입찰은 오래된 것부터 저장
        for bid in after.bids.iter_mut().rev().filter(|bid| bid.id == 0) {
            bid.id = sqlx::query_scalar::<_, i64>(queries::INSERT_BID)
                .bind(bid.auction_id)
                .bind(bid.bidder_id)
                .bind(bid.amount)
                .bind(bid.placed_at)
                .fetch_one(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn insert(
        &self,
        auction: NewAuction,
        owner_id: UserId,
        created_at: DateTime<Utc>,
    ) -> AuctionResult<AuctionRecord> {
        let auction = sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
            .bind(&auction.title)
            .bind(&auction.description)
            .bind(&auction.category)
            .bind(&auction.condition)
            .bind(auction.starting_bid)
            .bind(auction.start_time)
            .bind(auction.end_time)
            .bind(owner_id)
            .bind(created_at)
            .fetch_one(&*self.pool)
            .await?;
        Ok(AuctionRecord {
            auction,
            bids: Vec::new(),
        })
    }

    async fn fetch(&self, id: AuctionId) -> AuctionResult<AuctionRecord> {
        let mut tx = self.begin(true).await?;
        let record = Self::load(&mut tx, id, false).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn list(&self) -> AuctionResult<Vec<AuctionRecord>> {
        let mut tx = self.begin(true).await?;
        let auctions = sqlx::query_as::<_, Auction>(&queries::select_all_auctions())
            .fetch_all(&mut *tx)
            .await?;
        let bids = sqlx::query_as::<_, Bid>(queries::SELECT_ALL_BIDS)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let mut bids_by_auction: HashMap<AuctionId, Vec<Bid>> = HashMap::new();
        for bid in bids {
            bids_by_auction.entry(bid.auction_id).or_default().push(bid);
        }
        Ok(auctions
            .into_iter()
            .map(|auction| {
                let bids = bids_by_auction.remove(&auction.id).unwrap_or_default();
                AuctionRecord { auction, bids }
            })
            .collect())
    }

    async fn transact(
        &self,
        id: AuctionId,
        mutation: Mutation,
    ) -> AuctionResult<(AuctionRecord, Change)> {
        let mut tx = self.begin(false).await?;
        let before = Self::load(&mut tx, id, true).await?;

        let mut after = before.clone();
        let change = match mutation(&mut after) {
            Ok(change) => change,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        };
        if change == Change::Unchanged {
            tx.rollback().await?;
            return Ok((before, change));
        }

        after.auction.version = before.auction.version + 1;
        Self::persist(&mut tx, &before, &mut after).await?;
        tx.commit().await?;
        Ok((after, change))
    }

    async fn remove(&self, id: AuctionId, guard: RemoveGuard) -> AuctionResult<AuctionRecord> {
        let mut tx = self.begin(false).await?;
        let mut record = Self::load(&mut tx, id, true).await?;
        if let Err(e) = guard(&record) {
            tx.rollback().await?;
            return Err(e);
        }

        sqlx::query(queries::DELETE_AUCTION)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(queries::DELETE_ARCHIVED_BIDS)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        record.auction.version += 1;
        debug!("{:<12} --> 경매 삭제 id: {}", "Store", id);
        Ok(record)
    }

    async fn archived_bids(&self, id: AuctionId) -> AuctionResult<Vec<Bid>> {
        let exists = sqlx::query_scalar::<_, bool>(queries::AUCTION_EXISTS)
            .bind(id)
            .fetch_one(&*self.pool)
            .await?;
        if !exists {
            return Err(AuctionError::NotFound(id));
        }
        let bids = sqlx::query_as::<_, Bid>(queries::SELECT_ARCHIVED_BIDS)
            .bind(id)
            .fetch_all(&*self.pool)
            .await?;
        Ok(bids)
    }
}

// endregion: --- Postgres Store
