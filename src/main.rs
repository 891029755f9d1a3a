// region:    --- Imports
use auction_engine::config::Config;
use auction_engine::engine::AuctionEngine;
use auction_engine::handlers;
use auction_engine::message_broker::KafkaNotifier;
use auction_engine::notify::{BroadcastNotifier, Notifier};
use auction_engine::phase::SystemClock;
use auction_engine::scheduler::PhaseTicker;
use auction_engine::store::{AuctionStore, MemoryAuctionStore, PostgresAuctionStore};
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    info!("{:<12} --> 설정: {:?}", "Main", config);

    // 저장소 선택 (DATABASE_URL이 없으면 메모리 저장소)
    let store: Arc<dyn AuctionStore> = match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresAuctionStore::connect(
                url,
                config.database_max_connections,
                config.lock_timeout,
            )
            .await?;
            if let Err(e) = store.initialize_database().await {
                error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
            Arc::new(store)
        }
        None => {
            warn!(
                "{:<12} --> DATABASE_URL 없음, 메모리 저장소로 실행합니다.",
                "Main"
            );
            Arc::new(MemoryAuctionStore::new(config.lock_timeout))
        }
    };

    let clock = Arc::new(SystemClock);
    let broadcast = Arc::new(BroadcastNotifier::new(1024));
    let mut engine = AuctionEngine::new(Arc::clone(&store), clock.clone())
        .with_notifier(broadcast as Arc<dyn Notifier>);

    // Kafka 알림 (선택)
    if let Some(brokers) = config.kafka_brokers.as_deref() {
        let kafka = KafkaNotifier::new(brokers, config.updates_topic.clone())?;
        if let Err(e) = kafka.ensure_topic(5, 1).await {
            error!("{:<12} --> Kafka 토픽 준비 실패: {:?}", "Main", e);
            return Err(e.into());
        }
        info!("{:<12} --> Kafka 초기화 성공: {}", "Main", kafka.topic());
        engine = engine.with_notifier(Arc::new(kafka));
    }
    let engine = Arc::new(engine);

    // 단계 전환 알림 스케줄러
    let ticker = Arc::new(PhaseTicker::new(
        engine.store(),
        engine.clock(),
        engine.notifiers(),
        config.tick_interval,
    ));
    ticker.start();

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes_all = handlers::router(engine)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
