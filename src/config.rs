/// 서버 설정 (환경 변수)
// region:    --- Imports
use std::time::Duration;

// endregion: --- Imports

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_UPDATES_TOPIC: &str = "auction-updates";
const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: String,
    // 없으면 메모리 저장소
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    // 없으면 Kafka 알림 비활성화
    pub kafka_brokers: Option<String>,
    pub updates_topic: String,
    pub tick_interval: Duration,
    pub lock_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                non_empty("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
            )?,
            kafka_brokers: non_empty("KAFKA_BROKERS"),
            updates_topic: non_empty("UPDATES_TOPIC")
                .unwrap_or_else(|| DEFAULT_UPDATES_TOPIC.to_string()),
            tick_interval: Duration::from_millis(parse_or(
                "TICK_INTERVAL_MS",
                non_empty("TICK_INTERVAL_MS"),
                DEFAULT_TICK_INTERVAL_MS,
            )?),
            lock_timeout: Duration::from_millis(parse_or(
                "LOCK_TIMEOUT_MS",
                non_empty("LOCK_TIMEOUT_MS"),
                DEFAULT_LOCK_TIMEOUT_MS,
            )?),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, String> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} 값이 올바르지 않습니다: {}", key, raw)),
        None => Ok(default),
    }
}
