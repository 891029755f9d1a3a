/// Kafka 알림 발행
/// 메시지 키는 경매 id라서 같은 경매의 알림은 한 파티션에 쌓인다.
// region:    --- Imports
use crate::auction::events::AuctionUpdate;
use crate::notify::Notifier;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

// endregion: --- Imports

// region:    --- Encoding
/// 알림을 (키, JSON 본문)으로 변환
pub fn encode(update: &AuctionUpdate) -> Result<(String, String), serde_json::Error> {
    let payload = serde_json::to_string(update)?;
    Ok((update.auction_id.to_string(), payload))
}

// endregion: --- Encoding

// region:    --- Kafka Notifier
pub struct KafkaNotifier {
    producer: FutureProducer,
    brokers: String,
    topic: String,
    queue_timeout: Duration,
}

impl KafkaNotifier {
    pub fn new(brokers: &str, topic: impl Into<String>) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            brokers: brokers.to_string(),
            topic: topic.into(),
            queue_timeout: Duration::from_millis(500),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 알림 토픽 준비 (이미 있으면 그대로 사용)
    pub async fn ensure_topic(
        &self,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), KafkaError> {
        let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()?;

        let topic = NewTopic::new(
            &self.topic,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );
        let results = admin.create_topics(&[topic], &AdminOptions::new()).await?;

        for result in results {
            match result {
                Ok(name) => info!("{:<12} --> 토픽 생성: {}", "Kafka", name),
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    debug!("{:<12} --> 기존 토픽 사용: {}", "Kafka", name)
                }
                Err((name, code)) => {
                    warn!("{:<12} --> 토픽 준비 실패: {} ({:?})", "Kafka", name, code);
                    return Err(KafkaError::AdminOp(code));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    async fn publish(&self, update: &AuctionUpdate) -> Result<(), String> {
        let (key, payload) = encode(update).map_err(|e| e.to_string())?;
        let record = FutureRecord::to(&self.topic).key(key.as_str()).payload(payload.as_str());

        let (partition, offset) = self
            .producer
            .send(record, self.queue_timeout)
            .await
            .map_err(|(e, _)| format!("Kafka 전송 실패: {}", e))?;
        debug!(
            "{:<12} --> 알림 전송 id: {}, v{}, partition: {}, offset: {}",
            "Kafka", key, update.version, partition, offset
        );
        Ok(())
    }
}

// endregion: --- Kafka Notifier

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::events::UpdateReason;
    use crate::phase::Phase;
    use chrono::Utc;

    #[test]
    fn encode_keys_by_auction_id() {
        let update = AuctionUpdate {
            auction_id: 42,
            current_bid: 700,
            bidder_count: 3,
            phase: Phase::Ended,
            version: 5,
            reason: UpdateReason::PhaseChanged,
            timestamp: Utc::now(),
        };

        let (key, payload) = encode(&update).unwrap();
        assert_eq!(key, "42");

        let body: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(body["version"], 5);
        assert_eq!(body["reason"], "phase_changed");
        assert_eq!(body["phase"], "ended");
        assert_eq!(serde_json::from_value::<AuctionUpdate>(body).unwrap(), update);
    }
}
