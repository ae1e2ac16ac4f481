//! 도메인 이벤트 발행
//!
//! 상태 변경이 커밋된 뒤 서비스가 [`EventPublisher::publish`]를 호출합니다.
//! 프로세스 내 버스는 등록된 소비자마다 인박스로 중복을 걸러낸 뒤 이벤트를 전달하므로,
//! 같은 이벤트가 다시 발행되어도 소비자별로 한 번만 처리됩니다.
//! 소비자가 실패하면 인박스 기록을 해제하므로 재전달된 이벤트는 그 소비자에게 다시 전달됩니다.
//!
//! 발행 실패는 원래 연산을 실패시키지 않습니다. [`publish_or_log`]가 에러를 로그로만 남깁니다.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::AppError;
use crate::domain::models::events::DomainEvent;
use crate::services::inbox::InboxService;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<(), AppError>;
}

/// 이벤트 소비자
#[async_trait]
pub trait EventConsumer: Send + Sync {
    /// 인박스의 `consumer_id`로 쓰이는 고유 이름
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &DomainEvent) -> Result<(), AppError>;
}

/// 이벤트를 발행하고, 실패하면 로그만 남깁니다.
pub async fn publish_or_log(publisher: &dyn EventPublisher, event: DomainEvent) {
    let event_type = event.event_type.as_str();
    let event_id = event.event_id;
    if let Err(e) = publisher.publish(event).await {
        log::error!("이벤트 발행 실패 ({} {}): {}", event_type, event_id, e);
    }
}

/// 프로세스 내 이벤트 버스
pub struct InProcessEventBus {
    inbox: Arc<InboxService>,
    consumers: Vec<Arc<dyn EventConsumer>>,
}

impl InProcessEventBus {
    pub fn new(inbox: Arc<InboxService>) -> Self {
        Self {
            inbox,
            consumers: Vec::new(),
        }
    }

    pub fn with_consumer(mut self, consumer: Arc<dyn EventConsumer>) -> Self {
        self.consumers.push(consumer);
        self
    }
}

#[async_trait]
impl EventPublisher for InProcessEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), AppError> {
        let message_id = event.event_id.to_string();
        let ttl = self.inbox.default_ttl();

        for consumer in &self.consumers {
            let should_process = self
                .inbox
                .process_if_new(&message_id, consumer.name(), event.event_type.as_str(), ttl)
                .await?;
            if !should_process {
                continue;
            }

            // 한 소비자의 실패가 다른 소비자 전달을 막지 않습니다
            if let Err(e) = consumer.handle(&event).await {
                log::error!("이벤트 소비 실패 (consumer={}, event={}): {}", consumer.name(), message_id, e);
                if let Err(e) = self.inbox.release(&message_id, consumer.name()).await {
                    log::error!("인박스 기록 해제 실패 (consumer={}, event={}): {}", consumer.name(), message_id, e);
                }
            }
        }

        Ok(())
    }
}

/// 보안 감사 로그 소비자
#[derive(Debug, Default)]
pub struct AuditLogConsumer;

#[async_trait]
impl EventConsumer for AuditLogConsumer {
    fn name(&self) -> &'static str {
        "audit-log"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), AppError> {
        log::info!(
            target: "audit",
            "{} user={} at={} payload={}",
            event.event_type.as_str(),
            event.user_id,
            event.occurred_at.to_rfc3339(),
            event.payload
        );
        Ok(())
    }
}
