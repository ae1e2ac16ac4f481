//! 외부로 나가는 알림 협력자
//!
//! - [`email_sender`] - 인증/재설정 메일 발송
//! - [`event_bus`] - 도메인 이벤트 발행과 인박스 기반 중복 제거 소비

pub mod email_sender;
pub mod event_bus;

pub use email_sender::{EmailMessage, EmailSender, HttpEmailSender, LogEmailSender};
pub use event_bus::{publish_or_log, AuditLogConsumer, EventConsumer, EventPublisher, InProcessEventBus};
