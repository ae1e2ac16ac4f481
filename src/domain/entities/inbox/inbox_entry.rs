//! Inbox Entry Entity
//!
//! `(message_id, consumer_id)` 쌍이 존재하면 그 메시지는 해당 소비자가 이미 처리한 것입니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::time_utils::bson_datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxEntry {
    pub message_id: String,
    pub consumer_id: String,
    pub event_type: String,
    #[serde(with = "bson_datetime")]
    pub processed_at: DateTime<Utc>,
    #[serde(with = "bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl InboxEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
