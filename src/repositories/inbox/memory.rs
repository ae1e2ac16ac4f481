//! 프로세스 내 Inbox 저장소

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::errors::AppError;
use crate::domain::entities::inbox::InboxEntry;
use crate::repositories::inbox::InboxStore;
use crate::repositories::lock_poisoned;

#[derive(Default)]
pub struct InMemoryInboxStore {
    entries: Mutex<HashMap<(String, String), InboxEntry>>,
}

impl InMemoryInboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl InboxStore for InMemoryInboxStore {
    async fn insert_if_absent(&self, entry: InboxEntry, now: DateTime<Utc>) -> Result<bool, AppError> {
        let mut entries = self.entries.lock().map_err(lock_poisoned)?;
        let key = (entry.message_id.clone(), entry.consumer_id.clone());

        match entries.get(&key) {
            Some(existing) if !existing.is_expired(now) => Ok(false),
            _ => {
                entries.insert(key, entry);
                Ok(true)
            }
        }
    }

    async fn remove(&self, message_id: &str, consumer_id: &str) -> Result<bool, AppError> {
        let mut entries = self.entries.lock().map_err(lock_poisoned)?;
        Ok(entries
            .remove(&(message_id.to_string(), consumer_id.to_string()))
            .is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut entries = self.entries.lock().map_err(lock_poisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok((before - entries.len()) as u64)
    }
}
