use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContactStore, Result};
use crate::error::PersistenceError;
use crate::models::{Contact, ContactQuery, ContactStatus, DefaultMessage, NewContact};

/// In-process store. Used when no database is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    // insertion order
    contacts: Vec<Contact>,
    default_message: Option<DefaultMessage>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn list_contacts(&self, query: &ContactQuery) -> Result<Vec<Contact>> {
        let inner = self.inner.read().await;
        let mut contacts: Vec<Contact> = inner
            .contacts
            .iter()
            .rev()
            .filter(|c| query.status.map_or(true, |s| c.status == s))
            .filter(|c| {
                query
                    .phone
                    .as_deref()
                    .map_or(true, |p| c.phone.contains(p))
            })
            .cloned()
            .collect();
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(contacts
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect())
    }

    async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
        let inner = self.inner.read().await;
        Ok(inner.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_contacts(&self, contacts: &[NewContact]) -> Result<Vec<Contact>> {
        let now = Utc::now();
        let inserted: Vec<Contact> = contacts
            .iter()
            .map(|c| Contact {
                id: Uuid::new_v4(),
                name: c.name.clone(),
                phone: c.phone.clone(),
                status: ContactStatus::Pending,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let mut inner = self.inner.write().await;
        inner.contacts.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn set_status(&self, id: Uuid, status: ContactStatus) -> Result<Contact> {
        let mut inner = self.inner.write().await;
        let contact = inner
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(PersistenceError::NotFound(id))?;
        contact.status = status;
        contact.updated_at = Utc::now();
        Ok(contact.clone())
    }

    async fn default_message(&self) -> Result<Option<DefaultMessage>> {
        Ok(self.inner.read().await.default_message.clone())
    }

    async fn upsert_default_message(&self, message: &str) -> Result<DefaultMessage> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let saved = match inner.default_message.take() {
            Some(existing) => DefaultMessage {
                message: message.to_string(),
                created_at: existing.created_at,
                updated_at: now,
            },
            None => DefaultMessage {
                message: message.to_string(),
                created_at: now,
                updated_at: now,
            },
        };
        inner.default_message = Some(saved.clone());
        Ok(saved)
    }
}
