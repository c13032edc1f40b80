//! Persistence for contacts and the default message.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::models::{Contact, ContactQuery, ContactStatus, DefaultMessage, NewContact};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Key of the single default message entry.
pub const DEFAULT_MESSAGE_KEY: &str = "default";

pub type Result<T> = std::result::Result<T, PersistenceError>;

#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Contacts matching `query`, newest first.
    async fn list_contacts(&self, query: &ContactQuery) -> Result<Vec<Contact>>;

    async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>>;

    /// Insert the whole batch with status `pending`, or nothing at all.
    async fn insert_contacts(&self, contacts: &[NewContact]) -> Result<Vec<Contact>>;

    /// Set the status, refresh `updated_at`, and return the stored row.
    async fn set_status(&self, id: Uuid, status: ContactStatus) -> Result<Contact>;

    /// `Ok(None)` when no message has been saved yet.
    async fn default_message(&self) -> Result<Option<DefaultMessage>>;

    async fn upsert_default_message(&self, message: &str) -> Result<DefaultMessage>;
}
