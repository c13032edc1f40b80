//! Row shapes of the `contacts` and `default_message` tables. The DDL lives
//! in `migrations/`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::models::{Contact, DefaultMessage};

pub const CONTACT_COLUMNS: &str = "id, name, phone, status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = PersistenceError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e: String| PersistenceError::Corrupt(format!("contact {}: {e}", row.id)))?;
        Ok(Contact {
            id: row.id,
            name: row.name,
            phone: row.phone,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct DefaultMessageRow {
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DefaultMessageRow> for DefaultMessage {
    fn from(row: DefaultMessageRow) -> Self {
        DefaultMessage {
            message: row.message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
