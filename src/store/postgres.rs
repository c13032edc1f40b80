use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ContactStore, Result, DEFAULT_MESSAGE_KEY};
use crate::error::PersistenceError;
use crate::models::{Contact, ContactQuery, ContactStatus, DefaultMessage, NewContact};
use crate::schema::{ContactRow, DefaultMessageRow, CONTACT_COLUMNS};

// Two binds per row, Postgres allows 65535 per statement.
const INSERT_CHUNK: usize = 10_000;

/// Postgres-backed store. Queries are checked at runtime, so building does
/// not need a live database.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> sqlx::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn list_contacts(&self, query: &ContactQuery) -> Result<Vec<Contact>> {
        let sql = format!(
            r#"
            SELECT {CONTACT_COLUMNS}
            FROM contacts
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR strpos(phone, $2) > 0)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(query.status.map(|s| s.as_str()))
            .bind(query.phone.as_deref())
            .bind(query.limit())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Contact::try_from).collect()
    }

    async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1");
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Contact::try_from).transpose()
    }

    async fn insert_contacts(&self, contacts: &[NewContact]) -> Result<Vec<Contact>> {
        if contacts.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(contacts.len());
        for chunk in contacts.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO contacts (id, name, phone, status) ");
            builder.push_values(chunk, |mut b, contact| {
                b.push_bind(Uuid::new_v4())
                    .push_bind(contact.name.clone())
                    .push_bind(contact.phone.clone())
                    .push_bind(ContactStatus::Pending.as_str());
            });
            builder.push(format!(" RETURNING {CONTACT_COLUMNS}"));

            let rows = builder
                .build_query_as::<ContactRow>()
                .fetch_all(&mut *tx)
                .await?;
            for row in rows {
                inserted.push(Contact::try_from(row)?);
            }
        }
        tx.commit().await?;

        tracing::debug!(count = inserted.len(), "inserted contacts");
        Ok(inserted)
    }

    async fn set_status(&self, id: Uuid, status: ContactStatus) -> Result<Contact> {
        let sql = format!(
            r#"
            UPDATE contacts
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {CONTACT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PersistenceError::NotFound(id))?;
        Contact::try_from(row)
    }

    async fn default_message(&self) -> Result<Option<DefaultMessage>> {
        let row = sqlx::query_as::<_, DefaultMessageRow>(
            "SELECT message, created_at, updated_at FROM default_message WHERE key = $1",
        )
        .bind(DEFAULT_MESSAGE_KEY)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(DefaultMessage::from))
    }

    async fn upsert_default_message(&self, message: &str) -> Result<DefaultMessage> {
        let row = sqlx::query_as::<_, DefaultMessageRow>(
            r#"
            INSERT INTO default_message (key, message)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE
            SET message = EXCLUDED.message, updated_at = now()
            RETURNING message, created_at, updated_at
            "#,
        )
        .bind(DEFAULT_MESSAGE_KEY)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}
