//! Rendering the default message for a contact and handing it to WhatsApp.
//!
//! Delivery is never observed. A contact is marked `sent` once a link could
//! be built, and `error` when anything before that failed.

use serde::Serialize;
use url::Url;

use crate::error::DispatchError;
use crate::models::{Contact, ContactStatus};
use crate::phone;
use crate::store::ContactStore;
use crate::template::TemplateEngine;

pub const WHATSAPP_BASE: &str = "https://wa.me";

#[derive(Debug, Clone)]
pub struct Dispatcher {
    engine: TemplateEngine,
    country_code: String,
}

/// What a dispatch did.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    /// The contact as stored after the status write, or the input contact
    /// when the write failed.
    pub contact: Contact,
    pub status: ContactStatus,
    /// `false` when the status write failed and `contact` is stale.
    pub persisted: bool,
    pub message: Option<String>,
    pub link: Option<Url>,
    pub error: Option<String>,
}

struct Rendered {
    message: String,
    link: Url,
}

impl Dispatcher {
    pub fn new(engine: TemplateEngine, country_code: impl Into<String>) -> Self {
        Self {
            engine,
            country_code: country_code.into(),
        }
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    /// Build `https://wa.me/<cc><digits>?text=<message>`.
    pub fn link(&self, phone: &str, message: &str) -> Result<Url, DispatchError> {
        let digits = phone::normalize_strict(phone)?;
        let raw = format!(
            "{WHATSAPP_BASE}/{}{digits}?text={}",
            self.country_code,
            urlencoding::encode(message)
        );
        Ok(Url::parse(&raw)?)
    }

    async fn render(
        &self,
        store: &dyn ContactStore,
        contact: &Contact,
    ) -> Result<Rendered, DispatchError> {
        let template = store
            .default_message()
            .await
            .map_err(DispatchError::Template)?
            .map(|m| m.message)
            .unwrap_or_else(|| self.engine.fallback());
        let message = self.engine.render(&template, &contact.name);
        let link = self.link(&contact.phone, &message)?;
        Ok(Rendered { message, link })
    }

    pub async fn dispatch(&self, store: &dyn ContactStore, contact: &Contact) -> DispatchReport {
        let failure = match self.render(store, contact).await {
            Ok(rendered) => match store.set_status(contact.id, ContactStatus::Sent).await {
                Ok(updated) => {
                    tracing::info!(
                        contact_id = %contact.id,
                        previous = %contact.status,
                        "dispatched message"
                    );
                    return DispatchReport {
                        contact: updated,
                        status: ContactStatus::Sent,
                        persisted: true,
                        message: Some(rendered.message),
                        link: Some(rendered.link),
                        error: None,
                    };
                }
                Err(e) => DispatchError::Record(e),
            },
            Err(e) => e,
        };

        tracing::warn!(contact_id = %contact.id, error = %failure, "dispatch failed");
        let (stored, persisted) = match store.set_status(contact.id, ContactStatus::Error).await {
            Ok(updated) => (updated, true),
            Err(e) => {
                tracing::error!(
                    contact_id = %contact.id,
                    error = %e,
                    "failed to record error status"
                );
                (contact.clone(), false)
            }
        };

        DispatchReport {
            contact: stored,
            status: ContactStatus::Error,
            persisted,
            message: None,
            link: None,
            error: Some(failure.to_string()),
        }
    }
}
