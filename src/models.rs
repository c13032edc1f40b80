use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery status tracked per contact.
///
/// Every contact starts out `Pending`. Dispatch moves it to `Sent` or `Error`
/// and nothing ever moves it back to `Pending`; any state can be dispatched
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    Pending,
    Sent,
    Error,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown contact status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    /// Digits only, without country code.
    pub phone: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated contact ready to be inserted. Status is always `pending` on
/// insert, so it is not carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultMessage {
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing filters. `limit`/`offset` default to 10000/0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactQuery {
    pub status: Option<ContactStatus>,
    pub phone: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ContactQuery {
    pub const DEFAULT_LIMIT: i64 = 10000;

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).max(0)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
