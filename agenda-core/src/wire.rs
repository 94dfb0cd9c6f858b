//! JSON shapes exchanged with the meetings API.
//!
//! Incoming records are parsed leniently: relations may arrive embedded or as
//! bare ids (numbers or numeric strings), and list endpoints may answer with a
//! bare array or a `{results: [...]}` envelope.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::location::Location;
use crate::user::User;

/// Error code the server uses for overlapping bookings.
pub const TIME_CONFLICT: &str = "time_conflict";

/// An identifier that may be sent as a number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireId::Number(n) => Some(*n),
            WireId::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireId::Number(n) => write!(f, "{n}"),
            WireId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedUser {
    #[serde(default)]
    pub id: Option<WireId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A user relation as found on a meeting record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Embedded(EmbeddedUser),
    Id(WireId),
}

/// Meeting record as returned by `GET /meetings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMeeting {
    pub id: WireId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub executive: Option<UserRef>,
    #[serde(default)]
    pub executive_id: Option<WireId>,
    #[serde(default)]
    pub collaborator: Option<UserRef>,
    #[serde(default)]
    pub collaborator_id: Option<WireId>,
    pub location: Location,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub attendees: Option<Vec<UserRef>>,
}

/// Body of `POST /meetings` and `PUT /meetings/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingPayload {
    pub title: String,
    pub client: String,
    pub location: Location,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborator_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<i64>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
}

/// Pull the records out of a list response and parse each one, skipping
/// (and logging) records that don't match the expected shape.
pub fn parse_listing<T: DeserializeOwned>(value: Value, what: &str) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Skipping malformed {what} record: {e}");
                None
            }
        })
        .collect()
}

/// Error body of a failed request. Every field is optional; unknown shapes
/// yield an empty body.
#[derive(Debug, Clone, Default)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
    pub errors: Vec<String>,
    pub details: Vec<String>,
    pub conflicts: Vec<Value>,
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("message").and_then(value_text),
        other => Some(other.to_string()),
    }
}

fn value_texts(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
        Some(single) => value_text(single).into_iter().collect(),
        None => Vec::new(),
    }
}

impl ErrorBody {
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(&value),
            Err(_) => ErrorBody::default(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return ErrorBody::default();
        };

        ErrorBody {
            error: map.get("error").and_then(value_text),
            message: map.get("message").and_then(value_text),
            errors: value_texts(map.get("errors")),
            details: value_texts(map.get("details")),
            conflicts: match map.get("conflicts") {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            },
        }
    }

    pub fn is_time_conflict(&self) -> bool {
        self.error.as_deref() == Some(TIME_CONFLICT)
    }

    /// Most specific human-readable message the body carries.
    pub fn best_message(&self) -> Option<String> {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .or_else(|| self.error.clone().filter(|e| !e.is_empty()))
            .or_else(|| self.errors.first().cloned())
            .or_else(|| {
                if self.details.is_empty() {
                    None
                } else {
                    Some(self.details.join(", "))
                }
            })
    }
}
