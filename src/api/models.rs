use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EmergencyContact {
    pub id: String,
    pub name: String,
    #[serde(rename = "phone")]
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "is_active", default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl EmergencyContact {
    /// Build a client-side draft with a fresh id, for offline-first creation.
    /// The server may replace the id (and normalize fields) on create.
    pub fn draft(
        name: impl Into<String>,
        phone_number: impl Into<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            phone_number: phone_number.into(),
            email,
            is_active: true,
        }
    }
}

/// One emergency notification payload. Built per send attempt, never persisted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmergencyAlert {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<EmergencyContact>>,
}

impl EmergencyAlert {
    pub fn new(latitude: f64, longitude: f64, contacts: Option<Vec<EmergencyContact>>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: now_millis(),
            contacts,
        }
    }
}

pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AlertResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "alert_id", default)]
    pub alert_id: Option<String>,
    #[serde(rename = "contacts_notified", default)]
    pub contacts_notified: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthResponse {
    pub user: User,
    #[serde(rename = "access_token")]
    pub access_token: String,
    #[serde(rename = "refresh_token", default)]
    pub refresh_token: Option<String>,
}
