//! Notifications the server generates for a user

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::ids::NotificationId;
use crate::utils::{deserialize_null_string, deserialize_timestamp};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    title: String,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    message: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    read_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    created_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(id: NotificationId, title: String, message: String) -> Self {
        Self { id, title, message, read_at: None, created_at: Some(Utc::now()) }
    }

    pub fn id(&self) -> NotificationId                  { self.id }
    pub fn title(&self) -> &str                         { &self.title }
    pub fn message(&self) -> &str                       { &self.message }
    pub fn read_at(&self) -> Option<&DateTime<Utc>>     { self.read_at.as_ref() }
    pub fn created_at(&self) -> Option<&DateTime<Utc>>  { self.created_at.as_ref() }

    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

/// Number of notifications that have not been read yet
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| n.is_unread()).count()
}
