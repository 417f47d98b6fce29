//! Appointment slots defined by staff members

use serde::{Deserialize, Serialize};

use crate::calendar::Dated;
use crate::ids::{ProviderId, SlotId};
use crate::utils::deserialize_null_string;

/// Who created a slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotKind {
    StaffDefined,
    ClientRequest,
}

impl Default for SlotKind {
    fn default() -> Self {
        SlotKind::StaffDefined
    }
}

/// A block of time a staff member offers for booking.
///
/// Only its owner may edit or delete it; clients read it while browsing availability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppointmentSlot {
    id: SlotId,
    /// Verbatim from the server: an ISO date, possibly followed by a time
    date: String,
    #[serde(alias = "startTime")]
    start_time: String,
    #[serde(alias = "endTime")]
    end_time: String,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    title: String,
    #[serde(alias = "supervisor_id", alias = "staff_id", alias = "ownerId")]
    owner_id: ProviderId,
    #[serde(default)]
    kind: SlotKind,
}

impl AppointmentSlot {
    pub fn new(id: SlotId, date: String, start_time: String, end_time: String, title: String, owner_id: ProviderId, kind: SlotKind) -> Self {
        Self { id, date, start_time, end_time, title, owner_id, kind }
    }

    pub fn id(&self) -> SlotId              { self.id }
    pub fn date(&self) -> &str              { &self.date }
    pub fn start_time(&self) -> &str        { &self.start_time }
    pub fn end_time(&self) -> &str          { &self.end_time }
    pub fn title(&self) -> &str             { &self.title }
    pub fn owner_id(&self) -> ProviderId    { self.owner_id }
    pub fn kind(&self) -> SlotKind          { self.kind }

    /// `YYYY-MM-DD`
    pub fn day(&self) -> &str {
        crate::utils::day_key(&self.date)
    }

    /// e.g. `09:00 - 09:30`. Seconds sent by the server are dropped
    pub fn time_label(&self) -> String {
        format!("{} - {}", hh_mm(&self.start_time), hh_mm(&self.end_time))
    }

    pub(crate) fn set_times(&mut self, start_time: String, end_time: String) {
        self.start_time = start_time;
        self.end_time = end_time;
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }
}

impl Dated for AppointmentSlot {
    fn date(&self) -> Option<&str> {
        Some(&self.date)
    }
}

/// `HH:MM` part of a `HH:MM[:SS]` time
pub fn hh_mm(time: &str) -> &str {
    time.get(..5).unwrap_or(time)
}


/// A staff or supervisor account offering slots
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    id: ProviderId,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    name: String,
}

impl Provider {
    pub fn new(id: ProviderId, name: String) -> Self {
        Self { id, name }
    }

    pub fn id(&self) -> ProviderId  { self.id }
    pub fn name(&self) -> &str      { &self.name }
}


/// Body of `POST /{role}/api/appointments`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewSlot {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
}

/// Body of `PUT /{role}/api/appointments/{id}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub start_time: String,
    pub end_time: String,
    pub title: String,
}
