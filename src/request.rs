//! Clients' requests to book a slot

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::calendar::Dated;
use crate::error::Error;
use crate::ids::{ClientId, ProviderId, RequestId, SlotId};
use crate::utils::{deserialize_null_string, deserialize_timestamp};

/// Where a request stands. `Approved` and `Rejected` are terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Approved => write!(f, "approved"),
            RequestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// What a staff member decides about a pending request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Path segment of the endpoint that applies this decision
    pub fn as_path(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    pub fn resulting_status(&self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}


/// A client's ask to book a slot, subject to staff approval
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    id: RequestId,
    #[serde(alias = "staff_appointment_id")]
    slot_id: SlotId,
    client_id: ClientId,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    message: String,
    status: RequestStatus,

    #[serde(default)]
    client_name: Option<String>,
    #[serde(default)]
    supervisor_id: Option<ProviderId>,
    /// Date of the requested slot, when the server joins it in
    #[serde(default)]
    date: Option<String>,

    #[serde(default, deserialize_with = "deserialize_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    approved_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    rejected_at: Option<DateTime<Utc>>,
}

impl AppointmentRequest {
    /// Create a brand new pending request
    pub fn new(id: RequestId, slot_id: SlotId, client_id: ClientId, message: String) -> Self {
        Self {
            id, slot_id, client_id, message,
            status: RequestStatus::Pending,
            client_name: None,
            supervisor_id: None,
            date: None,
            created_at: Some(Utc::now()),
            approved_at: None,
            rejected_at: None,
        }
    }

    pub fn with_details(mut self, client_name: Option<String>, supervisor_id: Option<ProviderId>, date: Option<String>) -> Self {
        self.client_name = client_name;
        self.supervisor_id = supervisor_id;
        self.date = date;
        self
    }

    pub fn id(&self) -> RequestId                       { self.id }
    pub fn slot_id(&self) -> SlotId                     { self.slot_id }
    pub fn client_id(&self) -> ClientId                 { self.client_id }
    pub fn message(&self) -> &str                       { &self.message }
    pub fn status(&self) -> RequestStatus               { self.status }
    pub fn client_name(&self) -> Option<&str>           { self.client_name.as_deref() }
    pub fn supervisor_id(&self) -> Option<ProviderId>   { self.supervisor_id }
    pub fn created_at(&self) -> Option<&DateTime<Utc>>  { self.created_at.as_ref() }
    pub fn approved_at(&self) -> Option<&DateTime<Utc>> { self.approved_at.as_ref() }
    pub fn rejected_at(&self) -> Option<&DateTime<Utc>> { self.rejected_at.as_ref() }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Checks that a decision can be taken on this request, without changing it
    pub fn check_decision(&self, decision: Decision) -> Result<(), Error> {
        if self.status.is_terminal() {
            return Err(Error::validation(format!(
                "Request {} is already {} and cannot be {}",
                self.id, self.status, decision.resulting_status())));
        }
        Ok(())
    }

    /// Moves a pending request to its terminal state, stamping the matching timestamp
    pub fn apply_decision(&mut self, decision: Decision, at: DateTime<Utc>) -> Result<(), Error> {
        self.check_decision(decision)?;
        self.status = decision.resulting_status();
        match decision {
            Decision::Approve => self.approved_at = Some(at),
            Decision::Reject => self.rejected_at = Some(at),
        }
        Ok(())
    }
}

impl Dated for AppointmentRequest {
    fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }
}


/// Body of `POST /{role}/api/appointment-requests`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewRequest {
    #[serde(rename = "supervisor_id")]
    pub provider_id: ProviderId,
    #[serde(rename = "staff_appointment_id")]
    pub slot_id: SlotId,
    pub message: String,
    pub client_name: String,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_only_apply_to_pending_requests() {
        let mut request = AppointmentRequest::new(RequestId::new(1), SlotId::new(2), ClientId::new(3), "Passport renewal".into());
        assert!(request.is_pending());

        let now = Utc::now();
        request.apply_decision(Decision::Approve, now).unwrap();
        assert_eq!(request.status(), RequestStatus::Approved);
        assert_eq!(request.approved_at(), Some(&now));
        assert!(request.rejected_at().is_none());

        let err = request.apply_decision(Decision::Reject, Utc::now()).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(request.status(), RequestStatus::Approved);
    }

    #[test]
    fn wire_format() {
        let payload = NewRequest {
            provider_id: ProviderId::new(2),
            slot_id: SlotId::new(9),
            message: "Hello".into(),
            client_name: "Juan Dela Cruz".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({
            "supervisor_id": 2,
            "staff_appointment_id": 9,
            "message": "Hello",
            "client_name": "Juan Dela Cruz",
        }));

        let json = r#"{"id": 1, "staff_appointment_id": 9, "client_id": 5, "message": null,
                       "status": "rejected", "created_at": "2025-03-01 08:00:00",
                       "rejected_at": "2025-03-02T09:00:00Z", "date": "2025-03-10"}"#;
        let request: AppointmentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.slot_id(), SlotId::new(9));
        assert_eq!(request.status(), RequestStatus::Rejected);
        assert!(request.status().is_terminal());
        assert!(request.rejected_at().is_some());
        assert!(request.approved_at().is_none());
        assert!(request.is_on("2025-03-10"));
    }
}
