use async_trait::async_trait;

use crate::error::Error;
use crate::ids::{ProviderId, RequestId, SlotId};
use crate::notification::Notification;
use crate::request::{AppointmentRequest, Decision, NewRequest};
use crate::slot::{AppointmentSlot, NewSlot, Provider, SlotUpdate};

/// The AppointChed server, as seen by the controllers of this crate.
///
/// Usually this is a [`Client`](crate::client::Client). Tests use an in-memory [`MockServer`](crate::mock::MockServer) instead.
#[async_trait]
pub trait AppointmentApi: Send + Sync {
    /// Staff members clients can book with
    async fn providers(&self) -> Result<Vec<Provider>, Error>;
    /// Open slots of a given staff member
    async fn staff_schedule(&self, provider: ProviderId) -> Result<Vec<AppointmentSlot>, Error>;
    /// Slots whose date is within `from..=to` (both `YYYY-MM-DD`)
    async fn staff_appointments(&self, from: &str, to: &str) -> Result<Vec<AppointmentSlot>, Error>;

    /// Ask to book a slot
    async fn create_request(&self, request: &NewRequest) -> Result<(), Error>;
    /// Requests of the signed-in client
    async fn my_requests(&self) -> Result<Vec<AppointmentRequest>, Error>;
    /// Requests addressed to the signed-in staff member
    async fn requests_to_review(&self) -> Result<Vec<AppointmentRequest>, Error>;
    /// Approve or reject a pending request
    async fn decide_request(&self, id: RequestId, decision: Decision) -> Result<(), Error>;

    async fn create_slot(&self, slot: &NewSlot) -> Result<(), Error>;
    async fn update_slot(&self, id: SlotId, update: &SlotUpdate) -> Result<(), Error>;
    async fn delete_slot(&self, id: SlotId) -> Result<(), Error>;

    async fn notifications(&self) -> Result<Vec<Notification>, Error>;
}
