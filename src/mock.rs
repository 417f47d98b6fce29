//! An in-memory AppointChed server, used to test the controllers without any network
#![cfg(any(test, feature = "mock_server"))]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::Error;
use crate::ids::{ClientId, NotificationId, ProviderId, RequestId, SlotId};
use crate::mock_behaviour::MockBehaviour;
use crate::notification::Notification;
use crate::request::{AppointmentRequest, Decision, NewRequest};
use crate::slot::{AppointmentSlot, NewSlot, Provider, SlotKind, SlotUpdate};
use crate::traits::AppointmentApi;
use crate::utils::day_key;

/// A call received by a [`MockServer`]
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Providers,
    StaffSchedule(ProviderId),
    StaffAppointments { from: String, to: String },
    CreateRequest(NewRequest),
    MyRequests,
    RequestsToReview,
    DecideRequest(RequestId, Decision),
    CreateSlot(NewSlot),
    UpdateSlot(SlotId, SlotUpdate),
    DeleteSlot(SlotId),
    Notifications,
}

impl Call {
    /// Whether this call changes data on the server
    pub fn is_mutation(&self) -> bool {
        matches!(self,
            Call::CreateRequest(_) | Call::DecideRequest(..) |
            Call::CreateSlot(_) | Call::UpdateSlot(..) | Call::DeleteSlot(_))
    }
}

#[derive(Default)]
struct MockData {
    providers: Vec<Provider>,
    slots: Vec<AppointmentSlot>,
    booked: HashSet<SlotId>,
    requests: Vec<AppointmentRequest>,
    notifications: Vec<Notification>,
    calls: Vec<Call>,
    last_id: u64,
}

impl MockData {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn notify(&mut self, title: &str, message: String) {
        let id = NotificationId::new(self.next_id());
        self.notifications.push(Notification::new(id, title.to_string(), message));
    }
}

#[derive(Default)]
struct Latencies {
    schedules: HashMap<ProviderId, Duration>,
    ranges: HashMap<String, Duration>,
}


/// A server that keeps everything in memory.
///
/// It enforces what the actual server enforces (ownership, double booking, terminal request states),
/// records every call it receives, and can be told to fail (see [`MockBehaviour`]) or to answer slowly.
pub struct MockServer {
    /// The staff member requests are made on behalf of
    staff: ProviderId,
    /// The client requests are made on behalf of
    client: ClientId,

    data: Mutex<MockData>,
    behaviour: Mutex<MockBehaviour>,
    latencies: Mutex<Latencies>,
}

impl MockServer {
    /// Create an empty server, where `staff` is the signed-in staff member
    pub fn new(staff: ProviderId) -> Self {
        Self {
            staff,
            client: ClientId::new(1000),
            data: Mutex::new(MockData { last_id: 100, ..MockData::default() }),
            behaviour: Mutex::new(MockBehaviour::default()),
            latencies: Mutex::new(Latencies::default()),
        }
    }

    pub fn signed_in_staff(&self) -> ProviderId { self.staff }
    pub fn signed_in_client(&self) -> ClientId { self.client }

    pub fn add_provider(&self, provider: Provider) {
        self.data.lock().unwrap().providers.push(provider);
    }

    pub fn add_slot(&self, slot: AppointmentSlot) {
        self.data.lock().unwrap().slots.push(slot);
    }

    pub fn add_request(&self, request: AppointmentRequest) {
        let mut data = self.data.lock().unwrap();
        if request.is_pending() || request.status() == crate::request::RequestStatus::Approved {
            data.booked.insert(request.slot_id());
        }
        data.requests.push(request);
    }

    pub fn add_notification(&self, notification: Notification) {
        self.data.lock().unwrap().notifications.push(notification);
    }

    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    /// Delay the answers to `staff_schedule(provider)`
    pub fn set_schedule_latency(&self, provider: ProviderId, latency: Duration) {
        self.latencies.lock().unwrap().schedules.insert(provider, latency);
    }

    /// Delay the answers to `staff_appointments(from, _)`
    pub fn set_range_latency(&self, from: &str, latency: Duration) {
        self.latencies.lock().unwrap().ranges.insert(from.to_string(), latency);
    }

    pub fn slots(&self) -> Vec<AppointmentSlot> {
        self.data.lock().unwrap().slots.clone()
    }

    pub fn requests(&self) -> Vec<AppointmentRequest> {
        self.data.lock().unwrap().requests.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.data.lock().unwrap().notifications.clone()
    }

    /// Every call received so far, oldest first
    pub fn calls(&self) -> Vec<Call> {
        self.data.lock().unwrap().calls.clone()
    }

    pub fn count_calls<F: Fn(&Call) -> bool>(&self, predicate: F) -> usize {
        self.data.lock().unwrap().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Logs a call, then lets the scripted behaviour decide whether it fails
    fn receive(&self, call: Call) -> Result<(), Error> {
        log::debug!("Mock server received {:?}", call);
        let allowed = self.behaviour.lock().unwrap().allow(&call);
        self.data.lock().unwrap().calls.push(call);
        allowed
    }

    fn owned_slot(data: &mut MockData, id: SlotId, staff: ProviderId) -> Result<&mut AppointmentSlot, Error> {
        let slot = data.slots.iter_mut()
            .find(|s| s.id() == id)
            .ok_or_else(|| Error::status(404, format!("Appointment {} not found", id)))?;
        if slot.owner_id() != staff {
            return Err(Error::status(403, "This action is unauthorized."));
        }
        Ok(slot)
    }
}

async fn wait(latency: Option<Duration>) {
    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl AppointmentApi for MockServer {
    async fn providers(&self) -> Result<Vec<Provider>, Error> {
        self.receive(Call::Providers)?;
        Ok(self.data.lock().unwrap().providers.clone())
    }

    async fn staff_schedule(&self, provider: ProviderId) -> Result<Vec<AppointmentSlot>, Error> {
        self.receive(Call::StaffSchedule(provider))?;
        let latency = self.latencies.lock().unwrap().schedules.get(&provider).cloned();
        wait(latency).await;

        let data = self.data.lock().unwrap();
        Ok(data.slots.iter()
            .filter(|s| s.owner_id() == provider && data.booked.contains(&s.id()) == false)
            .cloned()
            .collect())
    }

    async fn staff_appointments(&self, from: &str, to: &str) -> Result<Vec<AppointmentSlot>, Error> {
        self.receive(Call::StaffAppointments { from: from.to_string(), to: to.to_string() })?;
        let latency = self.latencies.lock().unwrap().ranges.get(from).cloned();
        wait(latency).await;

        let data = self.data.lock().unwrap();
        Ok(data.slots.iter()
            .filter(|s| s.owner_id() == self.staff)
            .filter(|s| day_key(s.date()) >= from && day_key(s.date()) <= to)
            .cloned()
            .collect())
    }

    async fn create_request(&self, request: &NewRequest) -> Result<(), Error> {
        self.receive(Call::CreateRequest(request.clone()))?;

        let mut data = self.data.lock().unwrap();
        let slot = data.slots.iter()
            .find(|s| s.id() == request.slot_id)
            .cloned()
            .ok_or_else(|| Error::status(404, format!("Appointment {} not found", request.slot_id)))?;
        if slot.owner_id() != request.provider_id {
            return Err(Error::status(422, "The selected appointment does not belong to this staff member."));
        }
        if data.booked.contains(&slot.id()) {
            return Err(Error::status(422, "This slot has already been booked."));
        }

        let id = RequestId::new(data.next_id());
        let created = AppointmentRequest::new(id, slot.id(), self.client, request.message.clone())
            .with_details(Some(request.client_name.clone()), Some(request.provider_id), Some(slot.date().to_string()));
        data.requests.push(created);
        data.booked.insert(slot.id());
        data.notify("New appointment request", format!("{} asked for {} ({})", request.client_name, slot.day(), slot.time_label()));
        Ok(())
    }

    async fn my_requests(&self) -> Result<Vec<AppointmentRequest>, Error> {
        self.receive(Call::MyRequests)?;
        let data = self.data.lock().unwrap();
        Ok(data.requests.iter()
            .filter(|r| r.client_id() == self.client)
            .cloned()
            .collect())
    }

    async fn requests_to_review(&self) -> Result<Vec<AppointmentRequest>, Error> {
        self.receive(Call::RequestsToReview)?;
        let data = self.data.lock().unwrap();
        Ok(data.requests.iter()
            .filter(|r| r.supervisor_id() == Some(self.staff))
            .cloned()
            .collect())
    }

    async fn decide_request(&self, id: RequestId, decision: Decision) -> Result<(), Error> {
        self.receive(Call::DecideRequest(id, decision))?;

        let mut data = self.data.lock().unwrap();
        let staff = self.staff;
        let request = data.requests.iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Error::status(404, format!("Request {} not found", id)))?;
        if request.supervisor_id() != Some(staff) {
            return Err(Error::status(403, "This action is unauthorized."));
        }
        request.apply_decision(decision, Utc::now())
            .map_err(|err| Error::status(422, err.user_message()))?;

        let slot_id = request.slot_id();
        if decision == Decision::Reject {
            data.booked.remove(&slot_id);
        }
        data.notify("Appointment request update", format!("Your request {} has been {}", id, decision.resulting_status()));
        Ok(())
    }

    async fn create_slot(&self, slot: &NewSlot) -> Result<(), Error> {
        self.receive(Call::CreateSlot(slot.clone()))?;

        let mut data = self.data.lock().unwrap();
        let id = SlotId::new(data.next_id());
        data.slots.push(AppointmentSlot::new(
            id, slot.date.clone(), slot.start_time.clone(), slot.end_time.clone(),
            slot.title.clone(), self.staff, SlotKind::StaffDefined,
        ));
        Ok(())
    }

    async fn update_slot(&self, id: SlotId, update: &SlotUpdate) -> Result<(), Error> {
        self.receive(Call::UpdateSlot(id, update.clone()))?;

        let mut data = self.data.lock().unwrap();
        let slot = Self::owned_slot(&mut data, id, self.staff)?;
        slot.set_times(update.start_time.clone(), update.end_time.clone());
        slot.set_title(update.title.clone());
        Ok(())
    }

    async fn delete_slot(&self, id: SlotId) -> Result<(), Error> {
        self.receive(Call::DeleteSlot(id))?;

        let mut data = self.data.lock().unwrap();
        Self::owned_slot(&mut data, id, self.staff)?;
        data.slots.retain(|s| s.id() != id);
        data.booked.remove(&id);
        Ok(())
    }

    async fn notifications(&self) -> Result<Vec<Notification>, Error> {
        self.receive(Call::Notifications)?;
        Ok(self.data.lock().unwrap().notifications.clone())
    }
}
