//! The client's booking flow: pick a provider, pick one of their open slots, send a request
//!
//! ```text
//! Idle -> ProviderSelected -> SlotsLoading -> SlotsLoaded -> SlotSelected -> Submitting -> Confirmed
//!                                                                                       \-> Failed
//! ```
//!
//! Switching providers while their slots are loading is allowed: only the slots of the provider that is
//! selected when a fetch resolves are ever shown.

use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::ids::{ProviderId, SlotId};
use crate::request::NewRequest;
use crate::slot::{AppointmentSlot, Provider};
use crate::store::Fetch;
use crate::traits::AppointmentApi;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingStep {
    Idle,
    ProviderSelected,
    SlotsLoading,
    SlotsLoaded,
    SlotSelected,
    Submitting,
    Confirmed,
    Failed,
}

impl Default for BookingStep {
    fn default() -> Self {
        BookingStep::Idle
    }
}

impl Display for BookingStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BookingStep::Idle => "Choose a staff member",
            BookingStep::ProviderSelected => "Staff member selected",
            BookingStep::SlotsLoading => "Loading available slots...",
            BookingStep::SlotsLoaded => "Choose a slot",
            BookingStep::SlotSelected => "Ready to send your request",
            BookingStep::Submitting => "Sending your request...",
            BookingStep::Confirmed => "Your request has been sent",
            BookingStep::Failed => "Your request could not be sent",
        };
        write!(f, "{}", text)
    }
}

/// Everything a booking view renders
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingState {
    pub step: BookingStep,
    pub providers: Vec<Provider>,
    pub provider: Option<ProviderId>,
    /// Open slots of `provider`
    pub slots: Vec<AppointmentSlot>,
    pub selected_slot: Option<SlotId>,
    pub message: String,
    pub client_name: String,
    pub error: Option<String>,
    generation: u64,
}

impl BookingState {
    pub fn selected(&self) -> Option<&AppointmentSlot> {
        let id = self.selected_slot?;
        self.slots.iter().find(|s| s.id() == id)
    }

    /// Whether the submit button is enabled
    pub fn can_submit(&self) -> bool {
        self.provider.is_some()
            && self.selected_slot.is_some()
            && self.step != BookingStep::Submitting
    }

    fn clear_selection(&mut self) {
        self.provider = None;
        self.slots.clear();
        self.selected_slot = None;
        self.message.clear();
    }
}

/// Identifies a slot fetch, so that its result can be dropped if the selection changed meanwhile
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotTicket {
    provider: ProviderId,
    generation: u64,
}

impl SlotTicket {
    pub fn provider(&self) -> ProviderId { self.provider }
}


pub struct BookingFlow<A: AppointmentApi> {
    api: Arc<A>,
    state: Mutex<BookingState>,
}

impl<A: AppointmentApi> BookingFlow<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api, state: Mutex::new(BookingState::default()) }
    }

    pub fn state(&self) -> BookingState {
        self.state.lock().unwrap().clone()
    }

    pub fn can_submit(&self) -> bool {
        self.state.lock().unwrap().can_submit()
    }

    /// Fetches the staff members the client can book with
    pub async fn load_providers(&self) -> Result<Vec<Provider>, Error> {
        match self.api.providers().await {
            Ok(providers) => {
                let mut state = self.state.lock().unwrap();
                state.providers = providers.clone();
                state.error = None;
                Ok(providers)
            },
            Err(err) => {
                log::warn!("Unable to load providers: {}", err);
                self.state.lock().unwrap().error = Some(err.user_message());
                Err(err)
            },
        }
    }

    /// Selects a provider, without fetching anything yet.
    ///
    /// Slots shown for a previous provider are dropped right away.
    pub fn choose_provider(&self, provider: ProviderId) -> Result<SlotTicket, Error> {
        let mut state = self.state.lock().unwrap();
        if state.step == BookingStep::Submitting {
            return Err(Error::validation("A request is being sent, please wait"));
        }
        state.generation += 1;
        state.provider = Some(provider);
        state.slots.clear();
        state.selected_slot = None;
        state.error = None;
        state.step = BookingStep::ProviderSelected;
        Ok(SlotTicket { provider, generation: state.generation })
    }

    /// Fetches the open slots of the provider a ticket was issued for
    pub async fn load_slots(&self, ticket: SlotTicket) -> Fetch<Vec<AppointmentSlot>> {
        {
            let mut state = self.state.lock().unwrap();
            if state.generation != ticket.generation {
                return Fetch::Superseded;
            }
            state.step = BookingStep::SlotsLoading;
        }

        let result = self.api.staff_schedule(ticket.provider).await;

        let mut state = self.state.lock().unwrap();
        if state.generation != ticket.generation || state.provider != Some(ticket.provider) {
            log::debug!("Discarding slots of provider {}: another provider has been selected since", ticket.provider);
            return Fetch::Superseded;
        }
        match result {
            Ok(slots) => {
                log::debug!("Provider {} has {} open slots", ticket.provider, slots.len());
                state.slots = slots.clone();
                state.error = None;
                state.step = BookingStep::SlotsLoaded;
                Fetch::Applied(slots)
            },
            Err(err) => {
                log::warn!("Unable to load slots of provider {}: {}", ticket.provider, err);
                state.error = Some(err.user_message());
                state.step = BookingStep::ProviderSelected;
                Fetch::Failed(err)
            },
        }
    }

    /// Selects a provider and fetches their open slots
    pub async fn select_provider(&self, provider: ProviderId) -> Fetch<Vec<AppointmentSlot>> {
        match self.choose_provider(provider) {
            Ok(ticket) => self.load_slots(ticket).await,
            Err(err) => Fetch::Failed(err),
        }
    }

    /// Selects one of the loaded slots. Nothing is sent to the server
    pub fn select_slot(&self, slot: SlotId) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if state.step == BookingStep::Submitting {
            return Err(Error::validation("A request is being sent, please wait"));
        }
        if state.slots.iter().any(|s| s.id() == slot) == false {
            return Err(Error::validation(format!("Slot {} is not available", slot)));
        }
        state.selected_slot = Some(slot);
        state.step = BookingStep::SlotSelected;
        Ok(())
    }

    pub fn set_message<S: ToString>(&self, message: S) {
        self.state.lock().unwrap().message = message.to_string();
    }

    pub fn set_client_name<S: ToString>(&self, client_name: S) {
        self.state.lock().unwrap().client_name = client_name.to_string();
    }

    /// Sends the booking request.
    ///
    /// On success every selection is cleared. On failure they are kept, so that the user can try again.
    pub async fn submit(&self) -> Result<(), Error> {
        let payload = {
            let mut state = self.state.lock().unwrap();
            if state.step == BookingStep::Submitting {
                return Err(Error::validation("A request is already being sent"));
            }
            let (provider_id, slot_id) = match (state.provider, state.selected_slot) {
                (Some(provider), Some(slot)) => (provider, slot),
                (None, _) => return Err(Error::validation("Please choose a staff member")),
                (_, None) => return Err(Error::validation("Please choose a slot")),
            };
            state.step = BookingStep::Submitting;
            state.error = None;
            NewRequest {
                provider_id,
                slot_id,
                message: state.message.clone(),
                client_name: state.client_name.clone(),
            }
        };

        let result = self.api.create_request(&payload).await;

        let mut state = self.state.lock().unwrap();
        match result {
            Ok(()) => {
                log::info!("Booking request sent for slot {}", payload.slot_id);
                state.clear_selection();
                state.step = BookingStep::Confirmed;
                Ok(())
            },
            Err(err) => {
                log::warn!("Unable to send booking request for slot {}: {}", payload.slot_id, err);
                state.error = Some(err.user_message());
                state.step = BookingStep::Failed;
                Err(err)
            },
        }
    }

    /// Back to the start, keeping the provider list and the client name
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.generation += 1;
        state.clear_selection();
        state.error = None;
        state.step = BookingStep::Idle;
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::mock::{Call, MockServer};
    use crate::mock_behaviour::MockBehaviour;
    use crate::slot::SlotKind;

    const ANA: ProviderId = ProviderId::new(1);
    const BEN: ProviderId = ProviderId::new(2);

    fn slot(id: u64, owner: ProviderId) -> AppointmentSlot {
        AppointmentSlot::new(SlotId::new(id), "2025-03-10".into(), "09:00".into(), "09:30".into(),
                             "Consultation".into(), owner, SlotKind::StaffDefined)
    }

    fn server() -> Arc<MockServer> {
        let server = MockServer::new(ANA);
        server.add_provider(Provider::new(ANA, "Ana".into()));
        server.add_provider(Provider::new(BEN, "Ben".into()));
        server.add_slot(slot(1, ANA));
        server.add_slot(slot(2, ANA));
        server.add_slot(slot(3, BEN));
        Arc::new(server)
    }

    #[tokio::test]
    async fn happy_path() {
        let _ = env_logger::builder().is_test(true).try_init();
        let server = server();
        let flow = BookingFlow::new(server.clone());
        assert_eq!(flow.state().step, BookingStep::Idle);

        assert_eq!(flow.load_providers().await.unwrap().len(), 2);

        let slots = flow.select_provider(ANA).await;
        assert_eq!(slots, Fetch::Applied(vec![slot(1, ANA), slot(2, ANA)]));
        assert_eq!(flow.state().step, BookingStep::SlotsLoaded);
        assert!(!flow.can_submit());

        flow.select_slot(SlotId::new(2)).unwrap();
        flow.set_message("Renewal of my permit");
        flow.set_client_name("Juan Dela Cruz");
        let state = flow.state();
        assert_eq!(state.step, BookingStep::SlotSelected);
        assert_eq!(state.selected().unwrap().id(), SlotId::new(2));
        assert!(flow.can_submit());

        flow.submit().await.unwrap();
        let state = flow.state();
        assert_eq!(state.step, BookingStep::Confirmed);
        assert_eq!(state.provider, None);
        assert_eq!(state.selected_slot, None);
        assert!(state.slots.is_empty());
        assert!(state.message.is_empty());

        assert!(server.calls().contains(&Call::CreateRequest(NewRequest {
            provider_id: ANA,
            slot_id: SlotId::new(2),
            message: "Renewal of my permit".into(),
            client_name: "Juan Dela Cruz".into(),
        })));

        // The booked slot is no longer offered
        let slots = flow.select_provider(ANA).await;
        assert_eq!(slots, Fetch::Applied(vec![slot(1, ANA)]));
    }

    #[tokio::test]
    async fn last_selected_provider_wins() {
        let server = server();
        server.set_schedule_latency(ANA, Duration::from_millis(100));
        let flow = BookingFlow::new(server.clone());

        let (ana, ben) = tokio::join!(
            flow.select_provider(ANA),
            flow.select_provider(BEN),
        );
        assert!(ana.is_superseded());
        assert_eq!(ben, Fetch::Applied(vec![slot(3, BEN)]));

        let state = flow.state();
        assert_eq!(state.provider, Some(BEN));
        assert_eq!(state.slots, vec![slot(3, BEN)]);
        assert_eq!(state.step, BookingStep::SlotsLoaded);
    }

    #[tokio::test]
    async fn slow_result_for_the_current_provider_is_kept() {
        let server = server();
        server.set_schedule_latency(BEN, Duration::from_millis(50));
        let flow = BookingFlow::new(server.clone());

        let (ana, ben) = tokio::join!(
            flow.select_provider(ANA),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                flow.select_provider(BEN).await
            },
        );
        // Ana's fetch resolved before Ben was selected, then Ben's replaced it
        assert!(ana.is_applied());
        assert!(ben.is_applied());
        assert_eq!(flow.state().slots, vec![slot(3, BEN)]);
    }

    #[tokio::test]
    async fn stale_ticket_is_not_fetched() {
        let server = server();
        let flow = BookingFlow::new(server.clone());

        let old = flow.choose_provider(ANA).unwrap();
        let _new = flow.choose_provider(BEN).unwrap();
        assert_eq!(old.provider(), ANA);
        assert!(flow.load_slots(old).await.is_superseded());
        assert_eq!(server.count_calls(|c| matches!(c, Call::StaffSchedule(_))), 0);
        assert_eq!(flow.state().step, BookingStep::ProviderSelected);
    }

    #[tokio::test]
    async fn submitting_without_a_slot_sends_nothing() {
        let server = server();
        let flow = BookingFlow::new(server.clone());

        let err = flow.submit().await.unwrap_err();
        assert!(err.is_validation());

        flow.select_provider(ANA).await;
        assert!(!flow.can_submit());
        let err = flow.submit().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(flow.state().step, BookingStep::SlotsLoaded);

        assert_eq!(server.count_calls(|c| c.is_mutation()), 0);
    }

    #[tokio::test]
    async fn unknown_slot_cannot_be_selected() {
        let server = server();
        let flow = BookingFlow::new(server.clone());
        flow.select_provider(ANA).await;

        // Slot 3 belongs to Ben
        assert!(flow.select_slot(SlotId::new(3)).unwrap_err().is_validation());
        assert_eq!(flow.state().selected_slot, None);
    }

    #[tokio::test]
    async fn failed_submission_keeps_the_selection() {
        let server = server();
        let flow = BookingFlow::new(server.clone());
        flow.select_provider(ANA).await;
        flow.select_slot(SlotId::new(1)).unwrap();
        flow.set_message("Hello");

        server.set_behaviour(MockBehaviour { create_request_behaviour: (0, 1), ..MockBehaviour::default() });
        let err = flow.submit().await.unwrap_err();
        assert!(err.is_network());

        let state = flow.state();
        assert_eq!(state.step, BookingStep::Failed);
        assert!(state.error.is_some());
        assert_eq!(state.provider, Some(ANA));
        assert_eq!(state.selected_slot, Some(SlotId::new(1)));
        assert_eq!(state.message, "Hello");
        assert!(state.can_submit());

        // Retrying works
        flow.submit().await.unwrap();
        assert_eq!(flow.state().step, BookingStep::Confirmed);
        assert_eq!(server.count_calls(|c| matches!(c, Call::CreateRequest(_))), 2);
    }

    #[tokio::test]
    async fn failed_slot_fetch_keeps_the_provider() {
        let server = server();
        server.set_behaviour(MockBehaviour { staff_schedule_behaviour: (0, 1), ..MockBehaviour::default() });
        let flow = BookingFlow::new(server.clone());

        let fetched = flow.select_provider(BEN).await;
        assert!(fetched.error().is_some());
        let state = flow.state();
        assert_eq!(state.provider, Some(BEN));
        assert_eq!(state.step, BookingStep::ProviderSelected);
        assert!(state.error.is_some());

        flow.reset();
        let state = flow.state();
        assert_eq!(state.step, BookingStep::Idle);
        assert_eq!(state.provider, None);
        assert_eq!(state.error, None);
    }
}
