//! In-memory list of the slots fetched for the displayed date range

use std::sync::{Arc, Mutex};

use crate::calendar::Dated;
use crate::error::Error;
use crate::slot::AppointmentSlot;
use crate::traits::AppointmentApi;

/// The outcome of a fetch whose result may arrive after a newer fetch has been started
#[derive(Clone, Debug, PartialEq)]
pub enum Fetch<T> {
    /// The result was current and has been applied
    Applied(T),
    /// The call failed; the error has been recorded
    Failed(Error),
    /// A newer fetch was started in the meantime, this result has been discarded
    Superseded,
}

impl<T> Fetch<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Fetch::Applied(_))
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Fetch::Superseded)
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Fetch::Failed(err) => Some(err),
            _ => None,
        }
    }
}


/// Returns the records that fall on a `YYYY-MM-DD` day, by exact prefix match on their date
pub fn filter_by_day<T: Dated + Clone>(list: &[T], ymd: &str) -> Vec<T> {
    list.iter()
        .filter(|item| item.is_on(ymd))
        .cloned()
        .collect()
}


/// What a view renders from a [`SlotStore`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoreState {
    /// The `(from, to)` range that was last requested
    pub range: Option<(String, String)>,
    pub slots: Vec<AppointmentSlot>,
    pub loading: bool,
    pub error: Option<String>,
    generation: u64,
}

/// Fetches the slots of a date range.
///
/// Nothing is cached across ranges: every call issues a fresh request and replaces the previous list.
pub struct SlotStore<A: AppointmentApi> {
    api: Arc<A>,
    state: Mutex<StoreState>,
}

impl<A: AppointmentApi> SlotStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api, state: Mutex::new(StoreState::default()) }
    }

    pub fn state(&self) -> StoreState {
        self.state.lock().unwrap().clone()
    }

    pub fn slots(&self) -> Vec<AppointmentSlot> {
        self.state.lock().unwrap().slots.clone()
    }

    /// Slots of the current list that fall on a given day
    pub fn slots_on(&self, ymd: &str) -> Vec<AppointmentSlot> {
        filter_by_day(&self.state.lock().unwrap().slots, ymd)
    }

    /// Replaces the list by the slots dated `from..=to`.
    ///
    /// On failure the list is emptied and the error message is kept in the state. No retry is attempted.
    pub async fn fetch_range(&self, from: &str, to: &str) -> Fetch<Vec<AppointmentSlot>> {
        let generation = {
            let mut state = self.state.lock().unwrap();
            state.generation += 1;
            state.range = Some((from.to_string(), to.to_string()));
            state.loading = true;
            state.generation
        };

        let result = self.api.staff_appointments(from, to).await;

        let mut state = self.state.lock().unwrap();
        if state.generation != generation {
            log::debug!("Discarding slots for {}..{}: a newer range has been requested", from, to);
            return Fetch::Superseded;
        }
        state.loading = false;
        match result {
            Ok(slots) => {
                log::debug!("Fetched {} slots for {}..{}", slots.len(), from, to);
                state.slots = slots.clone();
                state.error = None;
                Fetch::Applied(slots)
            },
            Err(err) => {
                log::warn!("Unable to fetch slots for {}..{}: {}", from, to, err);
                state.slots = Vec::new();
                state.error = Some(err.user_message());
                Fetch::Failed(err)
            },
        }
    }
}
