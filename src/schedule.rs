//! Staff members' schedule editor
//!
//! Every mutation is a single call followed by a full re-fetch of the displayed month, so that the view only
//! ever shows what the server has confirmed.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::calendar::{self, CalendarMonth, DayCell};
use crate::error::Error;
use crate::ids::{ProviderId, SlotId};
use crate::slot::{AppointmentSlot, NewSlot, SlotUpdate};
use crate::store::{filter_by_day, Fetch, SlotStore, StoreState};
use crate::traits::AppointmentApi;

/// Asks the user to confirm a destructive action, e.g. with a blocking dialog
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// What happened to a removal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// The user did not confirm, nothing has been sent
    Cancelled,
}


/// The start and end hours a slot may be scheduled between, in half-hour steps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl ScheduleHours {
    /// Hours from the library [`config`](crate::config)
    pub fn from_config() -> Self {
        let (start_hour, end_hour) = crate::config::schedule_hours();
        Self { start_hour, end_hour }
    }

    pub fn choices(&self) -> Vec<String> {
        calendar::time_choices(self.start_hour, self.end_hour)
    }
}


pub struct ScheduleEditor<A: AppointmentApi> {
    api: Arc<A>,
    /// The signed-in staff member
    owner: ProviderId,
    hours: ScheduleHours,
    month: Mutex<CalendarMonth>,
    store: SlotStore<A>,
}

impl<A: AppointmentApi> ScheduleEditor<A> {
    pub fn new(api: Arc<A>, owner: ProviderId, month: CalendarMonth) -> Self {
        Self::with_hours(api, owner, month, ScheduleHours::from_config())
    }

    pub fn with_hours(api: Arc<A>, owner: ProviderId, month: CalendarMonth, hours: ScheduleHours) -> Self {
        let store = SlotStore::new(api.clone());
        Self { api, owner, hours, month: Mutex::new(month), store }
    }

    pub fn month(&self) -> CalendarMonth {
        *self.month.lock().unwrap()
    }

    pub fn state(&self) -> StoreState {
        self.store.state()
    }

    /// The `HH:MM` values the start and end dropdowns offer
    pub fn time_choices(&self) -> Vec<String> {
        self.hours.choices()
    }

    /// Slots of the displayed month that fall on a given day
    pub fn slots_on(&self, ymd: &str) -> Vec<AppointmentSlot> {
        filter_by_day(&self.store.slots(), ymd)
    }

    /// The displayed month, with a marker on the days that have slots
    pub fn grid(&self, today: NaiveDate) -> Vec<Vec<Option<DayCell>>> {
        self.month().grid(&self.store.slots(), today)
    }

    /// Displays another month, and fetches its slots
    pub async fn show_month(&self, month: CalendarMonth) -> Fetch<Vec<AppointmentSlot>> {
        *self.month.lock().unwrap() = month;
        self.refresh().await
    }

    pub async fn next_month(&self) -> Fetch<Vec<AppointmentSlot>> {
        let next = self.month().next();
        self.show_month(next).await
    }

    pub async fn previous_month(&self) -> Fetch<Vec<AppointmentSlot>> {
        let previous = self.month().previous();
        self.show_month(previous).await
    }

    /// Re-fetches the slots of the displayed month
    pub async fn refresh(&self) -> Fetch<Vec<AppointmentSlot>> {
        let (from, to) = self.month().range();
        self.store.fetch_range(&from, &to).await
    }

    pub async fn create(&self, date: &str, start_time: &str, end_time: &str, title: &str) -> Result<(), Error> {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(Error::validation(format!("{:?} is not a valid date", date)));
        }
        let (start_time, end_time) = self.check_times(start_time, end_time)?;
        let title = check_title(title)?;

        let slot = NewSlot {
            date: date.to_string(),
            start_time,
            end_time,
            title,
        };
        let result = self.api.create_slot(&slot).await;
        self.after_mutation("create an appointment slot", result).await
    }

    pub async fn update(&self, id: SlotId, start_time: &str, end_time: &str, title: &str) -> Result<(), Error> {
        self.check_ownership(id)?;
        let (start_time, end_time) = self.check_times(start_time, end_time)?;
        let title = check_title(title)?;

        let update = SlotUpdate {
            start_time,
            end_time,
            title,
        };
        let result = self.api.update_slot(id, &update).await;
        self.after_mutation("update the appointment slot", result).await
    }

    /// Deletes a slot once the user confirmed it. Nothing is sent if they did not
    pub async fn remove<C: Confirm + ?Sized>(&self, id: SlotId, confirm: &C) -> Result<Removal, Error> {
        self.check_ownership(id)?;

        let prompt = match self.store.slots().iter().find(|s| s.id() == id) {
            Some(slot) => format!("Delete \"{}\" on {} ({})?", slot.title(), slot.day(), slot.time_label()),
            None => "Delete this appointment slot?".to_string(),
        };
        if confirm.confirm(&prompt) == false {
            log::debug!("Removal of slot {} cancelled by the user", id);
            return Ok(Removal::Cancelled);
        }

        let result = self.api.delete_slot(id).await;
        self.after_mutation("delete the appointment slot", result).await?;
        Ok(Removal::Removed)
    }

    /// A failed mutation is reported as is. A successful one is followed by a re-fetch of the displayed month
    async fn after_mutation(&self, action: &str, result: Result<(), Error>) -> Result<(), Error> {
        if let Err(err) = result {
            log::warn!("Unable to {}: {}", action, err);
            return Err(err);
        }
        log::info!("Managed to {}", action);
        if let Fetch::Failed(err) = self.refresh().await {
            log::warn!("Unable to refresh the schedule after a change: {}", err);
        }
        Ok(())
    }

    /// Times must be among the offered choices, and a slot must end after it starts.
    ///
    /// Returns both times as `HH:MM`.
    fn check_times(&self, start_time: &str, end_time: &str) -> Result<(String, String), Error> {
        let start = self.check_time(start_time)?;
        let end = self.check_time(end_time)?;
        if end <= start {
            return Err(Error::validation("The end time must be after the start time"));
        }
        Ok((start, end))
    }

    /// `HH:MM`, or `HH:MM:00` as the server sends it back
    fn check_time(&self, time: &str) -> Result<String, Error> {
        let short = time.strip_suffix(":00").filter(|t| t.len() == 5).unwrap_or(time);
        if self.hours.choices().iter().any(|c| c == short) == false {
            return Err(Error::validation(format!("{:?} is not one of the available times", time)));
        }
        Ok(short.to_string())
    }

    /// Slots of other staff members cannot be edited. Slots that are not displayed are left to the server to check
    fn check_ownership(&self, id: SlotId) -> Result<(), Error> {
        match self.store.slots().iter().find(|s| s.id() == id) {
            Some(slot) if slot.owner_id() != self.owner => {
                Err(Error::validation("Only the owner of an appointment slot can change it"))
            },
            _ => Ok(()),
        }
    }
}

fn check_title(title: &str) -> Result<String, Error> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::validation("The title is required"));
    }
    Ok(title.to_string())
}
