//! This crate provides the client-side logic of the AppointChed booking service.
//!
//! It provides an HTTP client for the AppointChed JSON endpoints in the [`client`] module, that can be used as a stand-alone module.
//!
//! On top of any [`AppointmentApi`] (the actual client, or the in-memory [`mock`] server used in tests), it provides the controllers an app needs:
//! * a [`SlotStore`](store::SlotStore) that caches the appointment slots of a date range,
//! * a [`BookingFlow`](booking::BookingFlow) that walks a client through requesting a slot,
//! * a [`ScheduleEditor`](schedule::ScheduleEditor) that lets staff members manage their own slots, month by month,
//! * a [`RequestReview`](review::RequestReview) inbox for staff members to approve or reject requests, \
//!   and a [`Poller`](poller::Poller) that keeps notifications up to date.
//!
//! Calendar arithmetic (month grids, day keys, time choices) lives in the [`calendar`] module.

pub mod traits;
pub use traits::AppointmentApi;
pub mod error;
pub use error::Error;

pub mod ids;
pub mod calendar;
pub use calendar::CalendarMonth;
mod slot;
pub use slot::{AppointmentSlot, NewSlot, Provider, SlotKind, SlotUpdate};
mod request;
pub use request::{AppointmentRequest, Decision, NewRequest, RequestStatus};
mod notification;
pub use notification::{unread_count, Notification};

pub mod client;
pub use client::Client;
pub mod store;
pub mod booking;
pub mod schedule;
pub mod review;
pub mod poller;

pub mod config;
pub mod utils;

#[cfg(any(test, feature = "mock_server"))]
pub mod mock;
#[cfg(any(test, feature = "mock_server"))]
pub mod mock_behaviour;
