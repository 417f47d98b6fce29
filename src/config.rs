//! Support for library configuration options

use std::sync::{Arc, Mutex};
use std::time::Duration;
use once_cell::sync::Lazy;

/// Fixed UTC offset (in seconds) of the office. It is only used to decide which day is "today".
/// Feel free to override it when initing this library.
pub static UTC_OFFSET_SECONDS: Lazy<Arc<Mutex<i32>>> = Lazy::new(|| Arc::new(Mutex::new(8 * 3600)));

/// First hour (inclusive) staff members can schedule appointments at
pub static SCHEDULE_START_HOUR: Lazy<Arc<Mutex<u32>>> = Lazy::new(|| Arc::new(Mutex::new(8)));

/// Last hour staff members can schedule appointments at. `HH:00` of this hour is still a valid choice
pub static SCHEDULE_END_HOUR: Lazy<Arc<Mutex<u32>>> = Lazy::new(|| Arc::new(Mutex::new(17)));

/// How often notifications and "my requests" are refreshed while a view that shows them is open
pub static POLL_INTERVAL: Lazy<Arc<Mutex<Duration>>> = Lazy::new(|| Arc::new(Mutex::new(Duration::from_secs(30))));

/// The `User-Agent` header sent to the server
pub static USER_AGENT: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new(format!("appointched/{}", env!("CARGO_PKG_VERSION")))));


pub fn utc_offset_seconds() -> i32 {
    *UTC_OFFSET_SECONDS.lock().unwrap()
}

/// Returns `(start_hour, end_hour)`
pub fn schedule_hours() -> (u32, u32) {
    (*SCHEDULE_START_HOUR.lock().unwrap(), *SCHEDULE_END_HOUR.lock().unwrap())
}

pub fn poll_interval() -> Duration {
    *POLL_INTERVAL.lock().unwrap()
}

pub fn user_agent() -> String {
    USER_AGENT.lock().unwrap().clone()
}
