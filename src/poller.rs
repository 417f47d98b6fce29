//! Periodic refresh of notifications and of the client's requests
//!
//! Polling lasts as long as the [`PollHandle`] it returns: drop it (e.g. when the view that shows the data is
//! closed) and the background task is stopped.

use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::notification::{unread_count, Notification};
use crate::request::AppointmentRequest;
use crate::traits::AppointmentApi;

bitflags! {
    /// What a poller refreshes
    pub struct PollTargets: u8 {
        /// `my-appointment-requests`
        const MY_REQUESTS = 1;
        /// `notifications`
        const NOTIFICATIONS = 2;
    }
}

impl Default for PollTargets {
    fn default() -> Self {
        PollTargets::all()
    }
}


/// The latest data a poller has seen
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PollSnapshot {
    pub requests: Vec<AppointmentRequest>,
    pub notifications: Vec<Notification>,
    /// Message of the last failed poll, cleared by the next successful one
    pub error: Option<String>,
    /// How many polls have completed (successful or not)
    pub polls: u64,
    pub last_success: Option<DateTime<Utc>>,
}

impl PollSnapshot {
    pub fn unread_notifications(&self) -> usize {
        unread_count(&self.notifications)
    }
}

/// See [`Poller::spawn`]
pub type SnapshotReceiver = watch::Receiver<PollSnapshot>;


/// Stops the polling task when dropped
pub struct PollHandle {
    task: JoinHandle<()>,
    receiver: SnapshotReceiver,
}

impl PollHandle {
    /// The latest snapshot
    pub fn snapshot(&self) -> PollSnapshot {
        self.receiver.borrow().clone()
    }

    /// A receiver that is notified after every poll
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.receiver.clone()
    }

    pub fn stop(self) {
        // Dropping does it
    }

    pub fn is_running(&self) -> bool {
        self.task.is_finished() == false
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        log::debug!("Stopping poller");
        self.task.abort();
    }
}


pub struct Poller;

impl Poller {
    /// Starts polling with the configured interval (see [`config::POLL_INTERVAL`](crate::config::POLL_INTERVAL))
    pub fn spawn_default<A: AppointmentApi + 'static>(api: Arc<A>, targets: PollTargets) -> PollHandle {
        Self::spawn(api, targets, crate::config::poll_interval())
    }

    /// Polls `targets` right away, then every `interval`, in a background task.
    ///
    /// This must be called from within a tokio runtime. A failed poll keeps the previous data; there is no retry
    /// other than the next tick.
    pub fn spawn<A: AppointmentApi + 'static>(api: Arc<A>, targets: PollTargets, interval: Duration) -> PollHandle {
        let (sender, receiver) = watch::channel(PollSnapshot::default());

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let mut snapshot = sender.borrow().clone();
                poll_once(api.as_ref(), targets, &mut snapshot).await;
                if sender.send(snapshot).is_err() {
                    log::debug!("Nobody listens to the poller anymore");
                    break;
                }
            }
        });

        PollHandle { task, receiver }
    }
}

/// Refreshes `snapshot` in place. Data of a failed call is left untouched
pub async fn poll_once<A: AppointmentApi + ?Sized>(api: &A, targets: PollTargets, snapshot: &mut PollSnapshot) {
    let mut errors = Vec::new();

    if targets.contains(PollTargets::MY_REQUESTS) {
        match api.my_requests().await {
            Ok(requests) => snapshot.requests = requests,
            Err(err) => errors.push(err.user_message()),
        }
    }
    if targets.contains(PollTargets::NOTIFICATIONS) {
        match api.notifications().await {
            Ok(notifications) => snapshot.notifications = notifications,
            Err(err) => errors.push(err.user_message()),
        }
    }

    snapshot.polls += 1;
    if errors.is_empty() {
        snapshot.error = None;
        snapshot.last_success = Some(Utc::now());
    } else {
        let message = errors.join("; ");
        log::warn!("Poll failed: {}", message);
        snapshot.error = Some(message);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::ids::{ClientId, NotificationId, ProviderId, RequestId, SlotId};
    use crate::mock::{Call, MockServer};
    use crate::mock_behaviour::MockBehaviour;

    fn server() -> Arc<MockServer> {
        let server = MockServer::new(ProviderId::new(1));
        let client = server.signed_in_client();
        server.add_request(AppointmentRequest::new(RequestId::new(1), SlotId::new(1), client, "Hi".into()));
        server.add_request(AppointmentRequest::new(RequestId::new(2), SlotId::new(2), ClientId::new(999), "Not mine".into()));
        server.add_notification(Notification::new(NotificationId::new(1), "Welcome".into(), "Hello".into()));
        Arc::new(server)
    }

    #[tokio::test]
    async fn failed_poll_keeps_previous_data() {
        let server = server();
        let mut snapshot = PollSnapshot::default();

        poll_once(server.as_ref(), PollTargets::all(), &mut snapshot).await;
        assert_eq!(snapshot.requests.len(), 1);
        assert_eq!(snapshot.unread_notifications(), 1);
        assert!(snapshot.error.is_none());
        let first_success = snapshot.last_success;
        assert!(first_success.is_some());

        server.set_behaviour(MockBehaviour { notifications_behaviour: (0, 1), ..MockBehaviour::default() });
        server.add_notification(Notification::new(NotificationId::new(2), "Update".into(), "Approved".into()));
        poll_once(server.as_ref(), PollTargets::all(), &mut snapshot).await;
        assert_eq!(snapshot.polls, 2);
        assert_eq!(snapshot.notifications.len(), 1);
        assert_eq!(snapshot.requests.len(), 1);
        assert!(snapshot.error.is_some());
        assert_eq!(snapshot.last_success, first_success);

        poll_once(server.as_ref(), PollTargets::NOTIFICATIONS, &mut snapshot).await;
        assert_eq!(snapshot.notifications.len(), 2);
        assert!(snapshot.error.is_none());
        assert_eq!(server.count_calls(|c| matches!(c, Call::MyRequests)), 2);
    }

    #[tokio::test]
    async fn polls_until_the_handle_is_dropped() {
        let _ = env_logger::builder().is_test(true).try_init();
        let server = server();

        let handle = Poller::spawn(server.clone(), PollTargets::all(), Duration::from_millis(20));
        let mut receiver = handle.subscribe();
        receiver.changed().await.unwrap();
        receiver.changed().await.unwrap();
        assert!(handle.snapshot().polls >= 2);
        assert_eq!(handle.snapshot().requests.len(), 1);
        assert!(handle.is_running());

        handle.stop();
        // Let the aborted task wind down
        tokio::time::sleep(Duration::from_millis(30)).await;
        let polled = server.count_calls(|c| matches!(c, Call::Notifications));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(server.count_calls(|c| matches!(c, Call::Notifications)), polled);
    }
}
