//! Scripted failures of the [`MockServer`](crate::mock::MockServer)
#![cfg(any(test, feature = "mock_server"))]

use crate::error::Error;
use crate::mock::Call;

/// How many times each kind of call succeeds, then fails.
///
/// `(m, n)` lets the first `m` calls through, fails the `n` next ones, and lets every later call through.
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    // Reads
    pub providers_behaviour: (u32, u32),
    pub staff_schedule_behaviour: (u32, u32),
    pub staff_appointments_behaviour: (u32, u32),
    pub my_requests_behaviour: (u32, u32),
    pub requests_to_review_behaviour: (u32, u32),
    pub notifications_behaviour: (u32, u32),

    // Mutations
    pub create_request_behaviour: (u32, u32),
    pub decide_request_behaviour: (u32, u32),
    pub create_slot_behaviour: (u32, u32),
    pub update_slot_behaviour: (u32, u32),
    pub delete_slot_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every kind of call fails `n_fails` times from now on
    pub fn fail_now(n_fails: u32) -> Self {
        let fail = (0, n_fails);
        Self {
            providers_behaviour: fail,
            staff_schedule_behaviour: fail,
            staff_appointments_behaviour: fail,
            my_requests_behaviour: fail,
            requests_to_review_behaviour: fail,
            notifications_behaviour: fail,
            create_request_behaviour: fail,
            decide_request_behaviour: fail,
            create_slot_behaviour: fail,
            update_slot_behaviour: fail,
            delete_slot_behaviour: fail,
        }
    }

    /// Consumes one step of the script of this kind of call
    pub fn allow(&mut self, call: &Call) -> Result<(), Error> {
        let script = match call {
            Call::Providers => &mut self.providers_behaviour,
            Call::StaffSchedule(_) => &mut self.staff_schedule_behaviour,
            Call::StaffAppointments { .. } => &mut self.staff_appointments_behaviour,
            Call::MyRequests => &mut self.my_requests_behaviour,
            Call::RequestsToReview => &mut self.requests_to_review_behaviour,
            Call::Notifications => &mut self.notifications_behaviour,
            Call::CreateRequest(_) => &mut self.create_request_behaviour,
            Call::DecideRequest(..) => &mut self.decide_request_behaviour,
            Call::CreateSlot(_) => &mut self.create_slot_behaviour,
            Call::UpdateSlot(..) => &mut self.update_slot_behaviour,
            Call::DeleteSlot(_) => &mut self.delete_slot_behaviour,
        };

        match script {
            (successes, _) if *successes > 0 => {
                *successes -= 1;
                Ok(())
            },
            (_, failures) if *failures > 0 => {
                *failures -= 1;
                log::debug!("Mock behaviour: failing {:?} ({} more to fail)", call, failures);
                Err(Error::status(503, "Service Unavailable"))
            },
            _ => Ok(()),
        }
    }
}
