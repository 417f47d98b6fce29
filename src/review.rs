//! Staff members' inbox of booking requests to approve or reject

use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::ids::RequestId;
use crate::request::{AppointmentRequest, Decision};
use crate::traits::AppointmentApi;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReviewState {
    pub requests: Vec<AppointmentRequest>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ReviewState {
    pub fn pending(&self) -> Vec<&AppointmentRequest> {
        self.requests.iter().filter(|r| r.is_pending()).collect()
    }
}

pub struct RequestReview<A: AppointmentApi> {
    api: Arc<A>,
    state: Mutex<ReviewState>,
}

impl<A: AppointmentApi> RequestReview<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api, state: Mutex::new(ReviewState::default()) }
    }

    pub fn state(&self) -> ReviewState {
        self.state.lock().unwrap().clone()
    }

    /// Fetches the requests addressed to the signed-in staff member.
    ///
    /// On failure the previous list is kept.
    pub async fn load(&self) -> Result<Vec<AppointmentRequest>, Error> {
        self.state.lock().unwrap().loading = true;
        let result = self.api.requests_to_review().await;

        let mut state = self.state.lock().unwrap();
        state.loading = false;
        match result {
            Ok(requests) => {
                state.requests = requests.clone();
                state.error = None;
                Ok(requests)
            },
            Err(err) => {
                log::warn!("Unable to load appointment requests: {}", err);
                state.error = Some(err.user_message());
                Err(err)
            },
        }
    }

    pub async fn approve(&self, id: RequestId) -> Result<(), Error> {
        self.decide(id, Decision::Approve).await
    }

    pub async fn reject(&self, id: RequestId) -> Result<(), Error> {
        self.decide(id, Decision::Reject).await
    }

    /// Applies a decision to a pending request, then re-fetches the list
    pub async fn decide(&self, id: RequestId, decision: Decision) -> Result<(), Error> {
        {
            let state = self.state.lock().unwrap();
            if let Some(request) = state.requests.iter().find(|r| r.id() == id) {
                request.check_decision(decision)?;
            }
        }

        if let Err(err) = self.api.decide_request(id, decision).await {
            log::warn!("Unable to {} request {}: {}", decision.as_path(), id, err);
            return Err(err);
        }
        log::info!("Request {} is now {}", id, decision.resulting_status());

        if let Err(err) = self.load().await {
            log::warn!("Unable to refresh the requests after a decision: {}", err);
        }
        Ok(())
    }
}
