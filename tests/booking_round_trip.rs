//! A staff member opens a slot, a client books it, the staff member decides, and the client gets notified
#![cfg(feature = "integration_tests")]

use std::sync::Arc;

use appointched::booking::{BookingFlow, BookingStep};
use appointched::ids::ProviderId;
use appointched::mock::{Call, MockServer};
use appointched::poller::{poll_once, PollSnapshot, PollTargets};
use appointched::review::RequestReview;
use appointched::schedule::ScheduleEditor;
use appointched::{AppointmentApi, CalendarMonth, Provider, RequestStatus};

const ANA: ProviderId = ProviderId::new(1);

fn server() -> Arc<MockServer> {
    let server = MockServer::new(ANA);
    server.add_provider(Provider::new(ANA, "Ana".into()));
    Arc::new(server)
}

#[tokio::test]
async fn approved_booking() {
    let _ = env_logger::builder().is_test(true).try_init();
    let server = server();

    // Ana opens a slot in March
    let editor = ScheduleEditor::new(server.clone(), ANA, CalendarMonth::new(2025, 2));
    assert!(editor.refresh().await.is_applied());
    editor.create("2025-03-12", "10:00", "10:30", "Check-up").await.unwrap();
    let opened = editor.slots_on("2025-03-12");
    assert_eq!(opened.len(), 1);

    // A client books it
    let flow = BookingFlow::new(server.clone());
    assert_eq!(flow.load_providers().await.unwrap().len(), 1);
    assert!(flow.select_provider(ANA).await.is_applied());
    flow.select_slot(opened[0].id()).unwrap();
    flow.set_client_name("Maria");
    flow.set_message("First visit");
    flow.submit().await.unwrap();
    assert_eq!(flow.state().step, BookingStep::Confirmed);
    assert!(flow.state().selected_slot.is_none());

    // Booked slots are not offered anymore
    assert!(server.staff_schedule(ANA).await.unwrap().is_empty());

    // Ana approves it
    let review = RequestReview::new(server.clone());
    let requests = review.load().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].client_name(), Some("Maria"));
    review.approve(requests[0].id()).await.unwrap();
    assert!(review.state().pending().is_empty());

    // The client sees it on the next poll
    let mut snapshot = PollSnapshot::default();
    poll_once(server.as_ref(), PollTargets::all(), &mut snapshot).await;
    assert_eq!(snapshot.requests.len(), 1);
    assert_eq!(snapshot.requests[0].status(), RequestStatus::Approved);
    assert_eq!(snapshot.unread_notifications(), 2);
}

#[tokio::test]
async fn rejected_slot_can_be_booked_again() {
    let _ = env_logger::builder().is_test(true).try_init();
    let server = server();

    let editor = ScheduleEditor::new(server.clone(), ANA, CalendarMonth::new(2025, 2));
    editor.create("2025-03-14", "14:00", "15:00", "Follow-up").await.unwrap();
    let slot = editor.slots_on("2025-03-14")[0].id();

    let flow = BookingFlow::new(server.clone());
    assert!(flow.select_provider(ANA).await.is_applied());
    flow.select_slot(slot).unwrap();
    flow.submit().await.unwrap();

    // Someone else was quicker
    flow.reset();
    assert!(flow.select_provider(ANA).await.is_applied());
    assert!(flow.state().slots.is_empty());

    let review = RequestReview::new(server.clone());
    let requests = review.load().await.unwrap();
    review.reject(requests[0].id()).await.unwrap();

    assert!(flow.select_provider(ANA).await.is_applied());
    flow.select_slot(slot).unwrap();
    flow.submit().await.unwrap();
    assert_eq!(server.count_calls(|c| matches!(c, Call::CreateRequest(_))), 2);
    assert_eq!(server.requests().len(), 2);
}
