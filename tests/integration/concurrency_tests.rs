//! Concurrent bookings against one slot never exceed its capacity.

use std::collections::HashSet;

use event_booking::AppError;
use tokio::task::JoinSet;

use super::test_helpers::{booking, harness};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_bookings_respect_capacity() {
    let h = harness().await;
    let mut settings = h.orchestrator.settings().await.expect("settings");
    settings.max_bookings_per_slot = 3;
    h.orchestrator
        .update_settings(settings)
        .await
        .expect("settings update");

    let mut tasks = JoinSet::new();
    for n in 0..10 {
        let orchestrator = h.orchestrator.clone();
        tasks.spawn(async move {
            let request = booking("saturday", "14:00", &format!("guest{n}@example.com"));
            orchestrator.book(&request, &format!("198.51.100.{n}")).await
        });
    }

    let mut accepted = Vec::new();
    let mut full = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.expect("task completes") {
            Ok(report) => accepted.push(report.appointment.id),
            Err(AppError::SlotFull(_)) => full += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(accepted.len(), 3);
    assert_eq!(full, 7);

    let listed: HashSet<String> = h
        .orchestrator
        .list_appointments()
        .await
        .expect("list")
        .into_iter()
        .map(|appointment| appointment.id)
        .collect();
    assert_eq!(listed, accepted.into_iter().collect::<HashSet<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_bookings_on_distinct_slots_all_land_in_the_index() {
    let h = harness().await;
    let times = ["10:00", "10:30", "11:00", "11:30", "12:00", "12:30"];

    let mut tasks = JoinSet::new();
    for (n, time) in times.iter().enumerate() {
        let orchestrator = h.orchestrator.clone();
        let time = (*time).to_owned();
        tasks.spawn(async move {
            let request = booking("sunday", &time, &format!("visitor{n}@example.com"));
            orchestrator.book(&request, "192.0.2.1").await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.expect("task completes").expect("booking accepted");
    }

    let listed = h.orchestrator.list_appointments().await.expect("list");
    assert_eq!(listed.len(), times.len());
    let listed_times: Vec<String> = listed
        .iter()
        .map(|appointment| appointment.time.to_string())
        .collect();
    assert_eq!(listed_times, times);
}
