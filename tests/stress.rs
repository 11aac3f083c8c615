//! Stress tests for pathological cases
//!
//! These tests verify the listing filter doesn't have accidentally
//! quadratic behavior in the number of events or organizer rows.

use chrono::{Duration, TimeZone, Utc};
use hackboard::{visible_events, Caller, Event, EventRole, EventVisibility, RoleSet};
use std::time::Instant;

fn events(count: usize) -> Vec<Event> {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            Event::new(
                format!("event-{}", i),
                format!("Event {}", i),
                base + Duration::minutes(i as i64),
                EventVisibility::ALL[i % EventVisibility::ALL.len()],
            )
        })
        .collect()
}

/// Organizer of every tenth event
fn organizer_roles(count: usize) -> RoleSet {
    let mut roles = RoleSet::new();
    for i in (0..count).step_by(10) {
        roles.insert(format!("event-{}", i), EventRole::Organizer);
    }
    roles
}

/// Test that filtering doesn't degrade with many events and organizer rows
#[test]
fn test_listing_filter_not_quadratic() {
    let event_counts = [100, 1_000, 10_000, 100_000];
    let caller = Caller::user("organizer", None, false);
    let mut times = vec![];

    for &count in &event_counts {
        let candidates = events(count);
        let roles = organizer_roles(count);

        let iterations = 5;
        let start = Instant::now();

        for _ in 0..iterations {
            let views = visible_events(&caller, &roles, candidates.clone());
            assert!(!views.is_empty());
        }

        let elapsed = start.elapsed();
        let per_event_ns = elapsed.as_nanos() / (iterations * count) as u128;
        times.push((count, elapsed.as_nanos().max(1)));

        println!(
            "Events: {:>6}, Time: {:?}, Per event: {}ns",
            count, elapsed, per_event_ns
        );
    }

    let (small_count, small_time) = times[0];
    let (large_count, large_time) = times[times.len() - 1];

    let count_ratio = large_count as f64 / small_count as f64;
    let time_ratio = large_time as f64 / small_time as f64;

    println!(
        "\nEvent count ratio: {:.0}x, Time ratio: {:.1}x",
        count_ratio, time_ratio
    );

    // Quadratic growth would be ~count_ratio²; allow generous slack for
    // allocation and cache effects.
    assert!(
        time_ratio < count_ratio * 10.0,
        "Listing filter appears to be quadratic! Time grew {:.1}x for {:.0}x more events",
        time_ratio,
        count_ratio
    );
}

/// Duplicate role rows for the same event collapse to the highest priority
#[test]
fn test_role_set_with_many_duplicate_rows() {
    let mut roles = RoleSet::new();

    for i in 0..50_000 {
        let role = EventRole::ALL[(i / 100) % EventRole::ALL.len()];
        roles.insert(format!("event-{}", i % 100), role);
    }

    assert_eq!(roles.len(), 100);
    for i in 0..100 {
        assert_eq!(roles.role_for(&format!("event-{}", i)), Some(EventRole::Admin));
    }
    assert!(roles.organizer_event_ids().is_empty());
}

/// A realistic mix: many events, a handful of organizer rows, every caller kind
#[test]
fn test_realistic_workload() {
    let candidates = events(5_000);
    let mut roles = RoleSet::new();
    roles.insert("event-2", EventRole::Organizer);
    roles.insert("event-7", EventRole::Organizer);
    roles.insert("event-4", EventRole::Judge);

    let start = Instant::now();

    let anonymous = visible_events(&Caller::Anonymous, &RoleSet::new(), candidates.clone());
    let organizer = visible_events(&Caller::user("org", None, false), &roles, candidates.clone());
    let admin = visible_events(&Caller::user("root", None, true), &roles, candidates.clone());

    println!("Three listings over 5000 events took {:?}", start.elapsed());

    // public and private are two of the five visibilities
    assert_eq!(anonymous.len(), 2_000);
    // event-2 and event-7 are drafts
    assert_eq!(organizer.len(), 2_002);
    assert_eq!(admin.len(), 5_000);
}
