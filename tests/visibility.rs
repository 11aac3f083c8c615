//! Listing rules checked exhaustively over small event sets
//!
//! Every assignment of the five visibilities to three events is combined
//! with every subset of organizer rows, for each kind of caller.

use chrono::{Duration, TimeZone, Utc};
use hackboard::auth::{project_invite_hash, validate_project_invite_hash};
use hackboard::{visible_events, Caller, Event, EventRole, EventView, EventVisibility, RoleSet, Secret};

const EVENT_IDS: [&str; 3] = ["e1", "e2", "e3"];

fn all_event_sets() -> Vec<Vec<Event>> {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let mut sets = Vec::new();

    for a in EventVisibility::ALL {
        for b in EventVisibility::ALL {
            for c in EventVisibility::ALL {
                sets.push(
                    [a, b, c]
                        .into_iter()
                        .zip(EVENT_IDS)
                        .enumerate()
                        .map(|(i, (vis, id))| {
                            Event::new(id, format!("Event {}", id), base + Duration::days(i as i64), vis)
                        })
                        .collect(),
                );
            }
        }
    }

    sets
}

/// Every subset of the event ids, as organizer role sets
fn all_organizer_sets() -> Vec<(Vec<&'static str>, RoleSet)> {
    (0..(1u8 << EVENT_IDS.len()))
        .map(|mask| {
            let ids: Vec<&str> = EVENT_IDS
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, id)| *id)
                .collect();

            let mut roles = RoleSet::new();
            for id in &ids {
                roles.insert(*id, EventRole::Organizer);
            }
            (ids, roles)
        })
        .collect()
}

fn ids(views: &[EventView]) -> Vec<&str> {
    views.iter().map(|v| v.event.id.as_str()).collect()
}

fn listed_for_everyone(events: &[Event]) -> Vec<&str> {
    events
        .iter()
        .filter(|e| matches!(e.visibility, EventVisibility::Public | EventVisibility::Private))
        .map(|e| e.id.as_str())
        .collect()
}

#[test]
fn test_anonymous_sees_exactly_public_and_private() {
    for events in all_event_sets() {
        let expected = listed_for_everyone(&events);
        let views = visible_events(&Caller::Anonymous, &RoleSet::new(), events.clone());

        assert_eq!(ids(&views), expected);
        assert!(views.iter().all(|v| v.user_role.is_none()));
    }
}

#[test]
fn test_plain_user_matches_anonymous() {
    let mut roles = RoleSet::new();
    roles.insert("e1", EventRole::Participant);
    roles.insert("e2", EventRole::Judge);
    roles.insert("e3", EventRole::Mentor);
    let caller = Caller::user("u1", Some("u1@example.com".to_string()), false);

    for events in all_event_sets() {
        let anonymous = visible_events(&Caller::Anonymous, &RoleSet::new(), events.clone());
        let views = visible_events(&caller, &roles, events);

        assert_eq!(ids(&views), ids(&anonymous));
        for view in &views {
            assert_eq!(view.user_role, roles.role_for(&view.event.id));
        }
    }
}

#[test]
fn test_organizer_adds_only_own_drafts() {
    let caller = Caller::user("org", None, false);

    for events in all_event_sets() {
        for (organized, roles) in all_organizer_sets() {
            let views = visible_events(&caller, &roles, events.clone());

            let expected: Vec<&str> = events
                .iter()
                .filter(|e| match e.visibility {
                    EventVisibility::Public | EventVisibility::Private => true,
                    EventVisibility::Draft => organized.contains(&e.id.as_str()),
                    EventVisibility::Demo | EventVisibility::Test => false,
                })
                .map(|e| e.id.as_str())
                .collect();

            assert_eq!(ids(&views), expected, "organizer of {:?}", organized);
            assert!(views.iter().all(|v| !matches!(
                v.event.visibility,
                EventVisibility::Demo | EventVisibility::Test
            )));
        }
    }
}

#[test]
fn test_global_admin_sees_everything() {
    let caller = Caller::user("root", None, true);

    for events in all_event_sets() {
        for (_, roles) in all_organizer_sets() {
            let views = visible_events(&caller, &roles, events.clone());
            let returned: Vec<Event> = views.into_iter().map(|v| v.event).collect();
            assert_eq!(returned, events);
        }
    }
}

#[test]
fn test_order_follows_candidates() {
    let caller = Caller::user("root", None, true);

    for events in all_event_sets() {
        let views = visible_events(&caller, &RoleSet::new(), events);
        assert!(views.windows(2).all(|w| w[0].event.date <= w[1].event.date));
    }
}

fn scenario() -> Vec<Event> {
    let date = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    vec![
        Event::new("1", "Public", date, EventVisibility::Public),
        Event::new("2", "Draft", date, EventVisibility::Draft),
        Event::new("3", "Demo", date, EventVisibility::Demo),
    ]
}

#[test]
fn test_scenario_organizer_of_draft() {
    let mut roles = RoleSet::new();
    roles.insert("2", EventRole::Organizer);
    let caller = Caller::user("u1", None, false);

    let views = visible_events(&caller, &roles, scenario());
    assert_eq!(ids(&views), vec!["1", "2"]);
}

#[test]
fn test_scenario_anonymous() {
    let views = visible_events(&Caller::Anonymous, &RoleSet::new(), scenario());
    assert_eq!(ids(&views), vec!["1"]);
}

#[test]
fn test_project_invite_hash_validates_own_id_only() {
    let secret = Secret::new("invite-secret");

    for i in 0..200 {
        let project_id = format!("project-{}", i);
        let hash = project_invite_hash(&project_id, &secret);

        assert!(validate_project_invite_hash(&project_id, &hash, &secret));
        assert!(!validate_project_invite_hash(&format!("project-{}", i + 1), &hash, &secret));
        assert!(!validate_project_invite_hash(&project_id, "0000000000000000", &secret));
        assert!(!validate_project_invite_hash(&project_id, &hash[..15], &secret));
    }
}
