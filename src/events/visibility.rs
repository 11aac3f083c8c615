//! Which events a caller may see in a listing
//!
//! - anonymous callers and plain users see `public` and `private` events
//! - organizers additionally see `draft` events they organize
//! - global admins see everything, including `demo` and `test`
//!
//! Organizer status never unlocks `demo` or `test` events.

use crate::auth::{Caller, EventRole, RoleSet};
use crate::events::{Event, EventVisibility};
use serde::Serialize;
use std::collections::HashSet;

/// An event as returned to a caller, annotated with the caller's role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    #[serde(rename = "userRole")]
    pub user_role: Option<EventRole>,
}

/// The listing rule that applies to one caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingScope<'a> {
    /// Only events listed for everyone
    Everyone,
    /// Listed events plus drafts of these events
    Organizer(HashSet<&'a str>),
    /// No filtering
    Admin,
}

impl<'a> ListingScope<'a> {
    pub fn for_caller(caller: &Caller, roles: &'a RoleSet) -> Self {
        if matches!(caller, Caller::Anonymous) {
            return ListingScope::Everyone;
        }

        let organizer_event_ids = roles.organizer_event_ids();

        if caller.is_global_admin() {
            ListingScope::Admin
        } else if !organizer_event_ids.is_empty() {
            ListingScope::Organizer(organizer_event_ids)
        } else {
            ListingScope::Everyone
        }
    }

    pub fn admits(&self, event: &Event) -> bool {
        match self {
            ListingScope::Admin => true,
            ListingScope::Everyone => event.visibility.is_listed_for_everyone(),
            ListingScope::Organizer(ids) => {
                event.visibility.is_listed_for_everyone()
                    || (event.visibility == EventVisibility::Draft
                        && ids.contains(event.id.as_str()))
            }
        }
    }
}

/// Filter `candidates` down to what `caller` may see, preserving order.
///
/// `roles` must be the caller's own role rows; it is ignored for anonymous
/// callers.
pub fn visible_events(caller: &Caller, roles: &RoleSet, candidates: Vec<Event>) -> Vec<EventView> {
    let scope = ListingScope::for_caller(caller, roles);
    let anonymous = matches!(caller, Caller::Anonymous);

    candidates
        .into_iter()
        .filter(|event| scope.admits(event))
        .map(|event| {
            let user_role = if anonymous { None } else { roles.role_for(&event.id) };
            EventView { event, user_role }
        })
        .collect()
}
