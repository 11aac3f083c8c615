//! Event-scoped roles

use crate::{EventId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

/// Role a user holds within a single event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventRole {
    Participant,
    Mentor,
    Judge,
    Organizer,
    Admin,
}

impl EventRole {
    pub const ALL: [EventRole; 5] = [
        EventRole::Participant,
        EventRole::Mentor,
        EventRole::Judge,
        EventRole::Organizer,
        EventRole::Admin,
    ];

    /// Parse the wire name of a role. Names are matched exactly.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventRole::Participant => "participant",
            EventRole::Mentor => "mentor",
            EventRole::Judge => "judge",
            EventRole::Organizer => "organizer",
            EventRole::Admin => "admin",
        }
    }

    /// Privilege rank used when an invite would replace an existing role
    pub fn priority(&self) -> u8 {
        match self {
            EventRole::Participant => 1,
            EventRole::Mentor => 2,
            EventRole::Judge => 3,
            EventRole::Organizer => 4,
            EventRole::Admin => 5,
        }
    }

    pub fn outranks(&self, other: EventRole) -> bool {
        self.priority() > other.priority()
    }

    /// Roles that can only be self-assigned with the event's role password
    pub fn is_protected(&self) -> bool {
        matches!(self, EventRole::Judge | EventRole::Organizer)
    }

    /// Whether this event-scoped role may manage invites and role passwords
    pub fn can_manage_event(&self) -> bool {
        matches!(self, EventRole::Organizer | EventRole::Admin)
    }
}

impl fmt::Display for EventRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// A `user_event_roles` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEventRole {
    pub user_id: UserId,
    pub event_id: EventId,
    pub role: EventRole,
}

impl UserEventRole {
    pub fn new(user_id: impl Into<UserId>, event_id: impl Into<EventId>, role: EventRole) -> Self {
        Self {
            user_id: user_id.into(),
            event_id: event_id.into(),
            role,
        }
    }
}

/// The roles one caller holds, keyed by event
#[derive(Debug, Clone, Default)]
pub struct RoleSet {
    roles: HashMap<EventId, EventRole>,
}

impl RoleSet {
    pub fn new() -> Self {
        Self {
            roles: HashMap::new(),
        }
    }

    /// Record a role for an event.
    ///
    /// If the event already has a role the higher-priority one is kept, so the
    /// result does not depend on the order rows come back from storage.
    pub fn insert(&mut self, event_id: impl Into<EventId>, role: EventRole) {
        self.roles
            .entry(event_id.into())
            .and_modify(|current| {
                if role.outranks(*current) {
                    *current = role;
                }
            })
            .or_insert(role);
    }

    pub fn role_for(&self, event_id: &str) -> Option<EventRole> {
        self.roles.get(event_id).copied()
    }

    pub fn is_organizer_of(&self, event_id: &str) -> bool {
        self.role_for(event_id) == Some(EventRole::Organizer)
    }

    /// Ids of events where the role is exactly `organizer`
    pub fn organizer_event_ids(&self) -> HashSet<&str> {
        self.roles
            .iter()
            .filter(|(_, role)| **role == EventRole::Organizer)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl FromIterator<UserEventRole> for RoleSet {
    fn from_iter<T: IntoIterator<Item = UserEventRole>>(iter: T) -> Self {
        let mut set = RoleSet::new();
        for row in iter {
            set.insert(row.event_id, row.role);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(EventRole::parse("organizer"), Some(EventRole::Organizer));
        assert_eq!(EventRole::parse("judge"), Some(EventRole::Judge));
        assert_eq!(EventRole::parse("Organizer"), None);
        assert_eq!(EventRole::parse("superuser"), None);
        assert!("mentor".parse::<EventRole>().is_ok());
        assert_eq!(
            "nope".parse::<EventRole>(),
            Err(UnknownRole("nope".to_string()))
        );
    }

    #[test]
    fn test_role_priority_order() {
        assert!(EventRole::Admin.outranks(EventRole::Organizer));
        assert!(EventRole::Organizer.outranks(EventRole::Judge));
        assert!(EventRole::Judge.outranks(EventRole::Mentor));
        assert!(EventRole::Mentor.outranks(EventRole::Participant));
        assert!(!EventRole::Participant.outranks(EventRole::Participant));
    }

    #[test]
    fn test_role_capabilities() {
        assert!(EventRole::Organizer.can_manage_event());
        assert!(EventRole::Admin.can_manage_event());
        assert!(!EventRole::Judge.can_manage_event());

        assert!(EventRole::Judge.is_protected());
        assert!(EventRole::Organizer.is_protected());
        assert!(!EventRole::Admin.is_protected());
        assert!(!EventRole::Participant.is_protected());
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&EventRole::Organizer).unwrap();
        assert_eq!(json, "\"organizer\"");
        let role: EventRole = serde_json::from_str("\"mentor\"").unwrap();
        assert_eq!(role, EventRole::Mentor);
    }

    #[test]
    fn test_role_set_keeps_highest_duplicate() {
        let set: RoleSet = vec![
            UserEventRole::new("u1", "e1", EventRole::Organizer),
            UserEventRole::new("u1", "e1", EventRole::Participant),
            UserEventRole::new("u1", "e2", EventRole::Mentor),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.role_for("e1"), Some(EventRole::Organizer));
        assert_eq!(set.role_for("e2"), Some(EventRole::Mentor));
        assert_eq!(set.role_for("e3"), None);
    }

    #[test]
    fn test_organizer_event_ids() {
        let mut set = RoleSet::new();
        set.insert("e1", EventRole::Organizer);
        set.insert("e2", EventRole::Admin);
        set.insert("e3", EventRole::Judge);

        let ids = set.organizer_event_ids();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("e1"));
        assert!(set.is_organizer_of("e1"));
        assert!(!set.is_organizer_of("e2"));
    }
}
