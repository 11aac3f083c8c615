//! Request callers and the global admin policy

use crate::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Decides which users are global admins, independent of any event
pub trait AdminPolicy: Send + Sync {
    fn is_global_admin(&self, user_id: &str) -> bool;
}

/// Admin policy backed by a fixed set of user ids
#[derive(Debug, Clone, Default)]
pub struct AllowListPolicy {
    ids: HashSet<UserId>,
}

impl AllowListPolicy {
    pub fn new(ids: impl IntoIterator<Item = impl Into<UserId>>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma separated list, ignoring blanks
    pub fn parse(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty()),
        )
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl AdminPolicy for AllowListPolicy {
    fn is_global_admin(&self, user_id: &str) -> bool {
        self.ids.contains(user_id)
    }
}

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: Option<String>,
    pub is_global_admin: bool,
}

/// Who is making a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(Identity),
}

impl Caller {
    pub fn user(user_id: impl Into<UserId>, email: Option<String>, is_global_admin: bool) -> Self {
        Caller::User(Identity {
            user_id: user_id.into(),
            email,
            is_global_admin,
        })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Caller::Anonymous => None,
            Caller::User(identity) => Some(identity),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity().map(|i| i.user_id.as_str())
    }

    pub fn is_global_admin(&self) -> bool {
        self.identity().is_some_and(|i| i.is_global_admin)
    }
}

/// A `user_profiles` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_parse() {
        let policy = AllowListPolicy::parse(" a1, b2 ,,c3 ");
        assert_eq!(policy.len(), 3);
        assert!(policy.is_global_admin("a1"));
        assert!(policy.is_global_admin("b2"));
        assert!(!policy.is_global_admin("d4"));

        assert!(AllowListPolicy::parse("").is_empty());
    }

    #[test]
    fn test_caller_accessors() {
        assert_eq!(Caller::Anonymous.user_id(), None);
        assert!(!Caller::Anonymous.is_global_admin());

        let caller = Caller::user("u1", Some("u1@example.com".to_string()), true);
        assert_eq!(caller.user_id(), Some("u1"));
        assert!(caller.is_global_admin());
    }
}
