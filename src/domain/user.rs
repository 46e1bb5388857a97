//! Users: admins and subscribers.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::content::ContentId;

/// Stable identifier of a user inside the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Role tag of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Subscriber,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Subscriber => write!(f, "subscriber"),
        }
    }
}

/// Role-specific user state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    Admin,
    Subscriber {
        #[serde(default)]
        favorites: BTreeSet<ContentId>,
    },
}

/// A registered user
///
/// `credential` is whatever the registration flow produced (typically a
/// salted hash); this crate never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub credential: String,
    pub name: String,
    pub surname: String,
    #[serde(flatten)]
    pub role: Role,
}

impl User {
    pub fn admin(
        username: impl Into<String>,
        credential: impl Into<String>,
        name: impl Into<String>,
        surname: impl Into<String>,
    ) -> Self {
        Self::with_role(username, credential, name, surname, Role::Admin)
    }

    pub fn subscriber(
        username: impl Into<String>,
        credential: impl Into<String>,
        name: impl Into<String>,
        surname: impl Into<String>,
    ) -> Self {
        Self::with_role(
            username,
            credential,
            name,
            surname,
            Role::Subscriber {
                favorites: BTreeSet::new(),
            },
        )
    }

    fn with_role(
        username: impl Into<String>,
        credential: impl Into<String>,
        name: impl Into<String>,
        surname: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: UserId::new(),
            username: username.into().trim().to_string(),
            credential: credential.into(),
            name: name.into().trim().to_string(),
            surname: surname.into().trim().to_string(),
            role,
        }
    }

    pub fn user_role(&self) -> UserRole {
        match self.role {
            Role::Admin => UserRole::Admin,
            Role::Subscriber { .. } => UserRole::Subscriber,
        }
    }

    /// Favorites of a subscriber, `None` for admins
    pub fn favorites(&self) -> Option<&BTreeSet<ContentId>> {
        match &self.role {
            Role::Subscriber { favorites } => Some(favorites),
            Role::Admin => None,
        }
    }

    pub(crate) fn favorites_mut(&mut self) -> Option<&mut BTreeSet<ContentId>> {
        match &mut self.role {
            Role::Subscriber { favorites } => Some(favorites),
            Role::Admin => None,
        }
    }

    /// Domain equality: username, name and surname (credential excluded)
    pub fn same_account(&self, other: &User) -> bool {
        self.username == other.username && self.name == other.name && self.surname == other.surname
    }

    /// Name, surname and username, one per line
    pub fn public_profile(&self) -> String {
        format!(
            "Name: {}\nSurname: {}\nUsername: {}\n",
            self.name, self.surname, self.username
        )
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.same_account(other)
    }
}

impl Eq for User {}
