use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Basic,
    Standard,
    Pro,
    Collaborator,
    Administrator,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Basic,
        Role::Standard,
        Role::Pro,
        Role::Collaborator,
        Role::Administrator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Basic => "BASIC",
            Role::Standard => "STANDARD",
            Role::Pro => "PRO",
            Role::Collaborator => "COLLABORATOR",
            Role::Administrator => "ADMINISTRATOR",
        }
    }

    pub fn has_unlimited_generations(&self) -> bool {
        matches!(self, Role::Pro | Role::Collaborator | Role::Administrator)
    }

    /// Image uploads and media analysis are reserved to the paid tiers.
    pub fn can_attach_media(&self) -> bool {
        matches!(self, Role::Pro | Role::Collaborator | Role::Administrator)
    }

    pub fn can_contribute(&self) -> bool {
        matches!(self, Role::Collaborator | Role::Administrator)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Administrator)
    }

    /// Plans a user may pick for themselves from the pricing screen.
    pub fn is_self_service(&self) -> bool {
        !self.is_admin()
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == value)
            .ok_or(UnknownVariant { kind: "role", value })
    }
}

/// Generations left in the current billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Limited(u32),
    Unlimited,
}

impl Quota {
    pub fn has_remaining(&self) -> bool {
        match self {
            Quota::Limited(n) => *n > 0,
            Quota::Unlimited => true,
        }
    }

    /// NULL in storage means unlimited.
    pub fn as_column(&self) -> Option<i64> {
        match self {
            Quota::Limited(n) => Some(*n as i64),
            Quota::Unlimited => None,
        }
    }
}

impl From<Option<i64>> for Quota {
    fn from(value: Option<i64>) -> Self {
        match value {
            Some(n) => Quota::Limited(n.clamp(0, u32::MAX as i64) as u32),
            None => Quota::Unlimited,
        }
    }
}

impl Serialize for Quota {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Quota::Limited(n) => serializer.serialize_u32(*n),
            Quota::Unlimited => serializer.serialize_str("UNLIMITED"),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[sqlx(try_from = "Option<i64>")]
    pub remaining_generations: Quota,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String, role: Role, quota: Quota) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            role,
            remaining_generations: quota,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
            remaining_generations: self.remaining_generations,
            is_verified: self.is_verified,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub remaining_generations: Quota,
    pub is_verified: bool,
}
