//! Spaces (workspaces) and their membership.
//!
//! Every user owns exactly one personal space, created in the same
//! transaction as the account. Team spaces are created on demand and list
//! their creator as owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{SpaceId, UserId};
use super::json_numbers::i64_string;

/// Display name given to personal spaces.
pub const PERSONAL_SPACE_NAME: &str = "Personal Space";
/// Longest accepted space name.
pub const SPACE_NAME_MAX: usize = 64;

/// Kind of space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceType {
    Personal,
    Team,
}

/// Role a member holds inside a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceRole {
    Owner,
    Admin,
    Member,
}

macro_rules! storage_enum {
    ($ty:ident { $($variant:ident => $text:literal),* $(,)? }) => {
        impl $ty {
            /// Storage spelling.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }

            /// Parse the storage spelling.
            #[must_use]
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

storage_enum!(SpaceType { Personal => "personal", Team => "team" });
storage_enum!(SpaceRole { Owner => "owner", Admin => "admin", Member => "member" });

/// Persisted space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub id: SpaceId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub icon_uri: String,
    pub space_type: SpaceType,
    pub creator_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Space {
    /// Personal space for a freshly registered user.
    #[must_use]
    pub fn personal(id: SpaceId, owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id: owner,
            name: PERSONAL_SPACE_NAME.to_owned(),
            description: String::new(),
            icon_uri: String::new(),
            space_type: SpaceType::Personal,
            creator_id: owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Client-facing projection.
    #[must_use]
    pub fn info(&self) -> SpaceInfo {
        SpaceInfo {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            icon_url: self.icon_uri.clone(),
            space_type: self.space_type,
            owner_user_id: self.owner_id,
            create_at: self.created_at.timestamp(),
            update_at: self.updated_at.timestamp(),
        }
    }
}

/// Membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceMember {
    pub space_id: SpaceId,
    pub user_id: UserId,
    pub role: SpaceRole,
}

/// Client-facing space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceInfo {
    pub id: SpaceId,
    pub name: String,
    pub description: String,
    pub icon_url: String,
    pub space_type: SpaceType,
    pub owner_user_id: UserId,
    /// Unix seconds.
    #[serde(with = "i64_string")]
    pub create_at: i64,
    /// Unix seconds.
    #[serde(with = "i64_string")]
    pub update_at: i64,
}
