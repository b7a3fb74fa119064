//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;

use crate::domain::{
    ApiKey, ApiKeyId, ApiKeyStatus, NewUser, Space, SpaceId, SpaceRole, SpaceType, User,
    UserId, UserStatus,
};

use super::schema::{api_keys, space_users, spaces, users};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub unique_name: Option<String>,
    pub nick_name: String,
    pub email: String,
    pub hashed_password: String,
    pub avatar_uri: Option<String>,
    pub user_verified: bool,
    pub country_code: String,
    pub session_key: Option<String>,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let status = UserStatus::parse(&row.status).unwrap_or_else(|| {
            warn!(
                value = %row.status,
                user_id = row.id,
                "unrecognised user status, treating as deleted"
            );
            UserStatus::Deleted
        });
        Self {
            id: UserId::new(row.id),
            unique_name: row.unique_name,
            nick_name: row.nick_name,
            email: row.email,
            hashed_password: row.hashed_password,
            avatar_uri: row.avatar_uri,
            user_verified: row.user_verified,
            country_code: row.country_code,
            session_key: row.session_key,
            description: row.description,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Insertable struct for registering a user.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: i64,
    pub unique_name: Option<&'a str>,
    pub nick_name: &'a str,
    pub email: &'a str,
    pub hashed_password: &'a str,
    pub country_code: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewUserRow<'a> {
    pub fn from_domain(user: &'a NewUser) -> Self {
        Self {
            id: user.id.get(),
            unique_name: user.unique_name.as_deref(),
            nick_name: &user.nick_name,
            email: &user.email,
            hashed_password: &user.hashed_password,
            country_code: "",
            description: "",
            status: UserStatus::Active.as_str(),
            created_at: user.created_at,
            updated_at: user.created_at,
        }
    }
}

/// Profile changeset; `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct ProfileChangeset<'a> {
    pub unique_name: Option<&'a str>,
    pub nick_name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub avatar_uri: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------

/// Row struct for reading from the spaces table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = spaces)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SpaceRow {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub icon_uri: String,
    pub space_type: String,
    pub creator_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SpaceRow> for Space {
    fn from(row: SpaceRow) -> Self {
        let space_type = SpaceType::parse(&row.space_type).unwrap_or_else(|| {
            warn!(
                value = %row.space_type,
                space_id = row.id,
                "unrecognised space type, defaulting to team"
            );
            SpaceType::Team
        });
        Self {
            id: SpaceId::new(row.id),
            owner_id: UserId::new(row.owner_id),
            name: row.name,
            description: row.description,
            icon_uri: row.icon_uri,
            space_type,
            creator_id: UserId::new(row.creator_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Insertable struct for creating spaces.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = spaces)]
pub(crate) struct NewSpaceRow<'a> {
    pub id: i64,
    pub owner_id: i64,
    pub name: &'a str,
    pub description: &'a str,
    pub icon_uri: &'a str,
    pub space_type: &'a str,
    pub creator_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewSpaceRow<'a> {
    pub fn from_domain(space: &'a Space) -> Self {
        Self {
            id: space.id.get(),
            owner_id: space.owner_id.get(),
            name: &space.name,
            description: &space.description,
            icon_uri: &space.icon_uri,
            space_type: space.space_type.as_str(),
            creator_id: space.creator_id.get(),
            created_at: space.created_at,
            updated_at: space.updated_at,
        }
    }
}

/// Insertable membership row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = space_users)]
pub(crate) struct NewSpaceUserRow {
    pub space_id: i64,
    pub user_id: i64,
    pub role: &'static str,
    pub created_at: DateTime<Utc>,
}

impl NewSpaceUserRow {
    /// Owner membership for a freshly created space.
    pub fn owner_of(space: &Space) -> Self {
        Self {
            space_id: space.id.get(),
            user_id: space.owner_id.get(),
            role: SpaceRole::Owner.as_str(),
            created_at: space.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// API keys
// ---------------------------------------------------------------------------

/// Row struct for reading and inserting api keys.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = api_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ApiKeyRow {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub status: String,
    pub user_id: i64,
    pub expire_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_used_at: Option<i64>,
    pub deleted_at: i64,
}

impl From<ApiKeyRow> for ApiKey {
    fn from(row: ApiKeyRow) -> Self {
        let status = ApiKeyStatus::parse(&row.status).unwrap_or_else(|| {
            warn!(
                value = %row.status,
                api_key_id = row.id,
                "unrecognised api key status, treating as deleted"
            );
            ApiKeyStatus::Deleted
        });
        Self {
            id: ApiKeyId::new(row.id),
            key: row.key,
            name: row.name,
            status,
            user_id: UserId::new(row.user_id),
            expire_at: row.expire_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_used_at: row.last_used_at,
            deleted_at: (row.deleted_at != 0).then_some(row.deleted_at),
        }
    }
}

impl From<&ApiKey> for ApiKeyRow {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id.get(),
            key: key.key.clone(),
            name: key.name.clone(),
            status: key.status.as_str().to_owned(),
            user_id: key.user_id.get(),
            expire_at: key.expire_at,
            created_at: key.created_at,
            updated_at: key.updated_at,
            last_used_at: key.last_used_at,
            deleted_at: key.deleted_at.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversions.
    use super::*;
    use rstest::rstest;

    fn key_row(status: &str, deleted_at: i64) -> ApiKeyRow {
        ApiKeyRow {
            id: 3,
            key: "k".to_owned(),
            name: "ci".to_owned(),
            status: status.to_owned(),
            user_id: 7,
            expire_at: 100,
            created_at: 1,
            updated_at: 1,
            last_used_at: None,
            deleted_at,
        }
    }

    #[rstest]
    #[case("normal", 0, ApiKeyStatus::Normal, None)]
    #[case("deleted", 55, ApiKeyStatus::Deleted, Some(55))]
    #[case("bogus", 0, ApiKeyStatus::Deleted, None)]
    fn api_key_rows_map_sentinels(
        #[case] status: &str,
        #[case] deleted_at: i64,
        #[case] expected_status: ApiKeyStatus,
        #[case] expected_deleted: Option<i64>,
    ) {
        let key = ApiKey::from(key_row(status, deleted_at));
        assert_eq!(key.status, expected_status);
        assert_eq!(key.deleted_at, expected_deleted);
        assert_eq!(ApiKeyRow::from(&key).deleted_at, deleted_at);
    }
}
