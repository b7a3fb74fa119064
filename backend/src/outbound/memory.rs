//! In-process store implementing every repository port.
//!
//! All tables sit behind a single mutex so multi-table writes, such as a
//! user plus its personal space, are atomic. Used when no database URL is
//! configured and by the integration tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::ports::{
    ApiKeyRepository, ApiKeyRepositoryError, SpaceRepository, SpaceRepositoryError,
    UserRepository, UserRepositoryError,
};
use crate::domain::{
    ApiKey, ApiKeyId, ApiKeyStatus, NewUser, ProfileUpdate, Space, SpaceId, SpaceMember,
    SpaceRole, User, UserId, UserStatus,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    spaces: BTreeMap<SpaceId, Space>,
    members: BTreeMap<(SpaceId, UserId), SpaceMember>,
    api_keys: BTreeMap<ApiKeyId, ApiKey>,
}

impl Tables {
    fn live_users(&self) -> impl Iterator<Item = &User> {
        self.users
            .values()
            .filter(|user| user.status == UserStatus::Active)
    }

    fn live_user(&self, id: UserId) -> Option<&User> {
        self.users
            .get(&id)
            .filter(|user| user.status == UserStatus::Active)
    }

    fn live_user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users
            .get_mut(&id)
            .filter(|user| user.status == UserStatus::Active)
    }

    fn live_key(&self, id: ApiKeyId) -> Option<&ApiKey> {
        self.api_keys
            .get(&id)
            .filter(|key| key.status == ApiKeyStatus::Normal)
    }

    fn live_key_mut(&mut self, id: ApiKeyId) -> Option<&mut ApiKey> {
        self.api_keys
            .get_mut(&id)
            .filter(|key| key.status == ApiKeyStatus::Normal)
    }

    fn insert_space_with_owner(&mut self, space: &Space) {
        self.spaces.insert(space.id, space.clone());
        self.members.insert(
            (space.id, space.owner_id),
            SpaceMember {
                space_id: space.id,
                user_id: space.owner_id,
                role: SpaceRole::Owner,
            },
        );
    }
}

fn slice_page<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let total = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let start = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(page.limit()).unwrap_or(0);
    let window = items.iter().skip(start).take(take).cloned().collect();
    Page::new(window, total, page)
}

/// Mutex-guarded tables for users, spaces, memberships and API keys.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `user` to `space` with `role`; existing memberships are replaced.
    pub fn add_member(&self, space: SpaceId, user: UserId, role: SpaceRole) {
        self.lock().members.insert(
            (space, user),
            SpaceMember {
                space_id: space,
                user_id: user,
                role,
            },
        );
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_with_personal_space(
        &self,
        user: &NewUser,
        space: &Space,
    ) -> Result<User, UserRepositoryError> {
        let mut tables = self.lock();
        let email = user.email.to_lowercase();
        if tables.live_users().any(|existing| existing.email == email) {
            return Err(UserRepositoryError::duplicate_email());
        }
        let name_taken = user.unique_name.as_deref().is_some_and(|name| {
            tables
                .live_users()
                .any(|existing| existing.unique_name.as_deref() == Some(name))
        });
        if name_taken {
            return Err(UserRepositoryError::duplicate_unique_name());
        }
        let stored = User {
            id: user.id,
            unique_name: user.unique_name.clone(),
            nick_name: user.nick_name.clone(),
            email,
            hashed_password: user.hashed_password.clone(),
            avatar_uri: None,
            user_verified: false,
            country_code: String::new(),
            session_key: None,
            description: String::new(),
            status: UserStatus::Active,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        tables.users.insert(stored.id, stored.clone());
        tables.insert_space_with_owner(space);
        Ok(stored)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.lock().live_user(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let email = email.to_lowercase();
        Ok(self
            .lock()
            .live_users()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserRepositoryError> {
        let tables = self.lock();
        Ok(tables
            .live_users()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn unique_name_taken(
        &self,
        unique_name: &str,
        except: Option<UserId>,
    ) -> Result<bool, UserRepositoryError> {
        Ok(self.lock().live_users().any(|user| {
            user.unique_name.as_deref() == Some(unique_name) && Some(user.id) != except
        }))
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut tables = self.lock();
        let name_taken = update.unique_name.as_deref().is_some_and(|name| {
            tables
                .live_users()
                .any(|user| user.id != id && user.unique_name.as_deref() == Some(name))
        });
        if name_taken {
            return Err(UserRepositoryError::duplicate_unique_name());
        }
        let Some(user) = tables.live_user_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = &update.unique_name {
            user.unique_name = Some(name.clone());
        }
        if let Some(nick_name) = &update.nick_name {
            user.nick_name.clone_from(nick_name);
        }
        if let Some(description) = &update.description {
            user.description.clone_from(description);
        }
        if let Some(avatar_uri) = &update.avatar_uri {
            user.avatar_uri = Some(avatar_uri.clone());
        }
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    async fn update_session_key(
        &self,
        id: UserId,
        session_key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        if let Some(user) = self.lock().live_user_mut(id) {
            user.session_key = session_key;
            user.updated_at = now;
        }
        Ok(())
    }

    async fn update_password(
        &self,
        id: UserId,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        if let Some(user) = self.lock().live_user_mut(id) {
            hashed_password.clone_into(&mut user.hashed_password);
            user.updated_at = now;
        }
        Ok(())
    }
}

#[async_trait]
impl SpaceRepository for InMemoryStore {
    async fn find_by_id(&self, id: SpaceId) -> Result<Option<Space>, SpaceRepositoryError> {
        Ok(self.lock().spaces.get(&id).cloned())
    }

    async fn list_by_member(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<Space>, SpaceRepositoryError> {
        let tables = self.lock();
        let mut spaces: Vec<Space> = tables
            .members
            .values()
            .filter(|member| member.user_id == user)
            .filter_map(|member| tables.spaces.get(&member.space_id).cloned())
            .collect();
        spaces.sort_by_key(|space| (space.created_at, space.id));
        Ok(slice_page(&spaces, page))
    }

    async fn is_owner(&self, space: SpaceId, user: UserId) -> Result<bool, SpaceRepositoryError> {
        Ok(self
            .lock()
            .members
            .get(&(space, user))
            .is_some_and(|member| member.role == SpaceRole::Owner))
    }

    async fn create_team_space(&self, space: &Space) -> Result<(), SpaceRepositoryError> {
        let mut tables = self.lock();
        if tables.spaces.contains_key(&space.id) {
            return Err(SpaceRepositoryError::query("space already exists"));
        }
        tables.insert_space_with_owner(space);
        Ok(())
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryStore {
    async fn insert(&self, key: &ApiKey) -> Result<(), ApiKeyRepositoryError> {
        let mut tables = self.lock();
        if tables.api_keys.contains_key(&key.id) {
            return Err(ApiKeyRepositoryError::query("api key already exists"));
        }
        tables.api_keys.insert(key.id, key.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ApiKeyId) -> Result<Option<ApiKey>, ApiKeyRepositoryError> {
        Ok(self.lock().live_key(id).cloned())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<ApiKey>, ApiKeyRepositoryError> {
        Ok(self
            .lock()
            .api_keys
            .values()
            .find(|candidate| candidate.status == ApiKeyStatus::Normal && candidate.key == key)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<ApiKey>, ApiKeyRepositoryError> {
        let tables = self.lock();
        let mut keys: Vec<ApiKey> = tables
            .api_keys
            .values()
            .filter(|key| key.user_id == user && key.status == ApiKeyStatus::Normal)
            .cloned()
            .collect();
        keys.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(slice_page(&keys, page))
    }

    async fn rename(&self, id: ApiKeyId, name: &str, now: i64) -> Result<(), ApiKeyRepositoryError> {
        if let Some(key) = self.lock().live_key_mut(id) {
            name.clone_into(&mut key.name);
            key.updated_at = now;
        }
        Ok(())
    }

    async fn soft_delete(&self, id: ApiKeyId, now: i64) -> Result<(), ApiKeyRepositoryError> {
        if let Some(key) = self.lock().live_key_mut(id) {
            key.status = ApiKeyStatus::Deleted;
            key.deleted_at = Some(now);
            key.updated_at = now;
        }
        Ok(())
    }

    async fn touch_last_used(&self, id: ApiKeyId, now_ms: i64) -> Result<(), ApiKeyRepositoryError> {
        let mut tables = self.lock();
        if let Some(key) = tables.api_keys.get_mut(&id) {
            if key.last_used_at.is_none_or(|seen| seen < now_ms) {
                key.last_used_at = Some(now_ms);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Behavioural coverage for the in-memory adapter.
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).single().expect("valid timestamp")
    }

    fn new_user(id: i64, email: &str, unique_name: Option<&str>) -> NewUser {
        NewUser {
            id: UserId::new(id),
            unique_name: unique_name.map(str::to_owned),
            nick_name: "nick".to_owned(),
            email: email.to_owned(),
            hashed_password: "$argon2id$stub".to_owned(),
            created_at: at(1_000),
        }
    }

    fn api_key(id: i64, user: i64, created_at: i64) -> ApiKey {
        ApiKey {
            id: ApiKeyId::new(id),
            key: format!("key-{id}"),
            name: format!("key {id}"),
            status: ApiKeyStatus::Normal,
            user_id: UserId::new(user),
            expire_at: created_at + 100,
            created_at,
            updated_at: created_at,
            last_used_at: None,
            deleted_at: None,
        }
    }

    #[fixture]
    fn store() -> InMemoryStore {
        InMemoryStore::new()
    }

    #[rstest]
    #[tokio::test]
    async fn registration_creates_user_space_and_owner_membership(store: InMemoryStore) {
        let user = new_user(1, "Ann@Example.com", None);
        let space = Space::personal(SpaceId::new(10), user.id, user.created_at);

        let stored = store
            .create_with_personal_space(&user, &space)
            .await
            .expect("created");

        assert_eq!(stored.email, "ann@example.com");
        assert!(store.is_owner(space.id, user.id).await.expect("lookup"));
        let found = UserRepository::find_by_id(&store, user.id)
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(found, stored);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_writes_nothing(store: InMemoryStore) {
        let first = new_user(1, "ann@example.com", None);
        store
            .create_with_personal_space(&first, &Space::personal(SpaceId::new(10), first.id, first.created_at))
            .await
            .expect("created");

        let second = new_user(2, "ANN@example.com", None);
        let space = Space::personal(SpaceId::new(20), second.id, second.created_at);
        let err = store
            .create_with_personal_space(&second, &space)
            .await
            .expect_err("duplicate");

        assert_eq!(err, UserRepositoryError::duplicate_email());
        assert!(
            SpaceRepository::find_by_id(&store, space.id)
                .await
                .expect("lookup")
                .is_none()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unique_name_check_ignores_the_holder(store: InMemoryStore) {
        let user = new_user(1, "ann@example.com", Some("ann"));
        store
            .create_with_personal_space(&user, &Space::personal(SpaceId::new(10), user.id, user.created_at))
            .await
            .expect("created");

        assert!(store.unique_name_taken("ann", None).await.expect("lookup"));
        assert!(!store.unique_name_taken("ann", Some(user.id)).await.expect("lookup"));
    }

    #[rstest]
    #[tokio::test]
    async fn admins_are_members_but_not_owners(store: InMemoryStore) {
        let owner = UserId::new(1);
        let admin = UserId::new(2);
        let space = Space {
            space_type: crate::domain::SpaceType::Team,
            ..Space::personal(SpaceId::new(5), owner, at(0))
        };
        store.create_team_space(&space).await.expect("created");
        store.add_member(space.id, admin, SpaceRole::Admin);

        assert!(!store.is_owner(space.id, admin).await.expect("lookup"));
        let listed = store
            .list_by_member(admin, PageRequest::default())
            .await
            .expect("listed");
        assert_eq!(listed.total, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn keys_list_newest_first_and_hide_revoked(store: InMemoryStore) {
        for (id, created_at) in [(1, 10), (2, 30), (3, 20)] {
            store.insert(&api_key(id, 7, created_at)).await.expect("inserted");
        }
        store.soft_delete(ApiKeyId::new(3), 40).await.expect("revoked");

        let page = store
            .list_by_user(UserId::new(7), PageRequest::default())
            .await
            .expect("listed");

        let ids: Vec<i64> = page.items.iter().map(|key| key.id.get()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(page.total, 2);
        assert!(store.find_by_key("key-3").await.expect("lookup").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn last_used_never_moves_backwards(store: InMemoryStore) {
        let key = api_key(1, 7, 10);
        store.insert(&key).await.expect("inserted");

        store.touch_last_used(key.id, 50).await.expect("touched");
        store.touch_last_used(key.id, 40).await.expect("touched");

        let stored = ApiKeyRepository::find_by_id(&store, key.id)
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(stored.last_used_at, Some(50));
    }
}
