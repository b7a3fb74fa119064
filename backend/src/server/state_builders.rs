//! Builders wiring repositories into services and services into HTTP state.
//!
//! Every service is bound behind a local RPC client so handler calls and
//! cross-service calls (the permission probe, the identity gates) all run
//! the interceptor chain.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    ApiKeyRepository, ApiKeyService, AuthService, IdGenerator, SpaceRepository, SpaceService,
    UserRepository, UserService,
};
use crate::domain::{
    PasswordHasher, PersonalAccessTokenService, SessionCodec, SpaceQueryService,
    UserAccountService, WorkspaceAuthService, WorkspacePermissionProbe,
};
use crate::inbound::http::state::HttpStatePorts;
use crate::outbound::memory::InMemoryStore;
use crate::outbound::persistence::{
    DbPool, DieselApiKeyRepository, DieselSpaceRepository, DieselUserRepository,
};
use crate::rpc::{LocalApiKeyClient, LocalAuthClient, LocalSpaceClient, LocalUserClient};

/// Repository adapters backing the services.
pub struct Repositories<U, S, K> {
    pub users: Arc<U>,
    pub spaces: Arc<S>,
    pub api_keys: Arc<K>,
}

impl Repositories<InMemoryStore, InMemoryStore, InMemoryStore> {
    /// All three ports served by one in-memory store.
    pub fn in_memory(store: &Arc<InMemoryStore>) -> Self {
        Self {
            users: Arc::clone(store),
            spaces: Arc::clone(store),
            api_keys: Arc::clone(store),
        }
    }
}

impl Repositories<DieselUserRepository, DieselSpaceRepository, DieselApiKeyRepository> {
    /// PostgreSQL adapters sharing `pool`.
    pub fn diesel(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            spaces: Arc::new(DieselSpaceRepository::new(pool.clone())),
            api_keys: Arc::new(DieselApiKeyRepository::new(pool.clone())),
        }
    }
}

/// Collaborators shared by every service.
#[derive(Clone)]
pub struct ServiceDeps {
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub sessions: Arc<SessionCodec>,
    pub hasher: PasswordHasher,
    pub registration_enabled: bool,
}

/// Bind the domain services behind local RPC clients.
pub fn build_ports<U, S, K>(repos: Repositories<U, S, K>, deps: ServiceDeps) -> HttpStatePorts
where
    U: UserRepository + 'static,
    S: SpaceRepository + 'static,
    K: ApiKeyRepository + 'static,
{
    let Repositories {
        users,
        spaces,
        api_keys,
    } = repos;
    let ServiceDeps {
        clock,
        ids,
        sessions,
        hasher,
        registration_enabled,
    } = deps;

    let auth: Arc<dyn AuthService> = Arc::new(LocalAuthClient::standard(Arc::new(
        WorkspaceAuthService::new(Arc::clone(&spaces)),
    )));
    let probe = WorkspacePermissionProbe::new(Arc::clone(&auth));
    let space_service: Arc<dyn SpaceService> =
        Arc::new(LocalSpaceClient::standard(Arc::new(SpaceQueryService::new(
            spaces,
            Arc::clone(&ids),
            Arc::clone(&clock),
            probe,
        ))));
    let user_service: Arc<dyn UserService> = Arc::new(LocalUserClient::standard(Arc::new(
        UserAccountService::new(users, Arc::clone(&ids), sessions, Arc::clone(&clock))
            .with_password_hasher(hasher)
            .with_registration_enabled(registration_enabled),
    )));
    let api_key_service: Arc<dyn ApiKeyService> = Arc::new(LocalApiKeyClient::standard(
        Arc::new(PersonalAccessTokenService::new(api_keys, ids, clock)),
    ));

    HttpStatePorts {
        users: user_service,
        api_keys: api_key_service,
        spaces: space_service,
        auth,
    }
}
