//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`IdGenerator`], [`Translator`]) are
//! implemented by outbound adapters. Driving ports (`*Service`) are
//! implemented by domain services and consumed by inbound adapters, usually
//! through a local RPC client.

use serde::{Deserialize, Serialize};

mod macros;
pub(crate) use macros::define_port_error;

mod api_key_repository;
mod api_key_service;
mod auth_service;
mod id_generator;
mod space_repository;
mod space_service;
mod translator;
mod user_repository;
mod user_service;

#[cfg(test)]
pub use api_key_repository::MockApiKeyRepository;
pub use api_key_repository::{ApiKeyRepository, ApiKeyRepositoryError};
pub use api_key_service::{
    ApiKeyByIdRequest, ApiKeyService, CreateApiKeyRequest, CreateApiKeyResponse,
    GetApiKeyResponse, ListApiKeysRequest, ListApiKeysResponse, UpdateApiKeyRequest,
    VerifyTokenRequest, VerifyTokenResponse,
};
pub use auth_service::{
    AuthObject, AuthResult, AuthService, AuthSubject, ENTITY_SPACE, MAX_AUTH_TUPLES,
    MCheckPermissionRequest, MCheckPermissionResponse, SubjectActionObjects, SubjectType,
};
pub use id_generator::IdGenerator;
#[cfg(test)]
pub use space_repository::MockSpaceRepository;
pub use space_repository::{SpaceRepository, SpaceRepositoryError};
pub use space_service::{
    CreateTeamSpaceRequest, GetSpaceRequest, ListUserSpacesRequest, ListUserSpacesResponse,
    SpaceResponse, SpaceService,
};
pub use translator::{NoopTranslator, Translator};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
pub use user_service::{
    GetUserInfoRequest, LoginByPasswordRequest, LogoutRequest, MGET_USERS_MAX,
    MGetUserInfoRequest, MGetUserInfoResponse, ModifyUserProfileRequest, RegisterRequest,
    ResetPasswordRequest, UserInfoResponse, UserService, UserSessionResponse,
};

/// Empty success payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResponse {}

#[cfg(test)]
mod tests;
