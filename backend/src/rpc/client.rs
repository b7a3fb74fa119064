//! Local clients exposing a service implementation as its own port.
//!
//! A client owns an `Arc` of the handler, so only shared, heap-allocated
//! handlers can be bound. Each port method runs the interceptor chain and
//! then dispatches directly to the handler with the context the chain
//! produced.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{
    ApiKeyByIdRequest, ApiKeyService, AuthService, CreateApiKeyRequest, CreateApiKeyResponse,
    CreateTeamSpaceRequest, EmptyResponse, GetApiKeyResponse, GetSpaceRequest,
    GetUserInfoRequest, ListApiKeysRequest, ListApiKeysResponse, ListUserSpacesRequest,
    ListUserSpacesResponse, LoginByPasswordRequest, LogoutRequest, MCheckPermissionRequest,
    MCheckPermissionResponse, MGetUserInfoRequest, MGetUserInfoResponse,
    ModifyUserProfileRequest, RegisterRequest, ResetPasswordRequest, SpaceResponse,
    SpaceService, UpdateApiKeyRequest, UserInfoResponse, UserService, UserSessionResponse,
    VerifyTokenRequest, VerifyTokenResponse,
};
use crate::domain::{Error, RequestContext};

use super::chain::{InterceptorChain, MethodInfo};

macro_rules! local_client {
    (
        $(#[$meta:meta])*
        $client:ident => $port:ident as $service:literal {
            $( $method:ident($req:ty) -> $resp:ty as $wire:literal; )*
        }
    ) => {
        $(#[$meta])*
        pub struct $client<H: ?Sized> {
            handler: Arc<H>,
            chain: InterceptorChain,
        }

        impl<H: ?Sized> Clone for $client<H> {
            fn clone(&self) -> Self {
                Self {
                    handler: Arc::clone(&self.handler),
                    chain: self.chain.clone(),
                }
            }
        }

        impl<H: ?Sized> $client<H> {
            /// Bind `handler` behind `chain`.
            pub fn new(handler: Arc<H>, chain: InterceptorChain) -> Self {
                Self { handler, chain }
            }

            /// Bind `handler` behind the standard chain.
            pub fn standard(handler: Arc<H>) -> Self {
                Self::new(handler, InterceptorChain::standard())
            }
        }

        #[async_trait]
        impl<H> $port for $client<H>
        where
            H: $port + ?Sized + 'static,
        {
            $(
                async fn $method(
                    &self,
                    ctx: &RequestContext,
                    req: &$req,
                ) -> Result<$resp, Error> {
                    let handler = &*self.handler;
                    self.chain
                        .invoke(
                            ctx,
                            MethodInfo::new($service, $wire),
                            req,
                            move |ctx| async move { handler.$method(&ctx, req).await },
                        )
                        .await
                }
            )*
        }
    };
}

local_client! {
    /// [`UserService`] client bound to a local handler.
    LocalUserClient => UserService as "UserService" {
        register(RegisterRequest) -> UserSessionResponse as "Register";
        login_by_password(LoginByPasswordRequest) -> UserSessionResponse as "LoginByPassword";
        logout(LogoutRequest) -> EmptyResponse as "Logout";
        reset_password(ResetPasswordRequest) -> EmptyResponse as "ResetPassword";
        get_user_info(GetUserInfoRequest) -> UserInfoResponse as "GetUserInfo";
        mget_user_info(MGetUserInfoRequest) -> MGetUserInfoResponse as "MGetUserInfo";
        modify_user_profile(ModifyUserProfileRequest) -> UserInfoResponse as "ModifyUserProfile";
    }
}

local_client! {
    /// [`ApiKeyService`] client bound to a local handler.
    LocalApiKeyClient => ApiKeyService as "ApiKeyService" {
        create_api_key(CreateApiKeyRequest) -> CreateApiKeyResponse as "CreatePersonalAccessToken";
        list_api_keys(ListApiKeysRequest) -> ListApiKeysResponse as "ListPersonalAccessTokens";
        get_api_key(ApiKeyByIdRequest) -> GetApiKeyResponse as "GetPersonalAccessToken";
        update_api_key(UpdateApiKeyRequest) -> EmptyResponse as "UpdatePersonalAccessToken";
        delete_api_key(ApiKeyByIdRequest) -> EmptyResponse as "DeletePersonalAccessToken";
        verify_token(VerifyTokenRequest) -> VerifyTokenResponse as "VerifyToken";
    }
}

local_client! {
    /// [`SpaceService`] client bound to a local handler.
    LocalSpaceClient => SpaceService as "SpaceService" {
        list_user_spaces(ListUserSpacesRequest) -> ListUserSpacesResponse as "ListUserSpaces";
        get_space(GetSpaceRequest) -> SpaceResponse as "GetSpace";
        create_team_space(CreateTeamSpaceRequest) -> SpaceResponse as "CreateTeamSpace";
    }
}

local_client! {
    /// [`AuthService`] client bound to a local handler.
    LocalAuthClient => AuthService as "AuthService" {
        m_check_permission(MCheckPermissionRequest) -> MCheckPermissionResponse as "MCheckPermission";
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{AuthObject, AuthResult, AuthSubject, SubjectActionObjects, SubjectType};
    use crate::domain::{
        AuthenticatedUser, CacheKey, COMMON_INVALID_PARAM, LogId, Locale, SpaceId, UserId,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MARK: CacheKey<u8> = CacheKey::new("mark");

    #[derive(Default)]
    struct EchoAuth {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuthService for EchoAuth {
        async fn m_check_permission(
            &self,
            ctx: &RequestContext,
            req: &MCheckPermissionRequest,
        ) -> Result<MCheckPermissionResponse, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ctx.cache_store(&MARK, 1);
            let allowed = ctx.locale().as_str() == "zh-CN" && ctx.user().is_some();
            Ok(MCheckPermissionResponse {
                auth_res: req
                    .auths
                    .iter()
                    .map(|auth| AuthResult {
                        subject_action_objects: auth.clone(),
                        is_allowed: allowed,
                    })
                    .collect(),
            })
        }
    }

    fn request(auths: usize) -> MCheckPermissionRequest {
        let tuple = SubjectActionObjects {
            subject: AuthSubject {
                subject_type: SubjectType::User,
                id: "7".to_owned(),
            },
            action: "read".to_owned(),
            objects: vec![AuthObject::space(SpaceId::new(1))],
        };
        MCheckPermissionRequest {
            auths: vec![tuple; auths],
            space_id: SpaceId::new(1),
        }
    }

    #[tokio::test]
    async fn client_preserves_caller_context() {
        let handler = Arc::new(EchoAuth::default());
        let client = LocalAuthClient::standard(handler.clone());
        let mut ctx = RequestContext::new(LogId::from("log"))
            .with_locale(Locale::resolve(Some("zh-CN")))
            .with_user(AuthenticatedUser {
                id: UserId::new(7),
                name: String::new(),
                email: "a@x.io".to_owned(),
                app_id: None,
            });
        ctx.ensure_cache();

        let response = client
            .m_check_permission(&ctx, &request(1))
            .await
            .expect("call succeeds");
        assert!(response.auth_res[0].is_allowed);
        assert_eq!(ctx.cache_get(&MARK).as_deref(), Some(&1));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn client_validates_before_dispatch() {
        let handler = Arc::new(EchoAuth::default());
        let client = LocalAuthClient::standard(handler.clone());
        let error = client
            .m_check_permission(&RequestContext::new(LogId::from("log")), &request(0))
            .await
            .expect_err("empty auths rejected");
        assert_eq!(error.code(), COMMON_INVALID_PARAM);
        assert!(error.message().contains("AuthService.MCheckPermission"));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clients_bind_trait_objects() {
        let handler: Arc<dyn AuthService> = Arc::new(EchoAuth::default());
        let client = LocalAuthClient::standard(handler);
        let nested: Arc<dyn AuthService> = Arc::new(client);
        let response = nested
            .m_check_permission(&RequestContext::new(LogId::from("log")), &request(2))
            .await
            .expect("call succeeds");
        assert_eq!(response.auth_res.len(), 2);
    }
}
