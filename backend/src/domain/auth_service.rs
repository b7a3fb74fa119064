//! Workspace authorization.
//!
//! [`WorkspaceAuthService`] answers batch permission questions with a coarse
//! ownership model: a caller may act on objects of a space they own.
//! [`WorkspacePermissionProbe`] is the client-side helper other services use
//! to guard single-space operations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{
    AuthObject, AuthResult, AuthService, AuthSubject, MCheckPermissionRequest,
    MCheckPermissionResponse, SpaceRepository, SubjectActionObjects,
    SubjectType,
};
use crate::domain::{COMMON_RPC_ERROR, Error, RequestContext, SpaceId};

/// Action name for reading a space.
pub const ACTION_READ: &str = "read";

/// Authorization service implementing the [`AuthService`] driving port.
#[derive(Clone)]
pub struct WorkspaceAuthService<S> {
    spaces: Arc<S>,
}

impl<S> WorkspaceAuthService<S> {
    /// Create a new service.
    pub fn new(spaces: Arc<S>) -> Self {
        Self { spaces }
    }
}

#[async_trait]
impl<S> AuthService for WorkspaceAuthService<S>
where
    S: SpaceRepository + 'static,
{
    async fn m_check_permission(
        &self,
        ctx: &RequestContext,
        req: &MCheckPermissionRequest,
    ) -> Result<MCheckPermissionResponse, Error> {
        let caller = ctx.require_user_id()?;
        let owns_space = self
            .spaces
            .is_owner(req.space_id, caller)
            .await
            .map_err(Error::from)?;
        let auth_res = req
            .auths
            .iter()
            .map(|auth| AuthResult {
                is_allowed: owns_space
                    && auth
                        .objects
                        .iter()
                        .all(|object| object.owning_space() == Some(req.space_id)),
                subject_action_objects: auth.clone(),
            })
            .collect();
        Ok(MCheckPermissionResponse { auth_res })
    }
}

/// Guards single-space operations through an [`AuthService`].
#[derive(Clone)]
pub struct WorkspacePermissionProbe {
    auth: Arc<dyn AuthService>,
}

impl WorkspacePermissionProbe {
    /// Probe backed by `auth`.
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self { auth }
    }

    /// Succeed only when the caller may perform `action` on `space_id`.
    ///
    /// # Errors
    ///
    /// Returns an unauthorized error without a caller, a no-permission error
    /// when any result is denied, and an RPC error when the authorization
    /// call fails.
    pub async fn check_workspace_permission(
        &self,
        ctx: &RequestContext,
        action: &str,
        space_id: SpaceId,
    ) -> Result<(), Error> {
        let caller = ctx.require_user_id()?;
        let request = MCheckPermissionRequest {
            auths: vec![SubjectActionObjects {
                subject: AuthSubject {
                    subject_type: SubjectType::User,
                    id: caller.to_string(),
                },
                action: action.to_owned(),
                objects: vec![AuthObject::space(space_id)],
            }],
            space_id,
        };
        let response = self
            .auth
            .m_check_permission(ctx, &request)
            .await
            .map_err(|err| Error::wrap_by_code(err, COMMON_RPC_ERROR))?;
        let allowed =
            !response.auth_res.is_empty() && response.auth_res.iter().all(|res| res.is_allowed);
        if allowed {
            Ok(())
        } else {
            debug!(user_id = %caller, space_id = %space_id, action, "workspace permission denied");
            Err(Error::no_permission(""))
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{ENTITY_SPACE, MockSpaceRepository, SpaceRepositoryError};
    use crate::domain::{
        AuthenticatedUser, COMMON_NO_PERMISSION, COMMON_UNAUTHORIZED, LogId, UserId,
    };
    use rstest::rstest;

    fn caller(id: i64) -> RequestContext {
        RequestContext::new(LogId::from("log")).with_user(AuthenticatedUser {
            id: UserId::new(id),
            name: String::new(),
            email: "a@x.io".to_owned(),
            app_id: None,
        })
    }

    fn tuple(objects: Vec<AuthObject>) -> SubjectActionObjects {
        SubjectActionObjects {
            subject: AuthSubject {
                subject_type: SubjectType::User,
                id: "7".to_owned(),
            },
            action: ACTION_READ.to_owned(),
            objects,
        }
    }

    fn prompt_in(space: i64) -> AuthObject {
        AuthObject {
            id: "prompt-1".to_owned(),
            entity_type: "Prompt".to_owned(),
            space_id: Some(space),
        }
    }

    fn owner_repo(owns: bool) -> MockSpaceRepository {
        let mut repo = MockSpaceRepository::new();
        repo.expect_is_owner().returning(move |_, _| Ok(owns));
        repo
    }

    #[rstest]
    #[case::owner_same_space(true, vec![AuthObject::space(SpaceId::new(10)), prompt_in(10)], true)]
    #[case::owner_foreign_object(true, vec![prompt_in(11)], false)]
    #[case::not_owner(false, vec![AuthObject::space(SpaceId::new(10))], false)]
    #[tokio::test]
    async fn tuples_require_ownership_and_matching_space(
        #[case] owns: bool,
        #[case] objects: Vec<AuthObject>,
        #[case] expected: bool,
    ) {
        let service = WorkspaceAuthService::new(Arc::new(owner_repo(owns)));
        let response = service
            .m_check_permission(
                &caller(7),
                &MCheckPermissionRequest {
                    auths: vec![tuple(objects)],
                    space_id: SpaceId::new(10),
                },
            )
            .await
            .expect("check runs");
        assert_eq!(response.auth_res.len(), 1);
        assert_eq!(response.auth_res[0].is_allowed, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn anonymous_callers_are_rejected() {
        let service = WorkspaceAuthService::new(Arc::new(MockSpaceRepository::new()));
        let error = service
            .m_check_permission(
                &RequestContext::new(LogId::from("log")),
                &MCheckPermissionRequest {
                    auths: vec![tuple(vec![AuthObject::space(SpaceId::new(1))])],
                    space_id: SpaceId::new(1),
                },
            )
            .await
            .expect_err("anonymous");
        assert_eq!(error.code(), COMMON_UNAUTHORIZED);
    }

    #[rstest]
    #[tokio::test]
    async fn probe_sends_single_space_object() {
        let mut repo = MockSpaceRepository::new();
        repo.expect_is_owner()
            .withf(|space, user| *space == SpaceId::new(10) && *user == UserId::new(7))
            .return_once(|_, _| Ok(true));
        let probe = WorkspacePermissionProbe::new(Arc::new(WorkspaceAuthService::new(Arc::new(repo))));

        probe
            .check_workspace_permission(&caller(7), ACTION_READ, SpaceId::new(10))
            .await
            .expect("owner allowed");
        assert_eq!(AuthObject::space(SpaceId::new(10)).entity_type, ENTITY_SPACE);
    }

    #[rstest]
    #[tokio::test]
    async fn probe_denies_with_no_permission() {
        let probe =
            WorkspacePermissionProbe::new(Arc::new(WorkspaceAuthService::new(Arc::new(owner_repo(false)))));
        let error = probe
            .check_workspace_permission(&caller(7), ACTION_READ, SpaceId::new(10))
            .await
            .expect_err("denied");
        assert_eq!(error.code(), COMMON_NO_PERMISSION);
    }

    #[rstest]
    #[tokio::test]
    async fn probe_maps_call_failure_to_rpc_error() {
        let mut repo = MockSpaceRepository::new();
        repo.expect_is_owner()
            .return_once(|_, _| Err(SpaceRepositoryError::connection("refused")));
        let probe = WorkspacePermissionProbe::new(Arc::new(WorkspaceAuthService::new(Arc::new(repo))));
        let error = probe
            .check_workspace_permission(&caller(7), ACTION_READ, SpaceId::new(10))
            .await
            .expect_err("transport failure");
        assert_eq!(error.code(), COMMON_RPC_ERROR);
    }
}
