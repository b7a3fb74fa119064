//! Space query and creation service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::PageRequest;
use tracing::info;

use crate::domain::auth_service::ACTION_READ;
use crate::domain::ports::{
    CreateTeamSpaceRequest, GetSpaceRequest, IdGenerator, ListUserSpacesRequest,
    ListUserSpacesResponse, SpaceRepository, SpaceResponse, SpaceService,
};
use crate::domain::{
    Error, RequestContext, Space, SpaceId, SpaceType, WorkspacePermissionProbe,
};

/// Space service implementing the [`SpaceService`] driving port.
///
/// Reads of a single space are guarded by a [`WorkspacePermissionProbe`].
#[derive(Clone)]
pub struct SpaceQueryService<S> {
    spaces: Arc<S>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    probe: WorkspacePermissionProbe,
}

impl<S> SpaceQueryService<S> {
    /// Create a new service.
    pub fn new(
        spaces: Arc<S>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        probe: WorkspacePermissionProbe,
    ) -> Self {
        Self {
            spaces,
            ids,
            clock,
            probe,
        }
    }
}

#[async_trait]
impl<S> SpaceService for SpaceQueryService<S>
where
    S: SpaceRepository + 'static,
{
    async fn list_user_spaces(
        &self,
        ctx: &RequestContext,
        req: &ListUserSpacesRequest,
    ) -> Result<ListUserSpacesResponse, Error> {
        let user_id = ctx.require_user_id()?;
        let page = PageRequest::from_parts(req.page_number, req.page_size)
            .map_err(|err| Error::invalid_param(err.to_string()))?;
        let page = self
            .spaces
            .list_by_member(user_id, page)
            .await
            .map_err(Error::from)?;
        Ok(ListUserSpacesResponse {
            total: page.total,
            spaces: page.items.iter().map(Space::info).collect(),
        })
    }

    async fn get_space(
        &self,
        ctx: &RequestContext,
        req: &GetSpaceRequest,
    ) -> Result<SpaceResponse, Error> {
        self.probe
            .check_workspace_permission(ctx, ACTION_READ, req.space_id)
            .await?;
        let space = self
            .spaces
            .find_by_id(req.space_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("space {}", req.space_id)))?;
        Ok(SpaceResponse {
            space: space.info(),
        })
    }

    async fn create_team_space(
        &self,
        ctx: &RequestContext,
        req: &CreateTeamSpaceRequest,
    ) -> Result<SpaceResponse, Error> {
        let owner = ctx.require_user_id()?;
        let now = self.clock.utc();
        let space = Space {
            id: SpaceId::new(self.ids.next_id()),
            owner_id: owner,
            name: req.name.trim().to_owned(),
            description: req.description.clone().unwrap_or_default(),
            icon_uri: String::new(),
            space_type: SpaceType::Team,
            creator_id: owner,
            created_at: now,
            updated_at: now,
        };
        self.spaces
            .create_team_space(&space)
            .await
            .map_err(Error::from)?;
        info!(space_id = %space.id, user_id = %owner, "created team space");
        Ok(SpaceResponse {
            space: space.info(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::MockSpaceRepository;
    use crate::domain::{
        AuthenticatedUser, COMMON_NO_PERMISSION, LogId, UserId, WorkspaceAuthService,
    };
    use crate::test_support::{MutableClock, SequenceIds};
    use chrono::{TimeZone, Utc};
    use pagination::Page;
    use rstest::rstest;

    fn caller(id: i64) -> RequestContext {
        RequestContext::new(LogId::from("log")).with_user(AuthenticatedUser {
            id: UserId::new(id),
            name: String::new(),
            email: "a@x.io".to_owned(),
            app_id: None,
        })
    }

    fn clock() -> Arc<MutableClock> {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        Arc::new(MutableClock::new(start))
    }

    fn service(repo: MockSpaceRepository) -> SpaceQueryService<MockSpaceRepository> {
        let repo = Arc::new(repo);
        let probe =
            WorkspacePermissionProbe::new(Arc::new(WorkspaceAuthService::new(repo.clone())));
        SpaceQueryService::new(repo, Arc::new(SequenceIds::starting_at(500)), clock(), probe)
    }

    #[rstest]
    #[tokio::test]
    async fn get_space_checks_permission_first() {
        let mut repo = MockSpaceRepository::new();
        repo.expect_is_owner().return_once(|_, _| Ok(false));
        repo.expect_find_by_id().never();

        let error = service(repo)
            .get_space(
                &caller(7),
                &GetSpaceRequest {
                    space_id: SpaceId::new(10),
                },
            )
            .await
            .expect_err("denied");
        assert_eq!(error.code(), COMMON_NO_PERMISSION);
    }

    #[rstest]
    #[tokio::test]
    async fn owner_reads_space() {
        let mut repo = MockSpaceRepository::new();
        repo.expect_is_owner().return_once(|_, _| Ok(true));
        repo.expect_find_by_id().return_once(|id| {
            Ok(Some(Space::personal(id, UserId::new(7), clock().utc())))
        });

        let response = service(repo)
            .get_space(
                &caller(7),
                &GetSpaceRequest {
                    space_id: SpaceId::new(10),
                },
            )
            .await
            .expect("allowed");
        assert_eq!(response.space.id, SpaceId::new(10));
        assert_eq!(response.space.space_type, SpaceType::Personal);
    }

    #[rstest]
    #[tokio::test]
    async fn team_space_is_owned_by_caller() {
        let mut repo = MockSpaceRepository::new();
        repo.expect_create_team_space()
            .withf(|space| {
                space.owner_id == UserId::new(7)
                    && space.creator_id == UserId::new(7)
                    && space.space_type == SpaceType::Team
                    && space.name == "Research"
            })
            .times(1)
            .return_once(|_| Ok(()));

        let response = service(repo)
            .create_team_space(
                &caller(7),
                &CreateTeamSpaceRequest {
                    name: " Research ".to_owned(),
                    description: None,
                },
            )
            .await
            .expect("created");
        assert_eq!(response.space.id, SpaceId::new(500));
    }

    #[rstest]
    #[tokio::test]
    async fn list_passes_requested_page() {
        let mut repo = MockSpaceRepository::new();
        repo.expect_list_by_member()
            .withf(|_, page| page.page_number() == 2 && page.page_size() == 5)
            .return_once(|_, page| Ok(Page::new(Vec::new(), 6, page)));

        let response = service(repo)
            .list_user_spaces(
                &caller(7),
                &ListUserSpacesRequest {
                    page_number: Some(2),
                    page_size: Some(5),
                },
            )
            .await
            .expect("listed");
        assert_eq!(response.total, 6);
        assert!(response.spaces.is_empty());
    }
}
