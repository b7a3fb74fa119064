//! Driving port for space use-cases.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::json_numbers::{i64_string, option_i64_string};
use crate::domain::validate::{ValidationError, require_max_chars, require_non_blank};
use crate::domain::{
    DESCRIPTION_MAX, Error, RequestContext, SPACE_NAME_MAX, SpaceId, SpaceInfo, Validate,
};

/// Page of the caller's spaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUserSpacesRequest {
    #[serde(default, with = "option_i64_string")]
    pub page_number: Option<i64>,
    #[serde(default, with = "option_i64_string")]
    pub page_size: Option<i64>,
}

impl Validate for ListUserSpacesRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        pagination::PageRequest::from_parts(self.page_number, self.page_size)
            .map(|_| ())
            .map_err(|err| ValidationError::new(err.to_string()))
    }
}

/// Listed spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUserSpacesResponse {
    pub spaces: Vec<SpaceInfo>,
    #[serde(with = "i64_string")]
    pub total: i64,
}

/// Addresses one space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSpaceRequest {
    pub space_id: SpaceId,
}

impl Validate for GetSpaceRequest {}

/// One space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceResponse {
    pub space: SpaceInfo,
}

/// Team space creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeamSpaceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for CreateTeamSpaceRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)?;
        require_max_chars("name", &self.name, SPACE_NAME_MAX)?;
        if let Some(description) = &self.description {
            require_max_chars("description", description, DESCRIPTION_MAX)?;
        }
        Ok(())
    }
}

/// Domain use-case port for spaces.
#[async_trait]
pub trait SpaceService: Send + Sync {
    /// List spaces the caller belongs to.
    async fn list_user_spaces(
        &self,
        ctx: &RequestContext,
        req: &ListUserSpacesRequest,
    ) -> Result<ListUserSpacesResponse, Error>;

    /// Load one space.
    async fn get_space(
        &self,
        ctx: &RequestContext,
        req: &GetSpaceRequest,
    ) -> Result<SpaceResponse, Error>;

    /// Create a team space owned by the caller.
    async fn create_team_space(
        &self,
        ctx: &RequestContext,
        req: &CreateTeamSpaceRequest,
    ) -> Result<SpaceResponse, Error>;
}
