//! Driving port for workspace authorization.
//!
//! A request lists `(subject, action, objects)` tuples evaluated against one
//! space. The caller is taken from the request context; the subject is
//! echoed back so clients can correlate results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::json_numbers::option_i64_string;
use crate::domain::validate::ValidationError;
use crate::domain::{Error, RequestContext, SpaceId, Validate};

/// Entity type naming a space object.
pub const ENTITY_SPACE: &str = "Space";

/// Most tuples accepted by one request.
pub const MAX_AUTH_TUPLES: usize = 100;

/// Kind of principal being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectType {
    User,
}

/// Principal being authorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSubject {
    pub subject_type: SubjectType,
    pub id: String,
}

/// Object an action targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthObject {
    pub id: String,
    pub entity_type: String,
    /// Owning space for non-space objects.
    #[serde(default, with = "option_i64_string", skip_serializing_if = "Option::is_none")]
    pub space_id: Option<i64>,
}

impl AuthObject {
    /// Object naming the space itself.
    #[must_use]
    pub fn space(space_id: SpaceId) -> Self {
        Self {
            id: space_id.to_string(),
            entity_type: ENTITY_SPACE.to_owned(),
            space_id: None,
        }
    }

    /// Space the object lives in, if it can be determined.
    #[must_use]
    pub fn owning_space(&self) -> Option<SpaceId> {
        if self.entity_type == ENTITY_SPACE {
            self.id.parse().ok()
        } else {
            self.space_id.map(SpaceId::new)
        }
    }
}

/// One authorization question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectActionObjects {
    pub subject: AuthSubject,
    pub action: String,
    pub objects: Vec<AuthObject>,
}

/// Batch authorization request scoped to one space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCheckPermissionRequest {
    pub auths: Vec<SubjectActionObjects>,
    pub space_id: SpaceId,
}

impl Validate for MCheckPermissionRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.auths.is_empty() {
            return Err(ValidationError::new("auths must not be empty"));
        }
        if self.auths.len() > MAX_AUTH_TUPLES {
            return Err(ValidationError::new(format!(
                "auths accepts at most {MAX_AUTH_TUPLES} entries"
            )));
        }
        if self.auths.iter().any(|auth| auth.objects.is_empty()) {
            return Err(ValidationError::new("every auth entry needs at least one object"));
        }
        Ok(())
    }
}

/// Answer for one tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub subject_action_objects: SubjectActionObjects,
    pub is_allowed: bool,
}

/// Answers in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MCheckPermissionResponse {
    pub auth_res: Vec<AuthResult>,
}

/// Domain use-case port for authorization.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Evaluate every tuple for the caller.
    async fn m_check_permission(
        &self,
        ctx: &RequestContext,
        req: &MCheckPermissionRequest,
    ) -> Result<MCheckPermissionResponse, Error>;
}
