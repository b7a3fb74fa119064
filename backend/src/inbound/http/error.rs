//! HTTP adapter mapping for domain errors.
//!
//! Every coded error is answered with status 200 and a `{code, msg}` body.
//! The envelope middleware re-renders the body with a localized message, so
//! this rendering only matters for callers mounted without it.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::error;

use crate::domain::Error;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        StatusCode::OK
    }

    fn error_response(&self) -> HttpResponse {
        if self.affects_stability() {
            error!(code = self.code(), error = %self, "request failed");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "msg": self.message(),
        }))
    }
}
