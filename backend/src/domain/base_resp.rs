//! Status block embedded in RPC-style responses.
//!
//! Responses that carry a [`BaseResp`] report business failures in-band.
//! The HTTP envelope adapter lifts the block into the `{code,msg}` envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::Error;

/// JSON key the block is stored under.
pub const BASE_RESP_KEY: &str = "BaseResp";

/// In-band status: `StatusCode` 0 means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BaseResp {
    #[serde(default)]
    pub status_code: i32,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl BaseResp {
    /// Block describing `err` in its wire form.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        let wire = err.to_wire();
        Self {
            status_code: wire.code,
            status_message: wire.message,
            extra: wire.extra,
        }
    }

    /// Whether the block reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == 0
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{COMMON_NO_PERMISSION, EXTRA_AFFECT_STABILITY};
    use serde_json::json;

    #[test]
    fn serializes_pascal_case_fields() {
        let block = BaseResp::from_error(&Error::by_code(COMMON_NO_PERMISSION));
        let value = serde_json::to_value(&block).expect("encode");
        assert_eq!(value["StatusCode"], json!(COMMON_NO_PERMISSION));
        assert_eq!(value["Extra"][EXTRA_AFFECT_STABILITY], json!("0"));
        assert!(!block.is_success());
    }

    #[test]
    fn missing_fields_default_to_success() {
        let block: BaseResp = serde_json::from_value(json!({})).expect("decode");
        assert!(block.is_success());
    }
}
