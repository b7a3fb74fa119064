//! Opaque 64-bit identifiers for users, spaces and API keys.
//!
//! Identifiers follow the wire integer policy: they serialize as strings and
//! accept numbers or strings when decoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::json_numbers::i64_string;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw integer value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                i64_string::serialize(&self.0, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                i64_string::deserialize(deserializer).map(Self)
            }
        }
    };
}

define_id! {
    /// Opaque user identifier.
    UserId
}

define_id! {
    /// Opaque space (workspace) identifier.
    SpaceId
}

define_id! {
    /// Opaque personal access token identifier.
    ApiKeyId
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn serializes_as_string() {
        let encoded = serde_json::to_string(&UserId::new(7_000_000_000_000_000_001)).expect("encode");
        assert_eq!(encoded, r#""7000000000000000001""#);
    }

    #[rstest]
    #[case("\"12\"")]
    #[case("12")]
    fn deserializes_from_number_or_string(#[case] input: &str) {
        let id: SpaceId = serde_json::from_str(input).expect("decode");
        assert_eq!(id, SpaceId::new(12));
    }

    #[rstest]
    fn parses_decimal_text() {
        let id: ApiKeyId = " 42 ".parse().expect("parse id");
        assert_eq!(id.get(), 42);
        assert!("forty".parse::<ApiKeyId>().is_err());
    }
}
