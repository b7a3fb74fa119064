//! Serde helpers for the 64-bit integer policy on the wire.
//!
//! JavaScript clients lose precision above 2^53, so every `i64` crossing the
//! service boundary is written as a JSON string. Decoding accepts either a
//! JSON number or a numeric string. Apply the helpers with
//! `#[serde(with = "...")]`:
//!
//! | Rust type           | helper              |
//! |---------------------|---------------------|
//! | `i64`               | [`i64_string`]      |
//! | `Option<i64>`       | [`option_i64_string`] |
//! | `Vec<i64>`          | [`vec_i64_string`]  |
//! | `BTreeMap<i64, V>`  | [`map_i64_string`]  |

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// An `i64` that serializes as a string and deserializes from either form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LenientI64(pub i64);

impl From<i64> for LenientI64 {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<LenientI64> for i64 {
    fn from(value: LenientI64) -> Self {
        value.0
    }
}

impl Serialize for LenientI64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LenientI64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LenientI64Visitor).map(Self)
    }
}

struct LenientI64Visitor;

impl Visitor<'_> for LenientI64Visitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 64-bit integer as a JSON number or string")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
        i64::try_from(value).map_err(|_| E::custom(format!("integer {value} overflows i64")))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
        value
            .trim()
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}

/// `i64` as a JSON string.
pub mod i64_string {
    use super::*;

    /// Write the integer as a string.
    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    /// Read a number or numeric string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        LenientI64::deserialize(deserializer).map(i64::from)
    }
}

/// `Option<i64>` as a JSON string or `null`.
pub mod option_i64_string {
    use super::*;

    /// Write `Some` as a string and `None` as `null`.
    pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => serializer.collect_str(inner),
            None => serializer.serialize_none(),
        }
    }

    /// Read `null`, a number or a numeric string.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        Option::<LenientI64>::deserialize(deserializer).map(|value| value.map(i64::from))
    }
}

/// `Vec<i64>` as an array of JSON strings.
pub mod vec_i64_string {
    use super::*;

    /// Write every element as a string.
    pub fn serialize<S: Serializer>(values: &[i64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().copied().map(LenientI64))
    }

    /// Read an array of numbers and/or numeric strings.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<i64>, D::Error> {
        Vec::<LenientI64>::deserialize(deserializer)
            .map(|values| values.into_iter().map(i64::from).collect())
    }
}

/// `BTreeMap<i64, V>` with string keys.
pub mod map_i64_string {
    use std::collections::BTreeMap;

    use super::*;

    /// Write keys as strings.
    pub fn serialize<S, V>(map: &BTreeMap<i64, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_map(map.iter().map(|(key, value)| (LenientI64(*key), value)))
    }

    /// Read numeric-string keys.
    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<i64, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        BTreeMap::<LenientI64, V>::deserialize(deserializer)
            .map(|map| map.into_iter().map(|(key, value)| (key.0, value)).collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::collections::BTreeMap;

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "i64_string")]
        id: i64,
        #[serde(with = "option_i64_string", default)]
        parent: Option<i64>,
        #[serde(with = "vec_i64_string")]
        members: Vec<i64>,
        #[serde(with = "map_i64_string")]
        owners: BTreeMap<i64, String>,
    }

    fn sample() -> Sample {
        Sample {
            id: 9_007_199_254_740_993,
            parent: Some(-4),
            members: vec![1, i64::MAX],
            owners: BTreeMap::from([(7, "ada".to_owned())]),
        }
    }

    #[rstest]
    fn encodes_integers_as_strings() {
        let value = serde_json::to_value(sample()).expect("encode sample");
        assert_eq!(
            value,
            json!({
                "id": "9007199254740993",
                "parent": "-4",
                "members": ["1", "9223372036854775807"],
                "owners": {"7": "ada"},
            })
        );
    }

    #[rstest]
    fn decodes_its_own_encoding() {
        let encoded = serde_json::to_string(&sample()).expect("encode sample");
        let decoded: Sample = serde_json::from_str(&encoded).expect("decode sample");
        assert_eq!(decoded, sample());
    }

    #[rstest]
    fn decodes_plain_numbers() {
        let decoded: Sample = serde_json::from_value(json!({
            "id": 9_007_199_254_740_993_i64,
            "parent": -4,
            "members": [1, "9223372036854775807"],
            "owners": {"7": "ada"},
        }))
        .expect("decode numbers");
        assert_eq!(decoded, sample());
    }

    #[rstest]
    #[case(json!({"id": "1", "members": [], "owners": {}}), None)]
    #[case(json!({"id": "1", "parent": null, "members": [], "owners": {}}), None)]
    #[case(json!({"id": "1", "parent": 3, "members": [], "owners": {}}), Some(3))]
    fn optional_field_accepts_missing_and_null(
        #[case] input: serde_json::Value,
        #[case] expected: Option<i64>,
    ) {
        let decoded: Sample = serde_json::from_value(input).expect("decode sample");
        assert_eq!(decoded.parent, expected);
    }

    #[rstest]
    #[case(json!("twelve"))]
    #[case(json!(1.5))]
    #[case(json!(u64::MAX))]
    fn rejects_non_integers(#[case] input: serde_json::Value) {
        assert!(serde_json::from_value::<LenientI64>(input).is_err());
    }
}
