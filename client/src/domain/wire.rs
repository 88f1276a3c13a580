//! Serde helpers tolerating the upstream's wire-shape inconsistencies.
//!
//! The upstream interchangeably omits optional string fields, sends them as
//! `null`, or sends empty strings. Screens treat all three the same, so
//! records normalise them to `""` at the boundary.

use serde::{Deserialize, Deserializer};

/// Deserialise a string field, mapping `null` (and absence, combined with
/// `#[serde(default)]`) to the empty string.
pub(crate) fn null_to_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        #[serde(default, deserialize_with = "super::null_to_empty")]
        value: String,
    }

    #[test]
    fn null_missing_and_present_all_decode() {
        let null: Probe = serde_json::from_str(r#"{"value":null}"#).expect("null decodes");
        let missing: Probe = serde_json::from_str("{}").expect("missing decodes");
        let present: Probe = serde_json::from_str(r#"{"value":"x"}"#).expect("present decodes");

        assert_eq!(null.value, "");
        assert_eq!(missing.value, "");
        assert_eq!(present.value, "x");
    }
}
