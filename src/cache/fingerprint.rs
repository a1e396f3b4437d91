// Request fingerprints - canonical keys for counting and storage

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical identity of an upstream request.
///
/// Built from the request's defining parameters as a sorted-key JSON object,
/// so any ordering of the same name/value pairs yields the same fingerprint.
/// The string form is what the record store keeps in its `params` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Build a fingerprint from name/value pairs.
    ///
    /// Empty names and values are kept as-is. A name given more than once
    /// maps to the sorted list of its values.
    pub fn build<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in params {
            grouped.entry(name.into()).or_default().push(value.into());
        }

        let mut canonical = Map::new();
        for (name, mut values) in grouped {
            let value = if values.len() == 1 {
                Value::String(values.remove(0))
            } else {
                values.sort();
                Value::Array(values.into_iter().map(Value::String).collect())
            };
            canonical.insert(name, value);
        }

        // keys arrive sorted from the BTreeMap; holds with or without preserve_order
        Self(serde_json::to_string(&Value::Object(canonical)).unwrap_or_default())
    }

    /// Wrap a fingerprint string previously produced by [`Fingerprint::build`].
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short digest for log lines; fingerprints may carry service keys.
    pub fn short_id(&self) -> String {
        let digest = format!("{:x}", Sha256::digest(self.0.as_bytes()));
        digest[..16].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independent() {
        let a = Fingerprint::build([("pageNo", "1"), ("numOfRows", "10")]);
        let b = Fingerprint::build([("numOfRows", "10"), ("pageNo", "1")]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), r#"{"numOfRows":"10","pageNo":"1"}"#);
    }

    #[test]
    fn test_distinct_values_distinct_fingerprints() {
        let a = Fingerprint::build([("pageNo", "1")]);
        let b = Fingerprint::build([("pageNo", "2")]);
        assert_ne!(a, b);
        assert_ne!(a.short_id(), b.short_id());
    }

    #[test]
    fn test_empty_values_are_valid() {
        let fp = Fingerprint::build([("pageNo", ""), ("", "")]);
        assert_eq!(fp.as_str(), r#"{"":"","pageNo":""}"#);

        let empty = Fingerprint::build(Vec::<(String, String)>::new());
        assert_eq!(empty.as_str(), "{}");
    }

    #[test]
    fn test_repeated_names_order_independent() {
        let a = Fingerprint::build([("tag", "b"), ("tag", "a")]);
        let b = Fingerprint::build([("tag", "a"), ("tag", "b")]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), r#"{"tag":["a","b"]}"#);
    }

    #[test]
    fn test_special_characters_escaped() {
        let fp = Fingerprint::build([("q", "a\"b,c:d")]);
        let parsed: serde_json::Value = serde_json::from_str(fp.as_str()).unwrap();
        assert_eq!(parsed["q"], "a\"b,c:d");
    }

    #[test]
    fn test_short_id_length() {
        let fp = Fingerprint::build([("pageNo", "1")]);
        assert_eq!(fp.short_id().len(), 16);
    }
}
