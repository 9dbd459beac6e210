//! The store's value type and normalization from JSON.

use indexmap::IndexMap;

use crate::expr::format_number;

/// A store node: a string leaf or a string-keyed map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Text(String),
    Map(IndexMap<String, Data>),
}

impl Default for Data {
    fn default() -> Self {
        Self::Map(IndexMap::new())
    }
}

impl Data {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Data>> {
        match self {
            Self::Map(map) => Some(map),
            Self::Text(_) => None,
        }
    }

    /// Keys of a map node in insertion order; empty for text.
    pub fn keys(&self) -> Vec<String> {
        self.as_map()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Child by key: exact match first, then case-insensitive.
    pub fn child(&self, key: &str) -> Option<&Data> {
        let map = self.as_map()?;
        map.get(key).or_else(|| {
            map.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key) || k.to_lowercase() == key)
                .map(|(_, v)| v)
        })
    }

    /// Serialized form: text verbatim, maps as JSON.
    pub fn serialize(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Map(_) => self.to_json().to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Parse a serialized attribute value: JSON objects and arrays become
    /// maps, anything else is text.
    pub fn from_serialized(text: &str) -> Self {
        let trimmed = text.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(json @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) =
                serde_json::from_str::<serde_json::Value>(text)
            {
                return make_data(&json);
            }
        }
        Self::Text(text.to_owned())
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Normalize a JSON value into store data. Arrays are keyed `"0".."n-1"`;
/// `false` and `null` become the empty string at every depth.
pub fn make_data(value: &serde_json::Value) -> Data {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => Data::Text(String::new()),
        serde_json::Value::Bool(true) => Data::text("true"),
        serde_json::Value::Number(n) => Data::Text(match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(u)) => u.to_string(),
            _ => format_number(n.as_f64().unwrap_or(f64::NAN)),
        }),
        serde_json::Value::String(s) => Data::Text(s.clone()),
        serde_json::Value::Array(items) => Data::Map(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), make_data(v)))
                .collect(),
        ),
        serde_json::Value::Object(map) => Data::Map(
            map.iter().map(|(k, v)| (k.clone(), make_data(v))).collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives_become_strings() {
        assert_eq!(make_data(&json!(42)), Data::text("42"));
        assert_eq!(make_data(&json!(0.5)), Data::text("0.5"));
        assert_eq!(make_data(&json!(true)), Data::text("true"));
        assert_eq!(make_data(&json!(false)), Data::text(""));
        assert_eq!(make_data(&json!(null)), Data::text(""));
    }

    #[test]
    fn arrays_are_keyed_by_index() {
        let data = make_data(&json!([1, "2", {"a": false}]));
        assert_eq!(data.keys(), vec!["0", "1", "2"]);
        assert_eq!(data.serialize(), r#"{"0":"1","1":"2","2":{"a":""}}"#);
    }

    #[test]
    fn child_lookup_falls_back_to_case_insensitive() {
        let data = make_data(&json!({"Name": "x", "name2": "y"}));
        assert_eq!(data.child("Name"), Some(&Data::text("x")));
        assert_eq!(data.child("name"), Some(&Data::text("x")));
        assert_eq!(data.child("missing"), None);
        assert_eq!(Data::text("t").child("x"), None);
    }

    #[test]
    fn from_serialized_reads_json_containers_only() {
        assert_eq!(Data::from_serialized("hello"), Data::text("hello"));
        assert_eq!(Data::from_serialized("42"), Data::text("42"));
        assert_eq!(Data::from_serialized("{broken"), Data::text("{broken"));
        assert_eq!(
            Data::from_serialized(r#"{"0":"1"}"#),
            make_data(&json!({"0": "1"}))
        );
        assert_eq!(Data::from_serialized("[1]").keys(), vec!["0"]);
    }
}
