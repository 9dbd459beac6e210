//! Binding store: a tree of string leaves addressed by dot paths.

pub mod data;
pub mod path;

use indexmap::IndexMap;

pub use data::{make_data, Data};

/// Errors produced when reading the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("cannot read {segment:?} of a string value while resolving {path:?}")]
    NotAnObject { path: String, segment: String },
}

/// The authoritative data model of a binding context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Store {
    root: Data,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Data {
        &self.root
    }

    /// Resolve `path`. An absent segment yields `None`; descending into a
    /// string is an error.
    pub fn get(&self, path: &str) -> Result<Option<&Data>, StoreError> {
        let path = path::normalize(path);
        let mut node = &self.root;
        for segment in path::segments(&path) {
            if !node.is_map() {
                return Err(StoreError::NotAnObject {
                    path: path.clone(),
                    segment: segment.to_owned(),
                });
            }
            match node.child(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(Some(node))
    }

    /// Like [`get`](Self::get), but a string along the way reads as absent.
    pub fn lookup(&self, path: &str) -> Option<&Data> {
        self.get(path).ok().flatten()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Store `data` at `path`, creating maps along the way and turning
    /// string nodes on the way into maps. Returns the previous value.
    pub fn insert(&mut self, path: &str, data: Data) -> Option<Data> {
        let path = path::normalize(path);
        let segments: Vec<&str> = path::segments(&path).collect();
        let Some((last, parents)) = segments.split_last() else {
            return Some(std::mem::replace(&mut self.root, into_map(data)));
        };
        let mut node = &mut self.root;
        for segment in parents {
            node = child_map(node, segment);
        }
        let map = as_map_mut(node);
        match existing_key(map, last) {
            Some(key) => map.insert(key, data),
            None => map.insert((*last).to_owned(), data),
        }
    }

    /// Remove the node at `path`, returning it.
    pub fn remove(&mut self, path: &str) -> Option<Data> {
        let path = path::normalize(path);
        let segments: Vec<&str> = path::segments(&path).collect();
        let (last, parents) = segments.split_last()?;
        let mut node = &mut self.root;
        for segment in parents {
            let Data::Map(map) = node else { return None };
            let key = existing_key(map, segment)?;
            node = map.get_mut(&key)?;
        }
        let Data::Map(map) = node else { return None };
        let key = existing_key(map, last)?;
        map.shift_remove(&key)
    }

    /// Drop all data.
    pub fn clear(&mut self) {
        self.root = Data::default();
    }
}

fn into_map(data: Data) -> Data {
    match data {
        Data::Text(_) => Data::default(),
        map => map,
    }
}

fn as_map_mut(node: &mut Data) -> &mut IndexMap<String, Data> {
    if !node.is_map() {
        *node = Data::default();
    }
    match node {
        Data::Map(map) => map,
        Data::Text(_) => unreachable!("node was just replaced by a map"),
    }
}

fn child_map<'a>(node: &'a mut Data, segment: &str) -> &'a mut Data {
    let map = as_map_mut(node);
    let key = existing_key(map, segment).unwrap_or_else(|| segment.to_owned());
    let child = map.entry(key).or_default();
    if !child.is_map() {
        *child = Data::default();
    }
    child
}

/// The stored key matching `segment`, exact first, then case-insensitive.
fn existing_key(map: &IndexMap<String, Data>, segment: &str) -> Option<String> {
    if map.contains_key(segment) {
        return Some(segment.to_owned());
    }
    map.keys()
        .find(|k| k.to_lowercase() == segment)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_and_get_nested() {
        let mut store = Store::new();
        store.insert("a.b.c", Data::text("1"));
        assert_eq!(store.get("a.b.c").unwrap(), Some(&Data::text("1")));
        assert_eq!(store.get("A.B").unwrap().map(Data::serialize), Some(r#"{"c":"1"}"#.into()));
        assert_eq!(store.get("a.x").unwrap(), None);
        assert_eq!(store.get("").unwrap(), Some(store.root()));
    }

    #[test]
    fn descending_into_a_string_is_an_error() {
        let mut store = Store::new();
        store.insert("a", Data::text("leaf"));
        assert_eq!(
            store.get("a.b"),
            Err(StoreError::NotAnObject {
                path: "a.b".into(),
                segment: "b".into(),
            })
        );
        assert_eq!(store.lookup("a.b"), None);
    }

    #[test]
    fn writing_under_a_string_replaces_it_with_a_map() {
        let mut store = Store::new();
        store.insert("a", Data::text("leaf"));
        store.insert("a.0", Data::text("1"));
        assert_eq!(store.get("a").unwrap().map(Data::serialize), Some(r#"{"0":"1"}"#.into()));
    }

    #[test]
    fn mixed_case_keys_from_objects_resolve() {
        let mut store = Store::new();
        store.insert("user", make_data(&json!({"Name": "Ada"})));
        assert_eq!(store.lookup("user.name"), Some(&Data::text("Ada")));
        store.insert("user.name", Data::text("Grace"));
        assert_eq!(store.root().serialize(), r#"{"user":{"Name":"Grace"}}"#);
    }

    #[test]
    fn remove_and_clear() {
        let mut store = Store::new();
        store.insert("a.b", Data::text("1"));
        store.insert("a.c", Data::text("2"));
        assert_eq!(store.remove("a.b"), Some(Data::text("1")));
        assert_eq!(store.root().serialize(), r#"{"a":{"c":"2"}}"#);
        store.clear();
        assert_eq!(store.root(), &Data::default());
    }
}
