//! Dot-path helpers. Paths are compared case-insensitively, so every entry
//! point normalizes to lowercase first.

/// Lowercase and trim a path.
pub fn normalize(path: &str) -> String {
    path.trim().to_lowercase()
}

/// Non-empty segments of a path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

/// Parent path: `a.b` → `a`, `a` → `""`, `""` → `None`.
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rfind('.').map_or("", |i| &path[..i]))
}

/// Ancestors nearest first, excluding the empty root path.
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut current = path;
    while let Some(p) = parent(current) {
        if p.is_empty() {
            break;
        }
        out.push(p);
        current = p;
    }
    out
}

/// Whether `path` lies strictly below `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

/// Join a base path and a key.
pub fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_owned()
    } else {
        format!("{base}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_and_ancestors() {
        assert_eq!(parent("a.b.c"), Some("a.b"));
        assert_eq!(parent("a"), Some(""));
        assert_eq!(parent(""), None);
        assert_eq!(ancestors("a.b.c"), vec!["a.b", "a"]);
        assert!(ancestors("a").is_empty());
    }

    #[test]
    fn descendants() {
        assert!(is_descendant("a.b", "a"));
        assert!(is_descendant("a.b.c", "a"));
        assert!(!is_descendant("ab", "a"));
        assert!(!is_descendant("a", "a"));
        assert!(is_descendant("a", ""));
    }

    #[test]
    fn normalize_and_join() {
        assert_eq!(normalize(" User.Name "), "user.name");
        assert_eq!(join("", "x"), "x");
        assert_eq!(join("arr", "0"), "arr.0");
        assert_eq!(segments("a..b").collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
