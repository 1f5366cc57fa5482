//! Dotted, root-relative paths.
//!
//! Store state is addressed with plain dotted strings (`"list.tasks"`). The
//! empty string addresses the node itself. Store names are single segments and
//! therefore must not contain a dot.

use crate::error::TypeError;

/// Split a dotted path into its segments. The empty path has no segments.
pub fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

/// Join segments back into a dotted path.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(".")
}

/// Prefix `path` with a store name: `qualify("list", "tasks") == "list.tasks"`,
/// `qualify("list", "") == "list"`. An empty name leaves `path` as is.
pub fn qualify(name: &str, path: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        path.to_string()
    } else {
        format!("{name}.{path}")
    }
}

/// Split off the first segment: `"a.b.c"` → `("a", Some("b.c"))`.
pub fn split_first(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

/// Validate a store name.
///
/// Names become path segments of every descendant's listener keys, so they
/// must be non-empty and free of dots and whitespace.
pub fn validate_store_name(name: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidStoreName {
        name: name.to_string(),
        reason: reason.into(),
    };
    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.contains('.') {
        return Err(invalid("must not contain '.'"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_empty_path() {
        assert!(split_path("").is_empty());
    }

    #[test]
    fn split_and_join() {
        let segs = split_path("app.list.tasks");
        assert_eq!(segs, vec!["app", "list", "tasks"]);
        assert_eq!(join_path(&segs), "app.list.tasks");
    }

    #[test]
    fn qualify_paths() {
        assert_eq!(qualify("list", "tasks"), "list.tasks");
        assert_eq!(qualify("list", ""), "list");
        assert_eq!(qualify("", "tasks"), "tasks");
    }

    #[test]
    fn split_first_segment() {
        assert_eq!(split_first("a.b.c"), ("a", Some("b.c")));
        assert_eq!(split_first("a"), ("a", None));
    }

    #[test]
    fn store_names() {
        assert!(validate_store_name("tasklists").is_ok());
        assert!(validate_store_name("").is_err());
        assert!(validate_store_name("a.b").is_err());
        assert!(validate_store_name("a b").is_err());
    }

    proptest::proptest! {
        #[test]
        fn qualified_paths_split_back(
            names in proptest::collection::vec("[a-z]{1,6}", 1..5),
            leaf in "[a-z]{1,6}",
        ) {
            let prefix = join_path(&names);
            let full = qualify(&prefix, &leaf);
            let mut expected: Vec<&str> = names.iter().map(String::as_str).collect();
            expected.push(&leaf);
            proptest::prop_assert_eq!(split_path(&full), expected);
            proptest::prop_assert_eq!(split_first(&full).0, names[0].as_str());
        }
    }
}
