//! Pure path helpers shared by the coordinator (and, ambiently, by the HTTP
//! binary): joining path segments, deriving a parent/child pair, and
//! validating slugs. Grounded on the original implementation's
//! `util.PathConcat`/`UriConcat`/`DirBasePath`/`IsValidSlug`.

/// Joins two path segments with exactly one `/` between them.
pub fn concat(a: &str, b: &str) -> String {
    let a_has_slash = a.ends_with('/');
    let b_has_slash = b.starts_with('/');
    match (a_has_slash, b_has_slash) {
        (true, true) => format!("{a}{}", &b[1..]),
        (true, false) | (false, true) => format!("{a}{b}"),
        (false, false) => format!("{a}/{b}"),
    }
}

/// [`concat`] followed by stripping any trailing slash.
pub fn uri_concat(a: &str, b: &str) -> String {
    strip_trailing_slash(&concat(a, b))
}

pub fn strip_trailing_slash(path: &str) -> String {
    path.strip_suffix('/').unwrap_or(path).to_string()
}

/// Splits a path into `(parent, last_segment)`, the way `PUT /a/b` needs to
/// recover the container path `/a` and slug `b`.
pub fn dir_base(path: &str) -> (String, String) {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rsplit_once('/') {
        Some((dir, base)) => {
            let dir = if dir.is_empty() { "/" } else { dir };
            (dir.to_string(), base.to_string())
        }
        None => ("/".to_string(), trimmed.to_string()),
    }
}

/// The parent container path for a resource path, `/` for top-level resources.
pub fn parent_path(path: &str) -> String {
    let (dir, _) = dir_base(path);
    dir
}

pub fn is_root_path(path: &str) -> bool {
    path.is_empty() || path == "/" || path == "."
}

/// Slugs must be alphanumeric plus `_`, `.` and `-`, must not be `.` or
/// `..`, and must not change when run through path-segment cleaning (no
/// embedded `/`, no redundant separators).
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug == "." || slug == ".." {
        return false;
    }
    if slug.contains('/') {
        return false;
    }
    slug.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_joins_with_exactly_one_slash() {
        assert_eq!(concat("/data", "hello"), "/data/hello");
        assert_eq!(concat("/data/", "hello"), "/data/hello");
        assert_eq!(concat("/data", "/hello"), "/data/hello");
        assert_eq!(concat("/data/", "/hello"), "/data/hello");
    }

    #[test]
    fn dir_base_splits_last_segment() {
        assert_eq!(dir_base("/a/b"), ("/a".to_string(), "b".to_string()));
        assert_eq!(dir_base("/a/b/"), ("/a".to_string(), "b".to_string()));
        assert_eq!(dir_base("/a"), ("/".to_string(), "a".to_string()));
    }

    #[test]
    fn slug_validity_accepts_the_documented_good_set() {
        for slug in ["abc", "a_1", "a.jpg", "a-b", "123"] {
            assert!(is_valid_slug(slug), "{slug} should be valid");
        }
    }

    #[test]
    fn slug_validity_rejects_the_documented_bad_set() {
        for slug in ["", "..", ".", "a/b", "a?", "a:"] {
            assert!(!is_valid_slug(slug), "{slug} should be invalid");
        }
    }
}
