use std::path::{Path, PathBuf};

/// Process-wide configuration: the externally visible root URI and the
/// filesystem root under which resources are persisted.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Scheme+host+port, with no trailing slash, e.g. `http://localhost:9001`.
    root_uri: String,
    /// Filesystem root, e.g. `/var/ldp/data`.
    data_path: PathBuf,
}

impl Settings {
    pub fn new(root_uri: impl Into<String>, data_path: impl Into<PathBuf>) -> Self {
        let root_uri = crate::paths::strip_trailing_slash(&root_uri.into());
        Self {
            root_uri,
            data_path: data_path.into(),
        }
    }

    pub fn root_uri(&self) -> &str {
        &self.root_uri
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// The `meta.rdf.id` counter file for the ID minter.
    pub fn id_file(&self) -> PathBuf {
        self.data_path.join("meta.rdf.id")
    }

    /// The on-disk directory for a resource at `path` (e.g. `/a/b`).
    pub fn path_on_disk(&self, path: &str) -> PathBuf {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            self.data_path.clone()
        } else {
            self.data_path.join(trimmed)
        }
    }

    /// The full URI for a resource path.
    pub fn uri_for_path(&self, path: &str) -> String {
        crate::paths::uri_concat(&self.root_uri, path)
    }

    /// The resource path for a full URI under this server's root.
    pub fn path_for_uri(&self, uri: &str) -> String {
        uri.strip_prefix(&self.root_uri)
            .unwrap_or(uri)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash_from_root_uri() {
        let s = Settings::new("http://localhost:9001/", "/data");
        assert_eq!(s.root_uri(), "http://localhost:9001");
    }

    #[test]
    fn path_on_disk_maps_root_to_data_path() {
        let s = Settings::new("http://localhost:9001", "/data");
        assert_eq!(s.path_on_disk("/"), PathBuf::from("/data"));
        assert_eq!(s.path_on_disk("/a/b"), PathBuf::from("/data/a/b"));
    }

    #[test]
    fn uri_for_path_and_back() {
        let s = Settings::new("http://localhost:9001", "/data");
        let uri = s.uri_for_path("/hello");
        assert_eq!(uri, "http://localhost:9001/hello");
        assert_eq!(s.path_for_uri(&uri), "/hello");
    }
}
