//! Directory-per-resource persistence: a metadata file, an optional binary
//! payload file, and a deletion marker.

use crate::error::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const META_FILE: &str = "meta.rdf";
const DATA_FILE: &str = "data.bin";
const DELETED_MARKER: &str = "deleted";

/// The on-disk footprint of one resource: a directory containing
/// `meta.rdf` (always present for a live resource), `data.bin` (non-RDF
/// resources only), and `deleted` (tombstoned resources only).
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    fn data_path(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    fn deleted_marker_path(&self) -> PathBuf {
        self.dir.join(DELETED_MARKER)
    }

    /// True iff a live metadata file is present.
    pub fn exists(&self) -> bool {
        self.meta_path().is_file()
    }

    /// True iff the deletion marker is present.
    pub fn is_deleted(&self) -> bool {
        self.deleted_marker_path().is_file()
    }

    /// Creates the store: the directory plus an empty `meta.rdf`.
    ///
    /// Fails with [`Error::AlreadyExists`] if a live resource is already
    /// there, or [`Error::CreateDeleted`] if only a tombstone is there.
    pub fn create(&self) -> Result<()> {
        if self.exists() {
            return Err(Error::AlreadyExists);
        }
        if self.is_deleted() {
            return Err(Error::CreateDeleted);
        }
        fs::create_dir_all(&self.dir)?;
        self.save_meta("")?;
        Ok(())
    }

    pub fn save_meta(&self, content: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.meta_path(), content)?;
        Ok(())
    }

    /// Appends one line to the metadata file with `O_APPEND` semantics, so
    /// concurrent appends to the same container do not interleave
    /// mid-line.
    pub fn append_meta(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.meta_path())?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    pub fn read_meta(&self) -> Result<String> {
        Ok(fs::read_to_string(self.meta_path())?)
    }

    /// Consumes a byte stream into `data.bin`, overwriting any prior content.
    pub fn save_data(&self, mut reader: impl Read) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = File::create(self.data_path())?;
        std::io::copy(&mut reader, &mut file)?;
        Ok(())
    }

    pub fn read_data(&self) -> Result<Vec<u8>> {
        Ok(fs::read(self.data_path())?)
    }

    /// Removes `meta.rdf` and (if present) `data.bin`, then writes the
    /// deletion marker. The directory itself is retained so the tombstone
    /// persists.
    pub fn delete(&self) -> Result<()> {
        if self.meta_path().is_file() {
            fs::remove_file(self.meta_path())?;
        }
        if self.data_path().is_file() {
            fs::remove_file(self.data_path())?;
        }
        fs::write(self.deleted_marker_path(), "")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_then_exists() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("r1"));
        assert!(!store.exists());
        store.create().unwrap();
        assert!(store.exists());
    }

    #[test]
    fn create_twice_fails_with_already_exists() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("r1"));
        store.create().unwrap();
        assert!(matches!(store.create(), Err(Error::AlreadyExists)));
    }

    #[test]
    fn create_after_delete_fails_with_create_deleted() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("r1"));
        store.create().unwrap();
        store.delete().unwrap();
        assert!(store.is_deleted());
        assert!(matches!(store.create(), Err(Error::CreateDeleted)));
    }

    #[test]
    fn save_and_read_meta_round_trips() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("r1"));
        store.create().unwrap();
        store.save_meta("<s> <p> <o> .\n").unwrap();
        assert_eq!(store.read_meta().unwrap(), "<s> <p> <o> .\n");
    }

    #[test]
    fn append_meta_does_not_clobber_prior_content() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("r1"));
        store.create().unwrap();
        store.save_meta("line1\n").unwrap();
        store.append_meta("line2\n").unwrap();
        assert_eq!(store.read_meta().unwrap(), "line1\nline2\n");
    }

    #[test]
    fn save_and_read_data_round_trips() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("r1"));
        store.create().unwrap();
        store.save_data(&b"hello"[..]).unwrap();
        assert_eq!(store.read_data().unwrap(), b"hello");
    }

    #[test]
    fn delete_removes_files_but_keeps_directory_as_tombstone() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("r1"));
        store.create().unwrap();
        store.save_data(&b"x"[..]).unwrap();
        store.delete().unwrap();
        assert!(!store.exists());
        assert!(store.is_deleted());
        assert!(store.path().is_dir());
    }
}
