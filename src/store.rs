//! Document store.
//!
//! Filesystem access for synced documents, rooted at the vault
//! directory so configured source paths stay relative and portable.
//! Writes are atomic: temp file, fsync, rename — a crashed pass never
//! leaves a half-written document behind.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Vault-rooted file store for synced documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Create a store rooted at the vault directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute path of a document; relative paths resolve against the
    /// vault root.
    #[must_use]
    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.root.join(file)
        }
    }

    /// Whether the document exists.
    #[must_use]
    pub fn exists(&self, file: &Path) -> bool {
        self.resolve(file).is_file()
    }

    /// Read whole-file text.
    pub fn read(&self, file: &Path) -> Result<String> {
        Ok(fs::read_to_string(self.resolve(file))?)
    }

    /// Write whole-file text atomically, creating parent folders as
    /// needed.
    ///
    /// Writes to a temp file in the same directory, syncs to disk, then
    /// renames over the target. If any step fails the original file (if
    /// any) remains untouched.
    pub fn write(&self, file: &Path, content: &str) -> Result<()> {
        let path = self.resolve(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = temp_path_for(&path);
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes())?;
            writer.flush()?;
            // Sync to disk before rename
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp_path, &path)?;

        Ok(())
    }
}

/// Sibling temp path: `notes.md` → `notes.md.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map_or_else(
        || std::ffi::OsString::from("document"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".tmp");
    path.with_file_name(name)
}
