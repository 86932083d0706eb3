//! Indexed catalogue of recorded reset states.
//!
//! Each entry pairs a cloth mesh file with a character state file. Files
//! follow the numbered layout `<prefix><NNNNN>.obj` and `<prefix>_char<NNNNN>`
//! with five-digit zero padding; paths in the manifest are relative to the
//! directory holding the manifest file.
//!
//! ```toml
//! prefix = "saved_control_states/enter_seq_match"
//!
//! [[entries]]
//! index = 0
//! mesh = "saved_control_states/enter_seq_match00000.obj"
//! character = "saved_control_states/enter_seq_match_char00000"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Mesh file name for a numbered reset state.
#[must_use]
pub fn mesh_file_name(prefix: &str, index: u32) -> String {
    format!("{prefix}{index:05}.obj")
}

/// Character file name for a numbered reset state.
#[must_use]
pub fn character_file_name(prefix: &str, index: u32) -> String {
    format!("{prefix}_char{index:05}")
}

// ---------------------------------------------------------------------------
// ManifestEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub index: u32,
    pub mesh: PathBuf,
    pub character: PathBuf,
}

impl ManifestEntry {
    /// Entry using the numbered naming scheme.
    #[must_use]
    pub fn numbered(prefix: &str, index: u32) -> Self {
        Self {
            index,
            mesh: PathBuf::from(mesh_file_name(prefix, index)),
            character: PathBuf::from(character_file_name(prefix, index)),
        }
    }
}

// ---------------------------------------------------------------------------
// ResetManifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetManifest {
    pub prefix: String,
    #[serde(default)]
    entries: Vec<ManifestEntry>,
    /// Directory the entry paths are relative to.
    #[serde(skip)]
    root: PathBuf,
}

impl ResetManifest {
    /// Empty manifest rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: Vec::new(),
            root: root.into(),
        }
    }

    /// Load a manifest file. Entry paths resolve against its parent directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: Self = toml::from_str(&content)?;
        manifest.root = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut seen = HashSet::new();
        for entry in &manifest.entries {
            if !seen.insert(entry.index) {
                return Err(ManifestError::DuplicateIndex(entry.index));
            }
        }
        manifest.entries.sort_by_key(|e| e.index);
        Ok(manifest)
    }

    /// Write the manifest as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build a manifest from legacy numbered files under `root`.
    ///
    /// Probes indices from zero and stops at the first index whose mesh or
    /// character file is missing.
    pub fn scan(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        let mut manifest = Self::new(root, prefix);
        for index in 0.. {
            let entry = ManifestEntry::numbered(&manifest.prefix, index);
            if !(manifest.resolve(&entry.mesh).is_file()
                && manifest.resolve(&entry.character).is_file())
            {
                break;
            }
            manifest.entries.push(entry);
        }
        manifest
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a manifest-relative path.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn mesh_path(&self, entry: &ManifestEntry) -> PathBuf {
        self.resolve(&entry.mesh)
    }

    pub fn character_path(&self, entry: &ManifestEntry) -> PathBuf {
        self.resolve(&entry.character)
    }

    /// Index the next saved state will receive.
    pub fn next_index(&self) -> u32 {
        self.entries.iter().map(|e| e.index + 1).max().unwrap_or(0)
    }

    /// Next numbered entry. Not recorded until [`push`](Self::push)ed.
    #[must_use]
    pub fn next_entry(&self) -> ManifestEntry {
        ManifestEntry::numbered(&self.prefix, self.next_index())
    }

    /// Record an entry whose files have been written.
    pub fn push(&mut self, entry: ManifestEntry) -> Result<(), ManifestError> {
        if self.entries.iter().any(|e| e.index == entry.index) {
            return Err(ManifestError::DuplicateIndex(entry.index));
        }
        let at = self.entries.partition_point(|e| e.index < entry.index);
        self.entries.insert(at, entry);
        Ok(())
    }

    /// Reserve the next numbered entry and return it.
    pub fn allocate(&mut self) -> ManifestEntry {
        let entry = self.next_entry();
        self.entries.push(entry.clone());
        entry
    }

    /// Ensure at least `size` entries exist.
    pub fn require(&self, size: usize) -> Result<(), ManifestError> {
        if self.entries.len() < size {
            return Err(ManifestError::TooFewEntries {
                available: self.entries.len(),
                requested: size,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "drapery-manifest-{tag}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    // ---- naming ----

    #[test]
    fn numbered_names_are_zero_padded() {
        assert_eq!(mesh_file_name("matchgrip", 7), "matchgrip00007.obj");
        assert_eq!(character_file_name("matchgrip", 12), "matchgrip_char00012");
    }

    // ---- allocation ----

    #[test]
    fn next_index_is_max_plus_one() {
        let mut manifest = ResetManifest::new("/tmp", "s");
        assert_eq!(manifest.next_index(), 0);
        manifest.entries.push(ManifestEntry::numbered("s", 4));
        manifest.entries.push(ManifestEntry::numbered("s", 1));
        assert_eq!(manifest.next_index(), 5);
        let entry = manifest.allocate();
        assert_eq!(entry.index, 5);
        assert_eq!(entry.mesh, PathBuf::from("s00005.obj"));
        assert_eq!(manifest.len(), 3);
    }

    #[test]
    fn next_entry_is_not_recorded_until_pushed() {
        let mut manifest = ResetManifest::new("/tmp", "s");
        let entry = manifest.next_entry();
        assert_eq!(entry.index, 0);
        assert!(manifest.is_empty());
        assert_eq!(manifest.next_entry(), entry);

        manifest.push(entry.clone()).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.next_entry().index, 1);
        assert!(matches!(
            manifest.push(entry),
            Err(ManifestError::DuplicateIndex(0))
        ));
    }

    #[test]
    fn require_reports_shortfall() {
        let manifest = ResetManifest::new("/tmp", "s");
        let err = manifest.require(20).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::TooFewEntries {
                available: 0,
                requested: 20
            }
        ));
    }

    // ---- files ----

    #[test]
    fn save_then_load_resolves_against_parent() {
        let dir = temp_dir("save");
        let mut manifest = ResetManifest::new(&dir, "states/seq");
        manifest.allocate();
        manifest.allocate();
        let path = dir.join("manifest.toml");
        manifest.save(&path).unwrap();

        let loaded = ResetManifest::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.root(), dir.as_path());
        assert_eq!(
            loaded.mesh_path(&loaded.entries()[1]),
            dir.join("states/seq00001.obj")
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_rejects_duplicate_index() {
        let dir = temp_dir("dup");
        let path = dir.join("manifest.toml");
        std::fs::write(
            &path,
            r#"
prefix = "a"

[[entries]]
index = 0
mesh = "a00000.obj"
character = "a_char00000"

[[entries]]
index = 0
mesh = "b.obj"
character = "b_char"
"#,
        )
        .unwrap();
        let err = ResetManifest::load(&path).unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateIndex(0)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ResetManifest::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }

    #[test]
    fn scan_stops_at_first_gap() {
        let dir = temp_dir("scan");
        for i in [0, 1, 3] {
            std::fs::write(dir.join(mesh_file_name("seq", i)), "").unwrap();
            std::fs::write(dir.join(character_file_name("seq", i)), "").unwrap();
        }
        // mesh without character
        std::fs::write(dir.join(mesh_file_name("seq", 2)), "").unwrap();

        let manifest = ResetManifest::scan(&dir, "seq");
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.next_index(), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
