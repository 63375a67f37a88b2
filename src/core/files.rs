//! Read-only, path-keyed byte collection.
//!
//! Loaded once from a directory root; names are forward-slash relative
//! paths. Lookup operations never error on missing keys.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;

use crate::error::{Result, ValueError};

/// Source of a file bundle.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Loader {
    Directory(PathBuf),
}

/// Immutable path → bytes collection with config-oriented projections.
#[derive(Debug, Clone, Default)]
pub struct FileBundle {
    files: BTreeMap<String, Vec<u8>>,
}

impl FileBundle {
    /// Load a bundle from the configured source.
    ///
    /// Walks the directory recursively, following symlinks. Non-regular
    /// files are an error.
    pub fn load(loader: &Loader) -> Result<Self> {
        match loader {
            Loader::Directory(root) => Self::from_directory(root),
        }
    }

    fn from_directory(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(ValueError::UnsupportedLoader.into());
        }

        let mut files = BTreeMap::new();
        for entry in walkdir::WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| {
                ValueError::Parser(format!("walking {}: {e}", root.display()))
            })?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !file_type.is_file() {
                return Err(
                    ValueError::NotRegularFile(entry.path().display().to_string()).into(),
                );
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .expect("walked entries live under the root");
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let data = std::fs::read(entry.path())?;
            files.insert(name, data);
        }

        debug!(root = %root.display(), count = files.len(), "loaded file bundle");
        Ok(FileBundle { files })
    }

    /// Build a bundle directly from named contents.
    pub fn from_map(files: BTreeMap<String, Vec<u8>>) -> Self {
        FileBundle { files }
    }

    /// File contents as UTF-8, empty when missing or non-UTF-8 bytes are
    /// replaced.
    pub fn get(&self, name: &str) -> String {
        self.files
            .get(name)
            .map(|data| String::from_utf8_lossy(data).into_owned())
            .unwrap_or_default()
    }

    /// Raw file contents, empty when missing.
    pub fn get_bytes(&self, name: &str) -> Vec<u8> {
        self.files.get(name).cloned().unwrap_or_default()
    }

    /// Files whose name matches a `/`-separated glob pattern.
    pub fn glob(&self, pattern: &str) -> Result<BTreeMap<String, String>> {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| ValueError::Parser(format!("invalid glob {pattern:?}: {e}")))?;
        Ok(self
            .files
            .iter()
            .filter(|(name, _)| matcher.matches(name))
            .map(|(name, data)| (name.clone(), String::from_utf8_lossy(data).into_owned()))
            .collect())
    }

    /// File contents split on `\n`, empty when missing.
    pub fn lines(&self, name: &str) -> Vec<String> {
        let contents = self.get(name);
        if contents.is_empty() {
            return Vec::new();
        }
        contents.split('\n').map(str::to_string).collect()
    }

    /// Basename → UTF-8 contents projection.
    pub fn as_config(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .map(|(name, data)| {
                (
                    basename(name),
                    String::from_utf8_lossy(data).into_owned(),
                )
            })
            .collect()
    }

    /// Basename → base64 contents projection.
    pub fn as_secrets(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .map(|(name, data)| (basename(name), BASE64.encode(data)))
            .collect()
    }

    /// All names in the bundle, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn basename(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> FileBundle {
        let mut files = BTreeMap::new();
        files.insert("certs/ca.pem".to_string(), b"PEM".to_vec());
        files.insert("config/app.conf".to_string(), b"k=v\nx=y".to_vec());
        files.insert("top.txt".to_string(), b"hello".to_vec());
        FileBundle::from_map(files)
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "A").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), "B").unwrap();

        let bundle = FileBundle::load(&Loader::Directory(dir.path().to_path_buf())).unwrap();
        assert_eq!(bundle.get("a.txt"), "A");
        assert_eq!(bundle.get("sub/b.txt"), "B");
        assert_eq!(bundle.names().count(), 2);
    }

    #[test]
    fn missing_keys_are_empty() {
        let b = bundle();
        assert_eq!(b.get("nope"), "");
        assert!(b.get_bytes("nope").is_empty());
        assert!(b.lines("nope").is_empty());
    }

    #[test]
    fn glob_matches_forward_slash_paths() {
        let b = bundle();
        let hits = b.glob("certs/*.pem").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits["certs/ca.pem"], "PEM");
        assert!(b.glob("*.missing").unwrap().is_empty());
        assert!(b.glob("[bad").is_err());
    }

    #[test]
    fn lines_split_on_newline() {
        let b = bundle();
        assert_eq!(b.lines("config/app.conf"), vec!["k=v", "x=y"]);
    }

    #[test]
    fn config_and_secret_projections() {
        let b = bundle();
        let config = b.as_config();
        assert_eq!(config["ca.pem"], "PEM");
        assert_eq!(config["top.txt"], "hello");

        let secrets = b.as_secrets();
        assert_eq!(secrets["top.txt"], "aGVsbG8=");
    }
}
