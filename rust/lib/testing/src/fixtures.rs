//! Fixture files live under `fixtures/<pack>/<kind>/<file>.yaml`.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Fixtures shipped with this crate.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

pub struct FixturesLoader {
    base: PathBuf,
}

impl Default for FixturesLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FixturesLoader {
    pub fn new() -> Self {
        Self { base: fixtures_dir() }
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn pack_path(&self, pack: &str) -> PathBuf {
        self.base.join(pack)
    }

    /// Load one fixture file as JSON.
    pub fn load_file(&self, pack: &str, kind: &str, file: &str) -> Result<Value, FixtureError> {
        let path = self.pack_path(pack).join(kind).join(file);
        let text = std::fs::read_to_string(&path).map_err(|source| FixtureError::Io {
            path: path.clone(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| FixtureError::Parse { path, source })
    }

    /// Load the named files of one kind, in the order given.
    pub fn load_fixtures(
        &self,
        pack: &str,
        kind: &str,
        files: &[&str],
    ) -> Result<Vec<(String, Value)>, FixtureError> {
        files
            .iter()
            .map(|file| Ok((file.to_string(), self.load_file(pack, kind, file)?)))
            .collect()
    }

    /// Load every `.yaml`/`.yml` file of one kind, sorted by file name.
    pub fn load_all(&self, pack: &str, kind: &str) -> Result<Vec<(String, Value)>, FixtureError> {
        let dir = self.pack_path(pack).join(kind);
        let entries = std::fs::read_dir(&dir).map_err(|source| FixtureError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| FixtureError::Io {
                path: dir.clone(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".yaml") || name.ends_with(".yml") {
                files.push(name);
            }
        }
        files.sort();

        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        self.load_fixtures(pack, kind, &refs)
    }
}
