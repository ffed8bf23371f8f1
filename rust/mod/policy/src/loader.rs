use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Extensions of content metadata files.
pub const ALLOWED_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// ContentLoader walks a packs directory. Each pack is a subdirectory and
/// keeps its content grouped by kind:
///
/// ```text
/// packs/
/// ├── core/policytypes/concurrency.yaml
/// ├── core/policies/local_concurrency.yaml
/// └── linux/policies/file_watch.yml
/// ```
pub struct ContentLoader;

impl ContentLoader {
    /// Pack directories under `base`, as `(pack name, path)` sorted by name.
    /// A missing base directory holds no packs.
    pub fn packs(base: &Path) -> Result<Vec<(String, PathBuf)>, LoaderError> {
        if !base.is_dir() {
            debug!("ContentLoader: packs dir {:?} does not exist, skipping", base);
            return Ok(Vec::new());
        }

        let mut packs = Vec::new();
        for entry in read_dir(base)? {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            if name.is_empty() || name.starts_with('.') {
                continue;
            }
            packs.push((name, path));
        }
        packs.sort();
        Ok(packs)
    }

    /// Metadata files of one kind (`policytypes`, `policies`) in a pack,
    /// sorted by path.
    pub fn resources(pack_dir: &Path, kind: &str) -> Result<Vec<PathBuf>, LoaderError> {
        let dir = pack_dir.join(kind);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in read_dir(&dir)? {
            let path = entry.path();
            if path.is_file() && Self::is_allowed(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Parse a metadata file into JSON. `.json` files are read as JSON,
    /// everything else as YAML.
    pub fn load(path: &Path) -> Result<Value, LoaderError> {
        let text = fs::read_to_string(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = if extension(path) == "json" {
            serde_json::from_str(&text).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&text).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| LoaderError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn is_allowed(path: &Path) -> bool {
        ALLOWED_EXTENSIONS.contains(&extension(path).as_str())
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn read_dir(dir: &Path) -> Result<Vec<fs::DirEntry>, LoaderError> {
    let io_err = |source: std::io::Error| LoaderError::Io {
        path: dir.to_path_buf(),
        source,
    };
    fs::read_dir(dir)
        .map_err(io_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_packs_and_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let core = dir.path().join("core/policies");
        fs::create_dir_all(&core).unwrap();
        fs::write(core.join("a.yaml"), "name: a\n").unwrap();
        fs::write(core.join("b.json"), "{\"name\": \"b\"}").unwrap();
        fs::write(core.join("notes.txt"), "ignored").unwrap();
        fs::create_dir_all(dir.path().join("linux")).unwrap();
        fs::write(dir.path().join("README.md"), "not a pack").unwrap();

        let packs = ContentLoader::packs(dir.path()).unwrap();
        let names: Vec<&str> = packs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["core", "linux"]);

        let files = ContentLoader::resources(&packs[0].1, "policies").unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(ContentLoader::load(&files[0]).unwrap()["name"], "a");
        assert_eq!(ContentLoader::load(&files[1]).unwrap()["name"], "b");

        assert!(ContentLoader::resources(&packs[1].1, "policies").unwrap().is_empty());
    }

    #[test]
    fn missing_base_has_no_packs() {
        let packs = ContentLoader::packs(Path::new("/nonexistent/packs")).unwrap();
        assert!(packs.is_empty());
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "name: [unclosed\n").unwrap();
        let err = ContentLoader::load(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Parse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }
}
