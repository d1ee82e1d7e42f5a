//! Maps request URLs onto files below the document root.

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;

/// Appended to URLs ending in "/".
pub const INDEX_FILE: &str = "index.html";

/// A regular file inside the document root, with the metadata the response
/// headers need.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

#[derive(Debug)]
pub enum Resolution {
    Found(ResolvedFile),
    /// Missing file, directory, or a path escaping the root.
    NotFound,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
}

impl Resolver {
    /// Validates that `doc_root` exists and is a directory, and remembers its
    /// absolute, normalized form.
    pub fn new(doc_root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let doc_root = doc_root.as_ref();
        let root = absolutize(doc_root)
            .with_context(|| format!("invalid document root {}", doc_root.display()))?;

        let meta = std::fs::metadata(&root)
            .with_context(|| format!("document root {} does not exist", root.display()))?;
        if !meta.is_dir() {
            anyhow::bail!("document root {} is not a directory", root.display());
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds the absolute path a URL points at, without touching the
    /// filesystem.
    pub fn candidate(&self, url: &str) -> io::Result<PathBuf> {
        let mut joined = OsString::from(self.root.as_os_str());
        joined.push(url);
        if url.ends_with('/') {
            joined.push(INDEX_FILE);
        }
        absolutize(Path::new(&joined))
    }

    /// Plain textual prefix test against the root.
    ///
    /// This also accepts siblings sharing the root's name as a prefix, e.g.
    /// `/srv/www-private` for a root of `/srv/www`.
    pub fn is_within_root(&self, path: &Path) -> bool {
        path.as_os_str()
            .as_encoded_bytes()
            .starts_with(self.root.as_os_str().as_encoded_bytes())
    }

    pub async fn resolve(&self, url: &str) -> Resolution {
        let path = match self.candidate(url) {
            Ok(path) => path,
            Err(_) => return Resolution::NotFound,
        };

        if !self.is_within_root(&path) {
            tracing::debug!(url, path = %path.display(), "path escapes document root");
            return Resolution::NotFound;
        }

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Resolution::Found(ResolvedFile {
                modified: meta.modified().unwrap_or(UNIX_EPOCH),
                size: meta.len(),
                path,
            }),
            _ => Resolution::NotFound,
        }
    }
}

/// Turns `path` into an absolute path and folds away `.` and `..` segments
/// lexically. `..` at the filesystem root stays at the root.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }

    Ok(out)
}
