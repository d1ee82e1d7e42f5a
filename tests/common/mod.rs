//! Throwaway document roots for tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub struct TempRoot {
    pub base: PathBuf,
}

impl TempRoot {
    /// Creates an empty directory unique to this test process and `name`.
    pub fn new(name: &str) -> Self {
        let base = std::env::temp_dir().join(format!("docserve-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&base);
        std::fs::create_dir_all(&base).unwrap();
        Self { base }
    }

    pub fn path(&self) -> &Path {
        &self.base
    }

    /// Writes `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.base.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.base.join(rel);
        std::fs::create_dir_all(&path).unwrap();
        path
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.base);
    }
}
