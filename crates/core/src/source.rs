//! Boundaries to the collaborators that feed the pipeline: page text and
//! per-reference byte sizes. Network-backed implementations live in the CLI.

use std::path::{Path, PathBuf};

use anyhow::Context;

/// Supplies the raw text of a page.
///
/// Implementations must not fail past this boundary: any error is logged and
/// reported as empty text, which the pipeline rejects as an empty page.
pub trait PageSource {
    fn fetch(&self, target: &str) -> String;
}

/// Resolves the byte size of a single absolute `http(s)` reference.
///
/// `Ok(None)` means the size could not be determined. Both `None` and `Err`
/// contribute zero bytes to the enclosing finding.
pub trait SizeResolver: Send + Sync {
    fn resolve(&self, url: &str) -> anyhow::Result<Option<u64>>;
}

/// Reads page text from a local file, ignoring the target passed to `fetch`.
#[derive(Debug, Clone)]
pub struct FilePageSource {
    path: PathBuf,
}

impl FilePageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(path: &Path) -> anyhow::Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
    }
}

impl PageSource for FilePageSource {
    fn fetch(&self, _target: &str) -> String {
        match Self::read(&self.path) {
            Ok(text) => text,
            Err(e) => {
                log::error!("failed to load page text: {e:#}");
                String::new()
            }
        }
    }
}

/// Page source backed by an in-memory string.
#[derive(Debug, Clone, Default)]
pub struct StaticPageSource(pub String);

impl PageSource for StaticPageSource {
    fn fetch(&self, _target: &str) -> String {
        self.0.clone()
    }
}
