use crate::error::{Result, ScanError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Enumerates the pages of a site tree.
///
/// Hidden entries (a component starting with `.`) are always skipped. A skip
/// pattern matches either a whole path component (`node_modules`, `admin`)
/// or the tail of a relative path (`blog/post-template.html`).
#[derive(Debug, Clone)]
pub struct HtmlWalker {
    skip_patterns: Vec<String>,
    extension: String,
}

impl HtmlWalker {
    pub fn new() -> Self {
        Self {
            skip_patterns: Vec::new(),
            extension: "html".to_string(),
        }
    }

    pub fn with_skip_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Walk `root` and return matching files, sorted by path.
    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(ScanError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("site root is not a directory: {}", root.display()),
            )));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.skips_component(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.has_extension(entry.path()) {
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if self.is_skipped(relative) {
                debug!("Skipping {}", relative.display());
                continue;
            }

            files.push(entry.into_path());
        }

        files.sort();
        debug!("Found {} .{} files under {}", files.len(), self.extension, root.display());
        Ok(files)
    }

    /// Whether a path relative to the site root is excluded.
    pub fn is_skipped(&self, relative: &Path) -> bool {
        let rel_posix = relative.to_string_lossy().replace('\\', "/");

        if rel_posix
            .split('/')
            .any(|part| part.starts_with('.') || self.skip_patterns.iter().any(|p| p == part))
        {
            return true;
        }

        self.skip_patterns.iter().any(|pattern| {
            let pattern = pattern.trim_matches('/');
            !pattern.is_empty()
                && (rel_posix == pattern || rel_posix.ends_with(&format!("/{}", pattern)))
        })
    }

    fn skips_component(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.skip_patterns.iter().any(|p| *p == name)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

impl Default for HtmlWalker {
    fn default() -> Self {
        Self::new()
    }
}
