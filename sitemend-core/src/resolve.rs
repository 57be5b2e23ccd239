use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Extensions served as pages in their own right, besides the index file's.
const PAGE_EXTENSIONS: [&str; 2] = ["html", "htm"];

/// Where on disk a sitemap URL is expected to be served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPath {
    /// Path relative to the site root, `/`-separated.
    pub relative: String,
    /// False when the URL did not start with the site origin and was passed
    /// through unchanged.
    pub origin_matched: bool,
}

impl ResolvedPath {
    pub fn under(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.relative)
    }

    /// False when the path climbs out of the site root (`..`) or is absolute.
    pub fn stays_under_root(&self) -> bool {
        Path::new(&self.relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    }
}

/// Map an absolute URL to the file expected to serve it.
///
/// * origin root → `index_file`
/// * last segment ends in a page extension (`.html`, `.htm` or the index
///   file's own) → that path verbatim
/// * trailing slash → `<path>index_file`
/// * anything else → `<path>/index_file`
///
/// The origin is matched without regard to ASCII case. URLs outside `origin`
/// are resolved as if they were already relative.
pub fn resolve_path(url: &str, origin: &str, index_file: &str) -> ResolvedPath {
    let origin = origin.trim_end_matches('/');
    let (path, origin_matched) = match strip_origin(url, origin) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => (rest, true),
        _ => (url, false),
    };

    let trimmed = path.trim_start_matches('/');
    let relative = if trimmed.is_empty() {
        index_file.to_string()
    } else {
        let last_segment = trimmed.rsplit('/').next().unwrap_or_default();

        if is_page(last_segment, index_file) {
            trimmed.to_string()
        } else if trimmed.ends_with('/') {
            format!("{}{}", trimmed, index_file)
        } else {
            format!("{}/{}", trimmed, index_file)
        }
    };

    ResolvedPath {
        relative,
        origin_matched,
    }
}

fn strip_origin<'a>(url: &'a str, origin: &str) -> Option<&'a str> {
    if origin.is_empty() {
        return None;
    }
    url.get(..origin.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(origin))
        .map(|_| &url[origin.len()..])
}

// A dotted slug such as `web-2.0` is a directory, not a file.
fn is_page(segment: &str, index_file: &str) -> bool {
    let Some(ext) = Path::new(segment).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let index_ext = Path::new(index_file).extension().and_then(|e| e.to_str());
    PAGE_EXTENSIONS
        .iter()
        .copied()
        .chain(index_ext)
        .any(|page_ext| ext.eq_ignore_ascii_case(page_ext))
}
