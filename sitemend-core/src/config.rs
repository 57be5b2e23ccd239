// Site configuration loaded from sitemend.toml

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use sitemend_scanner::SitemapEntry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

pub const CONFIG_FILE_NAME: &str = "sitemend.toml";

/// Everything that used to be hard-coded in the maintenance scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory the site is served from.
    pub site_root: PathBuf,
    /// Absolute URL prefix of the site, e.g. `https://www.example.com`.
    /// Inferred from the first sitemap entry when unset.
    pub origin: Option<String>,
    /// Other spellings of the origin that links may still use.
    pub alt_origins: Vec<String>,
    /// Sitemap location, relative to `site_root` unless absolute.
    pub sitemap: PathBuf,
    /// File served for directory URLs.
    pub index_file: String,
    pub skip_patterns: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_root: PathBuf::from("."),
            origin: None,
            alt_origins: Vec::new(),
            sitemap: PathBuf::from("sitemap.xml"),
            index_file: "index.html".to_string(),
            skip_patterns: vec!["node_modules".to_string()],
        }
    }
}

impl SiteConfig {
    /// Load a config file. A relative `site_root` is taken relative to the
    /// directory holding the file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| CoreError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut config: SiteConfig = toml::from_str(&contents).map_err(|e| CoreError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.expand_paths();
        if config.site_root.is_relative()
            && let Some(parent) = path.parent()
        {
            config.site_root = parent.join(&config.site_root);
        }

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Use `dir/sitemend.toml` when present, otherwise defaults rooted at `dir`.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            Ok(Self {
                site_root: dir.to_path_buf(),
                ..Self::default()
            })
        }
    }

    /// Expand a leading `~` in the path fields.
    pub fn expand_paths(&mut self) {
        self.site_root = expand_tilde(&self.site_root);
        self.sitemap = expand_tilde(&self.sitemap);
    }

    pub fn sitemap_path(&self) -> PathBuf {
        if self.sitemap.is_absolute() {
            self.sitemap.clone()
        } else {
            self.site_root.join(&self.sitemap)
        }
    }

    /// The configured origin without a trailing slash.
    pub fn origin(&self) -> Option<&str> {
        self.origin
            .as_deref()
            .map(|o| o.trim_end_matches('/'))
            .filter(|o| !o.is_empty())
    }

    /// Fill in `origin` from the first sitemap entry if it was not configured.
    pub fn ensure_origin(&mut self, entries: &[SitemapEntry]) -> Result<String> {
        if let Some(origin) = self.origin() {
            return Ok(origin.to_string());
        }

        let first = entries.first().ok_or_else(|| {
            CoreError::Origin("no origin configured and the sitemap is empty".to_string())
        })?;
        let inferred = infer_origin(&first.loc)?;
        info!("Inferred site origin {} from sitemap", inferred);
        self.origin = Some(inferred.clone());
        Ok(inferred)
    }

    /// Every known spelling of the origin, configured one first.
    pub fn all_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = self.origin().map(String::from).into_iter().collect();
        for alt in &self.alt_origins {
            let alt = alt.trim_end_matches('/').to_string();
            if !alt.is_empty() && !origins.contains(&alt) {
                origins.push(alt);
            }
        }
        origins
    }

    /// Commented template written by `sitemend init`.
    pub fn template() -> String {
        let defaults = Self::default();
        format!(
            r#"# Sitemend configuration

# Directory the site is served from (relative to this file).
site_root = "."

# Absolute URL prefix of the site. Inferred from the first sitemap entry when omitted.
# origin = "https://www.example.com"

# Other spellings of the origin still found in links.
# alt_origins = ["https://example.com"]

# Sitemap location, relative to site_root.
sitemap = "{}"

# File served for directory URLs.
index_file = "{}"

# Path components or path suffixes to leave alone during batch rewrites.
skip_patterns = [{}]
"#,
            defaults.sitemap.display(),
            defaults.index_file,
            defaults
                .skip_patterns
                .iter()
                .map(|p| format!("\"{}\"", p))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// The `scheme://authority` prefix of an absolute URL, spelled as written.
///
/// The URL is validated first, but the prefix is sliced from the original
/// text so that host case and an explicit default port survive and the
/// origin still prefixes the entry it came from.
pub fn infer_origin(url: &str) -> Result<String> {
    let parsed =
        Url::parse(url).map_err(|e| CoreError::Origin(format!("'{}' is not a URL: {}", url, e)))?;
    if !parsed.origin().is_tuple() {
        return Err(CoreError::Origin(format!("'{}' has no host", url)));
    }

    let url = url.trim();
    let authority_start = url
        .find("://")
        .map(|i| i + 3)
        .ok_or_else(|| CoreError::Origin(format!("'{}' has no authority", url)))?;
    let authority_end = url[authority_start..]
        .find(['/', '?', '#'])
        .map_or(url.len(), |i| authority_start + i);
    Ok(url[..authority_end].to_string())
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => path.to_path_buf(),
    }
}
