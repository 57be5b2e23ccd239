// Idempotent batch text rewrites over the site's HTML files

use crate::config::SiteConfig;
use crate::error::{CoreError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::{Captures, Regex};
use serde::Serialize;
use sitemend_scanner::HtmlWalker;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// `OLD=NEW` pair for link remapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkMapping {
    pub from: String,
    pub to: String,
}

impl LinkMapping {
    pub fn parse(pair: &str) -> Result<Self> {
        let (from, to) = pair.split_once('=').ok_or_else(|| {
            CoreError::InvalidRewrite(pair.to_string(), "expected OLD=NEW".to_string())
        })?;
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(CoreError::InvalidRewrite(
                pair.to_string(),
                "both sides must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Read `OLD=NEW` lines, ignoring blanks and `#` comments.
pub fn load_mappings(path: &Path) -> Result<Vec<LinkMapping>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(LinkMapping::parse)
        .collect()
}

/// A content transform that leaves already-rewritten files untouched.
#[derive(Debug, Clone)]
pub enum Rewrite {
    /// `<asset>?v=<digits>` becomes `<asset>?v=<version>`.
    AssetVersion {
        asset: String,
        version: u32,
        pattern: Regex,
    },
    Literal {
        from: String,
        to: String,
        pattern: Option<Regex>,
    },
    /// Every match of `pattern` becomes `to`, taken literally.
    Pattern { pattern: Regex, to: String },
    /// Old internal paths to new ones, absolute forms included.
    RemapLinks {
        mappings: Vec<LinkMapping>,
        origins: Vec<String>,
        canonical_origin: Option<String>,
    },
    /// Insert a snippet before `</head>` unless `marker` is already present.
    InjectHead { snippet: String, marker: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Changed(String),
    Unchanged,
    Skipped(String),
}

impl Rewrite {
    pub fn asset_version(asset: &str, version: u32) -> Result<Self> {
        let asset = asset.trim();
        if asset.is_empty() {
            return Err(CoreError::InvalidRewrite(
                "bump-version".to_string(),
                "asset name is empty".to_string(),
            ));
        }
        // The asset name must start a path segment or attribute value so
        // `site.css` never touches `mysite.css`.
        let pattern = Regex::new(&format!(
            r#"(^|[/"'=\s]){}\?v=\d+"#,
            regex::escape(asset)
        ))?;
        Ok(Rewrite::AssetVersion {
            asset: asset.to_string(),
            version,
            pattern,
        })
    }

    pub fn literal(from: &str, to: &str, ignore_case: bool) -> Result<Self> {
        if from.is_empty() {
            return Err(CoreError::InvalidRewrite(
                "replace".to_string(),
                "search text is empty".to_string(),
            ));
        }
        let contains = if ignore_case {
            to.to_lowercase().contains(&from.to_lowercase())
        } else {
            to.contains(from)
        };
        if contains {
            return Err(CoreError::InvalidRewrite(
                format!("{} -> {}", from, to),
                "replacement contains the search text, so re-running would apply it again"
                    .to_string(),
            ));
        }

        let pattern = if ignore_case {
            Some(Regex::new(&format!("(?i){}", regex::escape(from)))?)
        } else {
            None
        };
        Ok(Rewrite::Literal {
            from: from.to_string(),
            to: to.to_string(),
            pattern,
        })
    }

    pub fn pattern(regex: &str, to: &str, ignore_case: bool) -> Result<Self> {
        if regex.is_empty() {
            return Err(CoreError::InvalidRewrite(
                "replace".to_string(),
                "pattern is empty".to_string(),
            ));
        }
        let pattern = if ignore_case {
            Regex::new(&format!("(?i){}", regex))?
        } else {
            Regex::new(regex)?
        };
        if pattern.is_match(to) || pattern.is_match("") {
            return Err(CoreError::InvalidRewrite(
                format!("/{}/ -> {}", regex, to),
                "pattern matches the replacement (or nothing at all), so re-running would apply it again"
                    .to_string(),
            ));
        }
        Ok(Rewrite::Pattern {
            pattern,
            to: to.to_string(),
        })
    }

    pub fn remap_links(
        mappings: Vec<LinkMapping>,
        origins: Vec<String>,
        canonical_origin: Option<String>,
    ) -> Result<Self> {
        if mappings.is_empty() {
            return Err(CoreError::InvalidRewrite(
                "remap".to_string(),
                "no mappings given".to_string(),
            ));
        }
        for target in &mappings {
            if let Some(source) = mappings.iter().find(|m| target.to.contains(&m.from)) {
                return Err(CoreError::InvalidRewrite(
                    format!("{}={}", target.from, target.to),
                    format!(
                        "target contains '{}', so re-running would rewrite it again",
                        source.from
                    ),
                ));
            }
        }

        Ok(Rewrite::RemapLinks {
            mappings,
            origins: origins
                .into_iter()
                .map(|o| o.trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            canonical_origin: canonical_origin.map(|o| o.trim_end_matches('/').to_string()),
        })
    }

    pub fn inject_head(snippet: &str, marker: &str) -> Result<Self> {
        if marker.trim().is_empty() {
            return Err(CoreError::InvalidRewrite(
                "inject".to_string(),
                "marker is empty".to_string(),
            ));
        }
        if !snippet.contains(marker) {
            return Err(CoreError::InvalidRewrite(
                "inject".to_string(),
                format!("snippet does not contain the marker '{}'", marker),
            ));
        }
        Ok(Rewrite::InjectHead {
            snippet: snippet.to_string(),
            marker: marker.to_string(),
        })
    }

    pub fn describe(&self) -> String {
        match self {
            Rewrite::AssetVersion { asset, version, .. } => {
                format!("BUMP {} TO v={}", asset, version)
            }
            Rewrite::Literal { from, to, .. } => format!("REPLACE '{}' WITH '{}'", from, to),
            Rewrite::Pattern { pattern, to } => {
                format!("REPLACE /{}/ WITH '{}'", pattern.as_str(), to)
            }
            Rewrite::RemapLinks { mappings, .. } => {
                format!("REMAP {} LINK PATH(S)", mappings.len())
            }
            Rewrite::InjectHead { marker, .. } => format!("INJECT HEAD SNIPPET ({})", marker),
        }
    }

    pub fn apply(&self, content: &str) -> RewriteOutcome {
        let updated = match self {
            Rewrite::AssetVersion {
                asset,
                version,
                pattern,
            } => pattern
                .replace_all(content, |caps: &Captures| {
                    format!("{}{}?v={}", &caps[1], asset, version)
                })
                .into_owned(),
            Rewrite::Literal { from, to, pattern } => match pattern {
                Some(pattern) => pattern
                    .replace_all(content, regex::NoExpand(to))
                    .into_owned(),
                None => content.replace(from.as_str(), to),
            },
            Rewrite::Pattern { pattern, to } => pattern
                .replace_all(content, regex::NoExpand(to))
                .into_owned(),
            Rewrite::RemapLinks {
                mappings,
                origins,
                canonical_origin,
            } => {
                let mut updated = content.to_string();
                for mapping in mappings {
                    if let Some(canonical) = canonical_origin {
                        let target = format!("{}{}", canonical, mapping.to);
                        for origin in origins {
                            updated = updated.replace(&format!("{}{}", origin, mapping.from), &target);
                        }
                    }
                    updated = updated.replace(&mapping.from, &mapping.to);
                }
                updated
            }
            Rewrite::InjectHead { snippet, marker } => {
                if content.contains(marker.as_str()) {
                    return RewriteOutcome::Skipped("already present".to_string());
                }
                if !content.contains("</head>") {
                    return RewriteOutcome::Skipped("no </head> tag".to_string());
                }
                content.replacen("</head>", &format!("{}</head>", snippet), 1)
            }
        };

        if updated == content {
            RewriteOutcome::Unchanged
        } else {
            RewriteOutcome::Changed(updated)
        }
    }
}

pub struct BatchOptions {
    pub dry_run: bool,
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            show_progress: true,
        }
    }
}

/// Outcome of one rewrite over a set of files. Paths are relative to the
/// site root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub description: String,
    pub dry_run: bool,
    pub scanned: usize,
    pub updated: Vec<PathBuf>,
    pub unchanged: usize,
    pub skipped: Vec<(PathBuf, String)>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Apply `rewrite` to each file, writing only files whose content changes.
pub fn run_batch(
    root: &Path,
    files: &[PathBuf],
    rewrite: &Rewrite,
    options: &BatchOptions,
) -> BatchSummary {
    let progress_bar = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut summary = BatchSummary {
        description: rewrite.describe(),
        dry_run: options.dry_run,
        ..Default::default()
    };

    for (idx, file) in files.iter().enumerate() {
        let relative = file.strip_prefix(root).unwrap_or(file).to_path_buf();
        if let Some(ref pb) = progress_bar {
            pb.set_message(format!(
                "Rewriting {}/{}: {}",
                idx + 1,
                files.len(),
                relative.display()
            ));
        }
        summary.scanned += 1;

        let content = match fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                warn!("Error reading {}: {}", file.display(), e);
                summary.failed.push((relative, e.to_string()));
                continue;
            }
        };

        match rewrite.apply(&content) {
            RewriteOutcome::Unchanged => summary.unchanged += 1,
            RewriteOutcome::Skipped(reason) => {
                debug!("Skipping {}: {}", relative.display(), reason);
                summary.skipped.push((relative, reason));
            }
            RewriteOutcome::Changed(updated) => {
                if options.dry_run {
                    summary.updated.push(relative);
                } else if let Err(e) = fs::write(file, updated) {
                    warn!("Error writing {}: {}", file.display(), e);
                    summary.failed.push((relative, e.to_string()));
                } else {
                    debug!("Updated {}", relative.display());
                    summary.updated.push(relative);
                }
            }
        }
    }

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    info!(
        "{}: {} of {} files updated",
        summary.description,
        summary.updated.len(),
        summary.scanned
    );
    summary
}

/// Walk the configured site root and apply `rewrite` to every HTML page.
pub fn rewrite_site(
    config: &SiteConfig,
    rewrite: &Rewrite,
    options: &BatchOptions,
) -> Result<BatchSummary> {
    let files = HtmlWalker::new()
        .with_skip_patterns(config.skip_patterns.iter().cloned())
        .walk(&config.site_root)?;
    Ok(run_batch(&config.site_root, &files, rewrite, options))
}
