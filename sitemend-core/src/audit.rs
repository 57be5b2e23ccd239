// Canonical URL reconciliation against the sitemap

use crate::config::SiteConfig;
use crate::error::{CoreError, Result};
use crate::report::AuditReport;
use crate::resolve::resolve_path;
use serde::{Deserialize, Serialize};
use sitemend_scanner::{
    SitemapEntry, count_canonical_tags, extract_canonical, load_sitemap, replace_canonical,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What happened to one sitemap entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Correct,
    Fixed { declared: String },
    FixFailed { declared: String, reason: String },
    /// Mismatch left in place because the run was check-only.
    Drift { declared: String },
    NoCanonical,
    Missing,
    Unreadable { reason: String },
    /// The URL resolves to a path above the site root; never read or written.
    OutsideRoot,
}

impl AuditOutcome {
    /// Problems a re-run will not resolve on its own.
    pub fn is_unfixable(&self) -> bool {
        matches!(
            self,
            AuditOutcome::FixFailed { .. }
                | AuditOutcome::NoCanonical
                | AuditOutcome::Unreadable { .. }
                | AuditOutcome::OutsideRoot
        )
    }

    pub fn declared(&self) -> Option<&str> {
        match self {
            AuditOutcome::Fixed { declared }
            | AuditOutcome::FixFailed { declared, .. }
            | AuditOutcome::Drift { declared } => Some(declared),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub url: String,
    /// Resolved file, relative to the site root.
    pub path: String,
    pub origin_matched: bool,
    /// Canonical link elements found by the structural parse.
    pub canonical_tags: usize,
    #[serde(flatten)]
    pub outcome: AuditOutcome,
}

/// Reconciles declared canonical URLs with sitemap entries.
pub struct Auditor {
    site_root: PathBuf,
    origin: String,
    index_file: String,
    check_only: bool,
}

impl Auditor {
    pub fn new(site_root: impl Into<PathBuf>, origin: impl Into<String>) -> Self {
        Self {
            site_root: site_root.into(),
            origin: origin.into().trim_end_matches('/').to_string(),
            index_file: "index.html".to_string(),
            check_only: false,
        }
    }

    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        let origin = config
            .origin()
            .ok_or_else(|| CoreError::Origin("no origin configured".to_string()))?;
        Ok(Self::new(&config.site_root, origin).with_index_file(&config.index_file))
    }

    pub fn with_index_file(mut self, index_file: &str) -> Self {
        self.index_file = index_file.to_string();
        self
    }

    /// Report mismatches without writing anything.
    pub fn with_check_only(mut self, check_only: bool) -> Self {
        self.check_only = check_only;
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn audit(&self, entries: &[SitemapEntry]) -> Vec<AuditRecord> {
        entries.iter().map(|entry| self.audit_entry(entry)).collect()
    }

    pub fn audit_entry(&self, entry: &SitemapEntry) -> AuditRecord {
        let resolved = resolve_path(&entry.loc, &self.origin, &self.index_file);
        if !resolved.origin_matched {
            warn!(
                "{} is outside {}; resolving it as a relative path",
                entry.loc, self.origin
            );
        }

        let file = resolved.under(&self.site_root);
        let contained = resolved.stays_under_root();
        let mut record = AuditRecord {
            url: entry.loc.clone(),
            path: resolved.relative,
            origin_matched: resolved.origin_matched,
            canonical_tags: 0,
            outcome: AuditOutcome::Missing,
        };

        if !contained {
            warn!(
                "{} resolves to {}, outside the site root; leaving it alone",
                entry.loc, record.path
            );
            record.outcome = AuditOutcome::OutsideRoot;
            return record;
        }

        if !file.is_file() {
            debug!("{} not found for {}", file.display(), entry.loc);
            return record;
        }

        let content = match fs::read_to_string(&file) {
            Ok(content) => content,
            Err(e) => {
                warn!("Error reading {}: {}", file.display(), e);
                record.outcome = AuditOutcome::Unreadable {
                    reason: e.to_string(),
                };
                return record;
            }
        };

        record.canonical_tags = count_canonical_tags(&content);
        if record.canonical_tags > 1 {
            warn!(
                "{} declares {} canonical tags; only the first is reconciled",
                record.path, record.canonical_tags
            );
        }

        record.outcome = match extract_canonical(&content) {
            None => AuditOutcome::NoCanonical,
            Some(declared) if declared == entry.loc => AuditOutcome::Correct,
            Some(declared) if self.check_only => AuditOutcome::Drift { declared },
            Some(declared) => self.fix_file(&file, &entry.loc, declared),
        };
        record
    }

    /// Rewrite the first canonical tag in `file` to `url`.
    ///
    /// The file is read again first, so a tag that changed since
    /// classification (or a file that vanished) ends up as `FixFailed`
    /// instead of being overwritten.
    pub fn fix_file(&self, file: &Path, url: &str, declared: String) -> AuditOutcome {
        let current = match fs::read_to_string(file) {
            Ok(current) => current,
            Err(e) => {
                warn!("Error re-reading {}: {}", file.display(), e);
                return AuditOutcome::FixFailed {
                    declared,
                    reason: e.to_string(),
                };
            }
        };

        let Some(updated) = replace_canonical(&current, url) else {
            return AuditOutcome::FixFailed {
                declared,
                reason: "canonical tag changed since it was read".to_string(),
            };
        };

        match fs::write(file, updated) {
            Ok(()) => {
                info!("Fixed canonical in {}: {} -> {}", file.display(), declared, url);
                AuditOutcome::Fixed { declared }
            }
            Err(e) => {
                warn!("Error writing {}: {}", file.display(), e);
                AuditOutcome::FixFailed {
                    declared,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Load the configured sitemap and reconcile every entry.
///
/// Sitemap and origin problems are fatal; everything per-file ends up in
/// the returned report.
pub fn run_audit(config: &mut SiteConfig, check_only: bool) -> Result<AuditReport> {
    let sitemap_path = config.sitemap_path();
    let entries = load_sitemap(&sitemap_path)?;
    config.ensure_origin(&entries)?;

    let auditor = Auditor::from_config(config)?.with_check_only(check_only);
    info!(
        "Auditing {} sitemap entries against {}",
        entries.len(),
        config.site_root.display()
    );

    let records = auditor.audit(&entries);
    Ok(AuditReport {
        sitemap: sitemap_path.display().to_string(),
        origin: auditor.origin().to_string(),
        check_only,
        records,
    })
}
