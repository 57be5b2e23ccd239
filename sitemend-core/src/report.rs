// Report generation for audits and batch rewrites

use crate::audit::{AuditOutcome, AuditRecord};
use crate::rewrite::BatchSummary;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEAVY_RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Everything one audit run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub sitemap: String,
    pub origin: String,
    pub check_only: bool,
    pub records: Vec<AuditRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditCounts {
    pub correct: usize,
    pub fixed: usize,
    pub unfixable: usize,
    pub drift: usize,
    pub missing: usize,
    pub total: usize,
    pub outside_origin: usize,
    pub multiple_canonicals: usize,
}

impl AuditCounts {
    pub fn from_records(records: &[AuditRecord]) -> Self {
        let mut counts = AuditCounts {
            total: records.len(),
            ..Default::default()
        };

        for record in records {
            match record.outcome {
                AuditOutcome::Correct => counts.correct += 1,
                AuditOutcome::Fixed { .. } => counts.fixed += 1,
                AuditOutcome::Drift { .. } => counts.drift += 1,
                AuditOutcome::Missing => counts.missing += 1,
                AuditOutcome::FixFailed { .. }
                | AuditOutcome::NoCanonical
                | AuditOutcome::Unreadable { .. }
                | AuditOutcome::OutsideRoot => counts.unfixable += 1,
            }
            if !record.origin_matched {
                counts.outside_origin += 1;
            }
            if record.canonical_tags > 1 {
                counts.multiple_canonicals += 1;
            }
        }

        counts
    }
}

impl AuditReport {
    pub fn counts(&self) -> AuditCounts {
        AuditCounts::from_records(&self.records)
    }

    /// Files written during the run.
    pub fn writes(&self) -> usize {
        self.counts().fixed
    }

    pub fn has_unfixable(&self) -> bool {
        self.records.iter().any(|r| r.outcome.is_unfixable())
    }
}

pub fn generate_text_report(report: &AuditReport) -> String {
    let counts = report.counts();
    let mut out = String::new();

    out.push_str(HEAVY_RULE);
    out.push('\n');
    out.push_str("                          CANONICAL URL AUDIT\n");
    out.push_str(HEAVY_RULE);
    out.push_str("\n\n");

    out.push_str(&format!("Sitemap:   {}\n", report.sitemap));
    out.push_str(&format!("Origin:    {}\n", report.origin));
    out.push_str(&format!(
        "Mode:      {}\n",
        if report.check_only {
            "check (no files written)"
        } else {
            "fix"
        }
    ));
    out.push_str(&format!("Entries:   {}\n\n", counts.total));

    for record in &report.records {
        out.push_str(&format_record(record));
    }

    section(&mut out, "SUMMARY");
    out.push_str(&format!("  Correct:     {}\n", counts.correct));
    out.push_str(&format!("  Fixed:       {}\n", counts.fixed));
    out.push_str(&format!("  Unfixable:   {}\n", counts.unfixable));
    if report.check_only {
        out.push_str(&format!("  Drift:       {}\n", counts.drift));
    } else {
        out.push_str(&format!("  Writes:      {}\n", report.writes()));
    }
    out.push_str(&format!("  Missing:     {}\n", counts.missing));
    out.push_str(&format!("  Total URLs:  {}\n", counts.total));

    if counts.missing > 0 {
        section(&mut out, "MISSING FILES (in sitemap but not on disk)");
        for record in report
            .records
            .iter()
            .filter(|r| r.outcome == AuditOutcome::Missing)
        {
            out.push_str(&format!("  ✗ {} (URL: {})\n", record.path, record.url));
        }
    }

    if counts.outside_origin > 0 {
        section(&mut out, "OUTSIDE ORIGIN (resolved as relative paths)");
        for record in report.records.iter().filter(|r| !r.origin_matched) {
            out.push_str(&format!("  ? {} -> {}\n", record.url, record.path));
        }
    }

    if counts.multiple_canonicals > 0 {
        section(&mut out, "MULTIPLE CANONICAL TAGS (only the first is reconciled)");
        for record in report.records.iter().filter(|r| r.canonical_tags > 1) {
            out.push_str(&format!(
                "  ⚠ {} ({} tags)\n",
                record.path, record.canonical_tags
            ));
        }
    }

    out.push('\n');
    if counts.unfixable > 0 {
        out.push_str("⚠ Some issues could not be fixed automatically. Review the entries above.\n");
    } else if counts.drift > 0 {
        out.push_str(&format!(
            "→ {} canonical URL(s) would be fixed.\n",
            counts.drift
        ));
    } else if counts.fixed > 0 {
        out.push_str(&format!("✓ Fixed {} canonical URL(s).\n", counts.fixed));
    } else {
        out.push_str("✓ All canonical URLs are correct.\n");
    }

    out
}

fn format_record(record: &AuditRecord) -> String {
    match &record.outcome {
        AuditOutcome::Correct => format!("✓ {}  correct\n", record.path),
        AuditOutcome::Missing => String::new(),
        AuditOutcome::NoCanonical => {
            let mut s = format!(
                "✗ {}\n    Sitemap:   {}\n    Issue:     no canonical tag\n",
                record.path, record.url
            );
            if record.canonical_tags > 0 {
                s.push_str("    Note:      a canonical link exists in an unrecognised form\n");
            }
            s.push('\n');
            s
        }
        AuditOutcome::OutsideRoot => format!(
            "✗ {}\n    Sitemap:   {}\n    Issue:     resolves outside the site root\n\n",
            record.path, record.url
        ),
        AuditOutcome::Unreadable { reason } => format!(
            "✗ {}\n    Sitemap:   {}\n    Issue:     unreadable ({})\n\n",
            record.path, record.url, reason
        ),
        AuditOutcome::Fixed { declared } => format!(
            "⚠ {}\n    Sitemap:   {}\n    Canonical: {}\n    ✓ fixed\n\n",
            record.path, record.url, declared
        ),
        AuditOutcome::FixFailed { declared, reason } => format!(
            "⚠ {}\n    Sitemap:   {}\n    Canonical: {}\n    ✗ fix failed: {}\n\n",
            record.path, record.url, declared, reason
        ),
        AuditOutcome::Drift { declared } => format!(
            "⚠ {}\n    Sitemap:   {}\n    Canonical: {}\n    → would fix\n\n",
            record.path, record.url, declared
        ),
    }
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(HEAVY_RULE);
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(HEAVY_RULE);
    out.push('\n');
}

pub fn generate_json_report(report: &AuditReport) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Sitemend",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "sitemap": report.sitemap,
            "origin": report.origin,
            "check_only": report.check_only,
            "summary": report.counts(),
            "records": report.records,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_batch_report(summary: &BatchSummary) -> String {
    let mut out = String::new();

    out.push_str(HEAVY_RULE);
    out.push('\n');
    out.push_str(&format!("  {}\n", summary.description));
    out.push_str(HEAVY_RULE);
    out.push_str("\n\n");

    let updated_label = if summary.dry_run {
        "Would update:"
    } else {
        "Updated:"
    };
    out.push_str(&format!("  Files scanned:  {}\n", summary.scanned));
    out.push_str(&format!("  {:<15} {}\n", updated_label, summary.updated.len()));
    out.push_str(&format!("  Unchanged:      {}\n", summary.unchanged));
    out.push_str(&format!("  Skipped:        {}\n", summary.skipped.len()));
    out.push_str(&format!("  Failed:         {}\n", summary.failed.len()));

    if !summary.updated.is_empty() {
        out.push('\n');
        for path in &summary.updated {
            out.push_str(&format!("  ✓ {}\n", path.display()));
        }
    }

    if !summary.skipped.is_empty() {
        out.push('\n');
        for (path, reason) in &summary.skipped {
            out.push_str(&format!("  → {} ({})\n", path.display(), reason));
        }
    }

    if !summary.failed.is_empty() {
        out.push('\n');
        for (path, error) in &summary.failed {
            out.push_str(&format!("  ✗ {}: {}\n", path.display(), error));
        }
    }

    out
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
