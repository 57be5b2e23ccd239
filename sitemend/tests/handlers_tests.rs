use sitemend::commands::command_argument_builder;
use sitemend::handlers::*;
use sitemend_scanner::extract_canonical;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Parse a full command line and hand back the subcommand's matches.
fn sub_matches(argv: &[&str]) -> clap::ArgMatches {
    let matches = command_argument_builder()
        .try_get_matches_from(argv)
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();
    sub.clone()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn create_site() -> TempDir {
    let site = TempDir::new().unwrap();
    let root = site.path();
    fs::write(
        root.join("sitemap.xml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/about/</loc></url>
</urlset>
"#,
    )
    .unwrap();
    fs::write(
        root.join("index.html"),
        r#"<html><head><link rel="canonical" href="https://example.com/"><link href="/styles.css?v=1" rel="stylesheet"></head></html>"#,
    )
    .unwrap();
    fs::create_dir_all(root.join("about")).unwrap();
    fs::write(
        root.join("about/index.html"),
        r#"<html><head><link rel="canonical" href="https://example.com/about"></head></html>"#,
    )
    .unwrap();
    site
}

// ============================================================================
// Config Loading
// ============================================================================

#[test]
fn test_load_site_config_root_override() {
    let site = create_site();
    let args = sub_matches(&["sitemend", "audit", "-r", path_str(site.path())]);

    let config = load_site_config(&args).unwrap();
    assert_eq!(config.site_root, site.path());
}

#[test]
fn test_load_site_config_missing_root() {
    let site = TempDir::new().unwrap();
    let missing = site.path().join("nope");
    let args = sub_matches(&["sitemend", "audit", "-r", path_str(&missing)]);

    let result = load_site_config(&args);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not a directory"));
}

#[test]
fn test_load_site_config_from_file() {
    let site = create_site();
    let config_path = site.path().join("sitemend.toml");
    fs::write(&config_path, "origin = \"https://example.com\"\nindex_file = \"index.html\"\n").unwrap();
    let args = sub_matches(&["sitemend", "audit", "-c", path_str(&config_path)]);

    let config = load_site_config(&args).unwrap();
    assert_eq!(config.origin(), Some("https://example.com"));
}

#[test]
fn test_load_site_config_bad_file() {
    let site = create_site();
    let config_path = site.path().join("sitemend.toml");
    fs::write(&config_path, "origin = [\n").unwrap();
    let args = sub_matches(&["sitemend", "audit", "-c", path_str(&config_path)]);

    let err = load_site_config(&args).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to load config"));
}

// ============================================================================
// Audit
// ============================================================================

#[test]
fn test_audit_check_help_names_exit_status() {
    let mut cmd = command_argument_builder();
    let audit = cmd.find_subcommand_mut("audit").unwrap();
    let check = audit
        .get_arguments()
        .find(|a| a.get_id() == "check")
        .unwrap();
    let help = check.get_help().unwrap().to_string();
    assert!(help.contains("status 2"));
}

#[test]
fn test_handle_audit_fixes_then_converges() {
    let site = create_site();
    let argv = ["sitemend", "audit", "-r", path_str(site.path())];

    let first = handle_audit(&sub_matches(&argv), true).unwrap();
    assert_eq!(first.writes(), 1);
    let content = fs::read_to_string(site.path().join("about/index.html")).unwrap();
    assert_eq!(
        extract_canonical(&content).as_deref(),
        Some("https://example.com/about/")
    );

    let second = handle_audit(&sub_matches(&argv), true).unwrap();
    assert_eq!(second.writes(), 0);
    assert_eq!(second.counts().correct, 2);
}

#[test]
fn test_handle_audit_check_writes_json_report() {
    let site = create_site();
    let output = site.path().join("audit.json");
    let args = sub_matches(&[
        "sitemend",
        "audit",
        "-r",
        path_str(site.path()),
        "--check",
        "-f",
        "json",
        "-o",
        path_str(&output),
    ]);

    let report = handle_audit(&args, true).unwrap();
    assert!(report.check_only);
    assert_eq!(report.counts().drift, 1);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["report"]["summary"]["drift"], 1);

    let content = fs::read_to_string(site.path().join("about/index.html")).unwrap();
    assert!(content.contains("href=\"https://example.com/about\""));
}

#[test]
fn test_handle_audit_origin_override() {
    let site = create_site();
    let args = sub_matches(&[
        "sitemend",
        "audit",
        "-r",
        path_str(site.path()),
        "--origin",
        "https://www.example.com/",
        "--check",
    ]);

    let report = handle_audit(&args, true).unwrap();
    assert_eq!(report.origin, "https://www.example.com");
    assert_eq!(report.counts().outside_origin, 2);
}

#[test]
fn test_handle_audit_missing_sitemap() {
    let site = TempDir::new().unwrap();
    let args = sub_matches(&["sitemend", "audit", "-r", path_str(site.path())]);

    let err = handle_audit(&args, true).unwrap_err();
    assert!(format!("{:#}", err).contains("Sitemap not found"));
}

// ============================================================================
// Batch Rewrites
// ============================================================================

#[test]
fn test_handle_bump_version() {
    let site = create_site();
    let argv = [
        "sitemend",
        "bump-version",
        "--asset",
        "styles.css",
        "--version",
        "2",
        "-r",
        path_str(site.path()),
    ];

    let summary = handle_bump_version(&sub_matches(&argv), true).unwrap();
    assert_eq!(summary.updated, vec![PathBuf::from("index.html")]);
    assert!(
        fs::read_to_string(site.path().join("index.html"))
            .unwrap()
            .contains("/styles.css?v=2")
    );

    let again = handle_bump_version(&sub_matches(&argv), true).unwrap();
    assert!(again.updated.is_empty());
}

#[test]
fn test_handle_replace_dry_run() {
    let site = create_site();
    let args = sub_matches(&[
        "sitemend",
        "replace",
        "--from",
        "styles.css",
        "--to",
        "main.css",
        "-r",
        path_str(site.path()),
        "--dry-run",
    ]);

    let summary = handle_replace(&args, true).unwrap();
    assert!(summary.dry_run);
    assert_eq!(summary.updated.len(), 1);
    assert!(
        fs::read_to_string(site.path().join("index.html"))
            .unwrap()
            .contains("styles.css")
    );
}

#[test]
fn test_handle_replace_rejects_non_idempotent() {
    let site = create_site();
    let args = sub_matches(&[
        "sitemend",
        "replace",
        "--from",
        "about",
        "--to",
        "about-us",
        "-r",
        path_str(site.path()),
    ]);

    assert!(handle_replace(&args, true).is_err());
}

#[test]
fn test_handle_replace_regex() {
    let site = create_site();
    fs::write(
        site.path().join("about/index.html"),
        r#"<meta property="og:image" content="/assets/og-about.jpg"><img src="/assets/og-images/team.jpg">"#,
    )
    .unwrap();
    let argv = [
        "sitemend",
        "replace",
        "--regex",
        "--from",
        r"/assets/og-(?:images/)?[a-z-]+\.jpg",
        "--to",
        "/assets/og-main.png",
        "-r",
        path_str(site.path()),
    ];

    let summary = handle_replace(&sub_matches(&argv), true).unwrap();
    assert_eq!(summary.updated, vec![PathBuf::from("about/index.html")]);
    assert_eq!(
        fs::read_to_string(site.path().join("about/index.html")).unwrap(),
        r#"<meta property="og:image" content="/assets/og-main.png"><img src="/assets/og-main.png">"#
    );

    let again = handle_replace(&sub_matches(&argv), true).unwrap();
    assert!(again.updated.is_empty());
}

#[test]
fn test_handle_replace_regex_rejects_self_match() {
    let site = create_site();
    let args = sub_matches(&[
        "sitemend",
        "replace",
        "-e",
        "--from",
        r"styles\.css\?v=\d+",
        "--to",
        "styles.css?v=9",
        "-r",
        path_str(site.path()),
    ]);

    assert!(handle_replace(&args, true).is_err());
    assert!(
        fs::read_to_string(site.path().join("index.html"))
            .unwrap()
            .contains("styles.css?v=1")
    );
}

#[test]
fn test_collect_mappings_from_flags_and_file() {
    let dir = TempDir::new().unwrap();
    let map_file = dir.path().join("links.txt");
    fs::write(&map_file, "# moved\n/team/=/company/team/\n").unwrap();
    let args = sub_matches(&[
        "sitemend",
        "remap",
        "-m",
        "/about/=/company/",
        "--map-file",
        path_str(&map_file),
    ]);

    let mappings = collect_mappings(&args).unwrap();
    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[0].from, "/about/");
    assert_eq!(mappings[1].to, "/company/team/");
}

#[test]
fn test_handle_remap() {
    let site = create_site();
    fs::write(
        site.path().join("index.html"),
        r#"<a href="/about/">About</a><a href="https://example.com/about/">About</a>"#,
    )
    .unwrap();
    fs::write(
        site.path().join("sitemend.toml"),
        "origin = \"https://example.com\"\n",
    )
    .unwrap();
    let args = sub_matches(&[
        "sitemend",
        "remap",
        "-m",
        "/about/=/company/",
        "-r",
        path_str(site.path()),
    ]);

    let summary = handle_remap(&args, true).unwrap();
    assert!(summary.updated.contains(&PathBuf::from("index.html")));
    assert_eq!(
        fs::read_to_string(site.path().join("index.html")).unwrap(),
        r#"<a href="/company/">About</a><a href="https://example.com/company/">About</a>"#
    );
}

#[test]
fn test_handle_inject() {
    let site = create_site();
    let assets = TempDir::new().unwrap();
    let snippet = assets.path().join("snippet.html");
    fs::write(&snippet, "<script src=\"/editor.js\" data-editor></script>").unwrap();
    let argv = [
        "sitemend",
        "inject",
        "--snippet-file",
        path_str(&snippet),
        "--marker",
        "data-editor",
        "-r",
        path_str(site.path()),
    ];

    let summary = handle_inject(&sub_matches(&argv), true).unwrap();
    assert_eq!(summary.updated.len(), 2);

    let again = handle_inject(&sub_matches(&argv), true).unwrap();
    assert!(again.updated.is_empty());
    assert_eq!(again.skipped.len(), 2);
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn test_handle_init_writes_template() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("site");
    let args = sub_matches(&["sitemend", "init", path_str(&target)]);

    let written = handle_init(&args, true).unwrap().unwrap();
    assert_eq!(written, target.join("sitemend.toml"));

    let config = load_site_config(&sub_matches(&[
        "sitemend",
        "audit",
        "-c",
        path_str(&written),
    ]))
    .unwrap();
    assert_eq!(config.index_file, "index.html");
}

#[test]
fn test_handle_init_force_overwrites() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("sitemend.toml");
    fs::write(&config_path, "index_file = \"old.html\"\n").unwrap();
    let args = sub_matches(&["sitemend", "init", path_str(dir.path()), "--force"]);

    handle_init(&args, true).unwrap();
    assert!(
        fs::read_to_string(&config_path)
            .unwrap()
            .contains("index_file = \"index.html\"")
    );
}
