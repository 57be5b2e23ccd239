// Tests for sitemap URL to file path resolution

use sitemend_core::resolve::resolve_path;
use std::path::Path;

const ORIGIN: &str = "https://example.com";

fn resolve(url: &str) -> String {
    resolve_path(url, ORIGIN, "index.html").relative
}

// ============================================================================
// Origin Root Tests
// ============================================================================

#[test]
fn test_resolve_root_with_slash() {
    assert_eq!(resolve("https://example.com/"), "index.html");
}

#[test]
fn test_resolve_root_without_slash() {
    assert_eq!(resolve("https://example.com"), "index.html");
}

#[test]
fn test_resolve_origin_with_trailing_slash() {
    let resolved = resolve_path("https://example.com/about/", "https://example.com/", "index.html");
    assert_eq!(resolved.relative, "about/index.html");
    assert!(resolved.origin_matched);
}

// ============================================================================
// Directory and File Tests
// ============================================================================

#[test]
fn test_resolve_directory_url() {
    assert_eq!(
        resolve("https://example.com/features/x/"),
        "features/x/index.html"
    );
}

#[test]
fn test_resolve_file_url_verbatim() {
    assert_eq!(resolve("https://example.com/terms.html"), "terms.html");
    assert_eq!(
        resolve("https://example.com/compare/jobber-alternative.html"),
        "compare/jobber-alternative.html"
    );
}

#[test]
fn test_resolve_htm_and_mixed_case_pages_verbatim() {
    assert_eq!(resolve("https://example.com/old/page.htm"), "old/page.htm");
    assert_eq!(resolve("https://example.com/Legal.HTML"), "Legal.HTML");
}

#[test]
fn test_resolve_dotted_slug_is_a_directory() {
    assert_eq!(
        resolve("https://example.com/blog/web-2.0"),
        "blog/web-2.0/index.html"
    );
    assert_eq!(
        resolve("https://example.com/releases/v1.2/"),
        "releases/v1.2/index.html"
    );
}

#[test]
fn test_resolve_index_file_extension_is_a_page() {
    let resolved = resolve_path("https://example.com/app/page.php", ORIGIN, "index.php");
    assert_eq!(resolved.relative, "app/page.php");
}

#[test]
fn test_resolve_path_without_trailing_slash() {
    assert_eq!(resolve("https://example.com/pricing"), "pricing/index.html");
}

#[test]
fn test_resolve_custom_index_file() {
    let resolved = resolve_path("https://example.com/blog/", ORIGIN, "default.htm");
    assert_eq!(resolved.relative, "blog/default.htm");

    let resolved = resolve_path("https://example.com/", ORIGIN, "default.htm");
    assert_eq!(resolved.relative, "default.htm");
}

#[test]
fn test_resolve_under_site_root() {
    let resolved = resolve_path("https://example.com/about/", ORIGIN, "index.html");
    assert_eq!(
        resolved.under(Path::new("/srv/site")),
        Path::new("/srv/site/about/index.html")
    );
}

// ============================================================================
// Pass-through Tests
// ============================================================================

#[test]
fn test_resolve_foreign_origin_passes_through() {
    let resolved = resolve_path("https://other.com/about/", ORIGIN, "index.html");
    assert!(!resolved.origin_matched);
    assert_eq!(resolved.relative, "https://other.com/about/index.html");
}

#[test]
fn test_resolve_relative_entry_passes_through() {
    let resolved = resolve_path("/about/", ORIGIN, "index.html");
    assert!(!resolved.origin_matched);
    assert_eq!(resolved.relative, "about/index.html");
}

#[test]
fn test_resolve_lookalike_host_is_not_origin() {
    let resolved = resolve_path("https://example.com.evil.net/x/", ORIGIN, "index.html");
    assert!(!resolved.origin_matched);
}

#[test]
fn test_resolve_origin_ignores_ascii_case() {
    let resolved = resolve_path("https://Example.COM/about/", ORIGIN, "index.html");
    assert!(resolved.origin_matched);
    assert_eq!(resolved.relative, "about/index.html");

    let resolved = resolve_path("https://example.com/Team/", "HTTPS://EXAMPLE.COM", "index.html");
    assert!(resolved.origin_matched);
    assert_eq!(resolved.relative, "Team/index.html");
}

// ============================================================================
// Containment Tests
// ============================================================================

#[test]
fn test_resolve_parent_segments_leave_root() {
    let resolved = resolve_path("https://example.com/../secret.html", ORIGIN, "index.html");
    assert_eq!(resolved.relative, "../secret.html");
    assert!(!resolved.stays_under_root());

    let resolved = resolve_path("https://example.com/a/../../b/", ORIGIN, "index.html");
    assert!(!resolved.stays_under_root());
}

#[test]
fn test_resolve_ordinary_paths_stay_under_root() {
    assert!(resolve_path("https://example.com/a/./b/", ORIGIN, "index.html").stays_under_root());
    assert!(resolve_path("https://example.com/", ORIGIN, "index.html").stays_under_root());
    assert!(resolve_path("https://other.com/x/", ORIGIN, "index.html").stays_under_root());
}

#[test]
fn test_resolve_matched_flag() {
    assert!(resolve_path("https://example.com/a/", ORIGIN, "index.html").origin_matched);
}
