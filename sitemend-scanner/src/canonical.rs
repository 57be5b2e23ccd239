// Canonical link tag extraction and substitution

use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::sync::LazyLock;

// Group 1: everything up to the opening quote of href, 2: the URL, 3: closing quote.
static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<link\s+rel\s*=\s*"canonical"\s+href\s*=\s*")([^"]*)(")"#).unwrap()
});

/// Return the URL of the first canonical link tag in `html`, if any.
pub fn extract_canonical(html: &str) -> Option<String> {
    CANONICAL_RE
        .captures(html)
        .map(|caps| caps[2].to_string())
}

/// Rewrite the URL of the first canonical link tag to `url`.
///
/// Returns `None` when no canonical tag matches or when the tag already
/// carries `url`; the rest of the document is left byte-for-byte intact.
pub fn replace_canonical(html: &str, url: &str) -> Option<String> {
    let caps = CANONICAL_RE.captures(html)?;
    if &caps[2] == url {
        return None;
    }

    let replaced = CANONICAL_RE.replacen(html, 1, |caps: &Captures| {
        format!("{}{}{}", &caps[1], url, &caps[3])
    });
    Some(replaced.into_owned())
}

/// Count `<link rel="canonical">` elements using a tolerant HTML parse.
///
/// This sees tags the substitution pattern does not (single quotes,
/// attributes in another order), which is what makes it useful for flagging
/// pages that declare more than one canonical.
pub fn count_canonical_tags(html: &str) -> usize {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("link[rel]").unwrap();
    document
        .select(&link_selector)
        .filter(|element| {
            element.value().attr("rel").is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("canonical"))
            })
        })
        .count()
}
