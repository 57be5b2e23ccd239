use crate::error::{Result, ScanError};
use crate::result::SitemapEntry;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
enum Field {
    Loc,
    Lastmod,
    Changefreq,
    Priority,
}

/// Load a sitemap document from disk.
///
/// A missing file is reported as [`ScanError::NotFound`] so callers can tell
/// it apart from a document that exists but cannot be parsed.
pub fn load_sitemap(path: &Path) -> Result<Vec<SitemapEntry>> {
    if !path.is_file() {
        return Err(ScanError::NotFound(path.to_path_buf()));
    }

    let xml = fs::read_to_string(path)?;
    let entries = parse_sitemap(&xml)?;
    info!("Loaded {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Parse sitemap XML into its `<url>` entries, in document order.
///
/// Element names are matched on their local part, so both
/// `<url>` and `<sm:url>` are accepted. Entries without a `<loc>` are dropped.
pub fn parse_sitemap(xml: &str) -> Result<Vec<SitemapEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut depth: usize = 0;
    let mut saw_root = false;
    let mut current: Option<SitemapEntry> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if depth == 0 {
                    if saw_root {
                        return Err(ScanError::ParseError(
                            "multiple root elements".to_string(),
                        ));
                    }
                    saw_root = true;
                }
                depth += 1;

                field = None;
                match e.local_name().as_ref() {
                    b"url" => current = Some(SitemapEntry::new(String::new())),
                    b"loc" => field = Some(Field::Loc),
                    b"lastmod" => field = Some(Field::Lastmod),
                    b"changefreq" => field = Some(Field::Changefreq),
                    b"priority" => field = Some(Field::Priority),
                    _ => {}
                }
            }
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    if saw_root {
                        return Err(ScanError::ParseError(
                            "multiple root elements".to_string(),
                        ));
                    }
                    saw_root = true;
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| ScanError::ParseError(err.to_string()))?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return Err(ScanError::ParseError(
                            "text outside of the root element".to_string(),
                        ));
                    }
                } else if let (Some(entry), Some(field)) = (current.as_mut(), field) {
                    push_field(entry, field, text.trim());
                }
            }
            Ok(Event::CData(ref e)) => {
                if let (Some(entry), Some(field)) = (current.as_mut(), field) {
                    let text = String::from_utf8_lossy(e);
                    push_field(entry, field, text.trim());
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ScanError::ParseError("unexpected closing tag".to_string())
                })?;
                field = None;

                if e.local_name().as_ref() == b"url"
                    && let Some(entry) = current.take()
                {
                    if entry.loc.is_empty() {
                        debug!("Skipping <url> without <loc>");
                    } else {
                        entries.push(entry);
                    }
                }
            }
            Ok(Event::Eof) => {
                if depth != 0 {
                    return Err(ScanError::ParseError(format!(
                        "unexpected end of document ({} unclosed element(s))",
                        depth
                    )));
                }
                if !saw_root {
                    return Err(ScanError::ParseError("no root element".to_string()));
                }
                break;
            }
            Err(e) => {
                return Err(ScanError::ParseError(format!(
                    "{} (near byte {})",
                    e,
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn push_field(entry: &mut SitemapEntry, field: Field, text: &str) {
    match field {
        Field::Loc => entry.loc.push_str(text),
        Field::Lastmod => entry.lastmod.get_or_insert_with(String::new).push_str(text),
        Field::Changefreq => entry
            .changefreq
            .get_or_insert_with(String::new)
            .push_str(text),
        Field::Priority => entry.priority.get_or_insert_with(String::new).push_str(text),
    }
}
