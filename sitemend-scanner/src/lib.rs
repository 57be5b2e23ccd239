pub mod canonical;
pub mod error;
pub mod result;
pub mod sitemap;
pub mod walker;

pub use canonical::{count_canonical_tags, extract_canonical, replace_canonical};
pub use error::ScanError;
pub use result::SitemapEntry;
pub use sitemap::{load_sitemap, parse_sitemap};
pub use walker::HtmlWalker;
