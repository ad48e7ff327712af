pub mod cityu;
pub mod cuhk;
pub mod eduhk;
pub mod hkbu;
pub mod hku;
pub mod hkust;
pub mod lingnan;
pub mod polyu;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::error::AdapterError;
use crate::fetch::Fetcher;
use crate::record::{PositionType, University};

/// What a listing page gives us for one posting, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawPosting {
    pub title: String,
    /// Institution-assigned reference number, when the site exposes one.
    pub reference: Option<String>,
    pub apply_url: String,
    pub department: String,
    /// Deadline exactly as printed on the page; the normalizer parses it.
    pub deadline_text: Option<String>,
    /// Set when the listing section itself fixes the position type.
    pub position_type: Option<PositionType>,
    pub salary: Option<String>,
    pub start_date_text: Option<String>,
    pub description: Option<String>,
}

/// One implementation per institution. Adapters fetch and parse their own
/// listing pages; they never touch another institution's state, so a failure
/// stays contained to one `scrape` call.
pub trait SiteAdapter: Send + Sync {
    fn university(&self) -> University;
    fn scrape(&self, fetcher: &Fetcher) -> Result<Vec<RawPosting>, AdapterError>;
}

/// Fixed registry keyed by institution code.
pub struct AdapterRegistry;

impl AdapterRegistry {
    pub fn create(university: University) -> Box<dyn SiteAdapter> {
        match university {
            University::CityU => Box::new(cityu::CityUAdapter),
            University::Cuhk => Box::new(cuhk::CuhkAdapter),
            University::EdUhk => Box::new(eduhk::EduhkAdapter),
            University::Hkbu => Box::new(hkbu::HkbuAdapter),
            University::Hku => Box::new(hku::HkuAdapter),
            University::Hkust => Box::new(hkust::HkustAdapter),
            University::Lu => Box::new(lingnan::LingnanAdapter),
            University::PolyU => Box::new(polyu::PolyUAdapter),
        }
    }
}

// ── shared parsing helpers ──

/// Compile a selector literal. Selectors are static strings reviewed with the
/// adapter, so a parse failure is a programming error.
pub(crate) fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector")
}

pub(crate) fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static pattern")
}

/// Collapsed visible text of an element.
pub(crate) fn element_text(element: &ElementRef) -> String {
    crate::normalize::clean(&element.text().collect::<String>())
}

/// A char-boundary-safe text window of up to `back` bytes before and `fwd`
/// bytes after `idx`. Used by the adapters that parse from rendered body text
/// anchored on a marker string.
pub(crate) fn text_window(text: &str, idx: usize, back: usize, fwd: usize) -> (&str, &str) {
    let mut start = idx.saturating_sub(back);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (idx + fwd).min(text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }
    (&text[start..idx], &text[idx..end])
}
