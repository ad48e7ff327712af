use std::collections::HashSet;

use scraper::Html;
use tracing::{debug, warn};

use super::{css, element_text, pattern, RawPosting, SiteAdapter};
use crate::error::AdapterError;
use crate::fetch::Fetcher;
use crate::normalize::parse_date;
use crate::record::University;

const LISTING_URL: &str = "https://jobs.hku.hk/en/listing/";
const MAX_CLICKS: usize = 500;

/// Non-academic roles the listing mixes in; filtered out by title keyword.
const ADMIN_KEYWORDS: [&str; 13] = [
    "administrative assistant",
    "clerical assistant",
    "finance officer",
    "it officer",
    "facilities manager",
    "procurement officer",
    "human resources officer",
    "security officer",
    "safety officer",
    "receptionist",
    "estate manager",
    "accounting officer",
    "payroll officer",
];

/// The button label varies in casing across site updates, so the match
/// lowercases the element text first.
const MORE_JOBS_XPATH: &str = "\
//a[contains(translate(., 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'more job')] \
| //button[contains(translate(., 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'more job')] \
| //a[contains(translate(., 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'load more')] \
| //button[contains(translate(., 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'load more')] \
| //a[contains(translate(., 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'show more')] \
| //button[contains(translate(., 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'show more')]";

/// HKU — PageUp listing, JS-rendered. A "More Jobs" button appends rows;
/// click until the row count stops growing.
pub struct HkuAdapter;

impl SiteAdapter for HkuAdapter {
    fn university(&self) -> University {
        University::Hku
    }

    fn scrape(&self, fetcher: &Fetcher) -> Result<Vec<RawPosting>, AdapterError> {
        let page = fetcher.rendered(LISTING_URL, Some("table tr"))?;
        page.settle(2000);

        let row_sel = css("tr");
        let mut previous_rows = 0usize;

        for clicks in 0..MAX_CLICKS {
            let html = page.html()?;
            let rows = Html::parse_document(&html).select(&row_sel).count();

            if clicks > 0 && rows <= previous_rows {
                debug!(clicks, rows, "HKU row count stopped growing");
                break;
            }
            previous_rows = rows;

            if !page.click_xpath(MORE_JOBS_XPATH) {
                debug!(clicks, rows, "HKU load-more button gone, all rows loaded");
                break;
            }
            page.settle(1500);
        }

        let html = page.html()?;
        let postings = parse_rows(&html);
        if postings.is_empty() {
            warn!(url = LISTING_URL, "HKU listing rendered but no rows parsed");
        }
        Ok(postings)
    }
}

pub fn parse_rows(html: &str) -> Vec<RawPosting> {
    let document = Html::parse_document(html);
    let row_sel = css("tr");
    let link_sel = css("a[href]");
    let cell_sel = css("td");
    let ref_re = pattern(r"^\d{5,8}$");
    let dept_re = pattern(r"(?i)Faculty|Department|School|Institute|Centre|Office|Library");

    let mut postings = Vec::new();
    let mut seen = HashSet::new();

    for row in document.select(&row_sel) {
        let Some(link) = row.select(&link_sel).next() else {
            continue;
        };
        let title = element_text(&link);
        if title.len() < 5 {
            continue;
        }

        let href = link.value().attr("href").unwrap_or_default();
        let apply_url = if href.starts_with('/') {
            format!("https://jobs.hku.hk{href}")
        } else {
            href.to_string()
        };

        let mut reference = None;
        let mut department = String::new();
        let mut deadline_text = None;
        for cell in row.select(&cell_sel) {
            let text = element_text(&cell);
            if ref_re.is_match(&text) {
                reference = Some(text);
            } else if dept_re.is_match(&text) && text != title {
                department = text;
            } else if parse_date(&text).is_some() {
                deadline_text = Some(text);
            }
        }
        if department.is_empty() {
            department = University::Hku.full_name().to_string();
        }

        let dedup_key = reference
            .clone()
            .unwrap_or_else(|| format!("{title}|{department}"));
        if !seen.insert(dedup_key) {
            continue;
        }

        let title_lower = title.to_lowercase();
        if ADMIN_KEYWORDS.iter().any(|kw| title_lower.contains(kw)) {
            continue;
        }

        postings.push(RawPosting {
            description: Some(format!(
                "{title} — {department}. Please visit the application link for full details."
            )),
            title,
            reference,
            apply_url,
            department,
            deadline_text,
            ..RawPosting::default()
        });
    }

    postings
}
