use std::collections::HashSet;

use scraper::Html;
use tracing::{debug, warn};

use super::{css, element_text, pattern, RawPosting, SiteAdapter};
use crate::error::AdapterError;
use crate::fetch::Fetcher;
use crate::record::University;

const BASE: &str = "https://cuhk.taleo.net";
const SECTIONS: [(&str, &str); 2] = [
    (
        "https://cuhk.taleo.net/careersection/cu_career_teach/jobsearch.ftl?lang=en",
        "Teaching",
    ),
    (
        "https://cuhk.taleo.net/careersection/cu_career_non_teach/jobsearch.ftl?lang=en",
        "Research/Non-teaching",
    ),
];
const MAX_PAGES: usize = 50;

/// CUHK — Taleo career sections, JS-rendered tables
/// (Job Number | Requisition Title | Department/Unit), Next-button paging.
pub struct CuhkAdapter;

impl SiteAdapter for CuhkAdapter {
    fn university(&self) -> University {
        University::Cuhk
    }

    fn scrape(&self, fetcher: &Fetcher) -> Result<Vec<RawPosting>, AdapterError> {
        let mut postings = Vec::new();
        let mut seen = HashSet::new();
        let mut last_error = None;

        for (url, section) in SECTIONS {
            let page = match fetcher.rendered(url, Some("table tr td a")) {
                Ok(page) => page,
                Err(e) => {
                    warn!(url, section, error = %e, "CUHK section failed to render");
                    last_error = Some(e);
                    continue;
                }
            };

            let mut section_count = 0usize;
            for page_num in 0..MAX_PAGES {
                let html = page.html()?;
                for posting in parse_rows(&html) {
                    let key = posting
                        .reference
                        .clone()
                        .unwrap_or_else(|| format!("{}|{}", posting.title, posting.department));
                    if seen.insert(key) {
                        section_count += 1;
                        postings.push(posting);
                    }
                }

                if next_is_disabled(&html) {
                    break;
                }
                if !page.click_xpath("//a[@title='Next'] | //a[normalize-space(.)='Next']") {
                    break;
                }
                page.settle(3000);
                debug!(section, page = page_num + 2, "CUHK next page");
            }
            debug!(section, count = section_count, "parsed CUHK section");
        }

        if postings.is_empty() {
            if let Some(e) = last_error {
                return Err(e.into());
            }
        }
        Ok(postings)
    }
}

pub fn parse_rows(html: &str) -> Vec<RawPosting> {
    let document = Html::parse_document(html);
    let row_sel = css("table tr");
    let cell_sel = css("td");
    let link_sel = css("a[href]");
    let ref_re = pattern(r"^\d{5,8}$");
    let digits_re = pattern(r"^\d+$");

    let mut postings = Vec::new();
    for row in document.select(&row_sel) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.len() < 3 {
            continue;
        }

        let mut reference = None;
        let mut title = String::new();
        let mut department = String::new();
        let mut apply_url = String::new();

        for cell in &cells {
            let text = element_text(cell);
            if reference.is_none() && ref_re.is_match(&text) {
                reference = Some(text.clone());
            }
            let link = cell.select(&link_sel).next();
            if title.is_empty() {
                if let Some(link) = link {
                    title = element_text(&link);
                    let href = link.value().attr("href").unwrap_or_default();
                    apply_url = if href.starts_with('/') {
                        format!("{BASE}{href}")
                    } else {
                        href.to_string()
                    };
                }
            }
            if !title.is_empty()
                && department.is_empty()
                && link.is_none()
                && text.len() > 5
                && !digits_re.is_match(&text)
            {
                department = text;
            }
        }

        if title.len() < 5 {
            continue;
        }
        if department.is_empty() {
            department = University::Cuhk.full_name().to_string();
        }

        postings.push(RawPosting {
            description: Some(format!(
                "{title} — {department}. Please visit the application link for full details."
            )),
            title,
            reference,
            apply_url,
            department,
            ..RawPosting::default()
        });
    }

    postings
}

/// Taleo renders the Next link greyed out (class `disabled`/`inactive`) on
/// the last page; clicking it would just reload the same rows forever.
fn next_is_disabled(html: &str) -> bool {
    let document = Html::parse_document(html);
    let next_sel = css("a[title='Next']");
    match document.select(&next_sel).next() {
        Some(link) => {
            let classes = link.value().attr("class").unwrap_or_default().to_lowercase();
            classes.contains("disabled") || classes.contains("inactive")
        }
        // No Next link at all: single page.
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body><table>
          <tr><th>Job Number</th><th>Title</th><th>Department</th></tr>
          <tr>
            <td>250101</td>
            <td><a href="/careersection/jobdetail.ftl?job=250101">Professor / Associate Professor of Surgery</a></td>
            <td>Department of Surgery</td>
          </tr>
          <tr>
            <td>250102</td>
            <td><a href="https://cuhk.taleo.net/careersection/jobdetail.ftl?job=250102">Postdoctoral Fellow</a></td>
            <td>School of Life Sciences</td>
          </tr>
        </table>
        <a title="Next" class="pagerlink disabled">Next</a>
        </body></html>"#;

    #[test]
    fn test_parse_rows_extracts_fields() {
        let postings = parse_rows(LISTING);
        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(first.reference.as_deref(), Some("250101"));
        assert_eq!(first.title, "Professor / Associate Professor of Surgery");
        assert_eq!(first.department, "Department of Surgery");
        assert_eq!(
            first.apply_url,
            "https://cuhk.taleo.net/careersection/jobdetail.ftl?job=250101"
        );
    }

    #[test]
    fn test_disabled_next_detected() {
        assert!(next_is_disabled(LISTING));
        assert!(next_is_disabled("<html><body>no pager</body></html>"));
        assert!(!next_is_disabled(
            r#"<a title="Next" class="pagerlink">Next</a>"#
        ));
    }

    #[test]
    fn test_short_titles_skipped() {
        let html = r#"<table><tr><td>12345</td><td><a href="/x">Go</a></td><td>Somewhere Dept</td></tr></table>"#;
        assert!(parse_rows(html).is_empty());
    }
}
