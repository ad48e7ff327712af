use std::collections::HashSet;

use scraper::Html;
use tracing::{debug, warn};

use super::{css, element_text, pattern, RawPosting, SiteAdapter};
use crate::error::AdapterError;
use crate::fetch::Fetcher;
use crate::record::University;

const SECTIONS: [(&str, &str); 3] = [
    (
        "https://jobs1.cityu.edu.hk/apply/Default.aspx?jobtype=SENIOR",
        "Senior Management",
    ),
    (
        "https://jobs1.cityu.edu.hk/apply/Default.aspx?jobtype=ACAD",
        "Academic Faculty",
    ),
    (
        "https://jobs1.cityu.edu.hk/apply/Default.aspx?jobtype=RS",
        "Research",
    ),
];

/// CityU — three static HTML tables (senior, academic, research staff).
/// Rows: title link | department | deadline.
pub struct CityUAdapter;

impl SiteAdapter for CityUAdapter {
    fn university(&self) -> University {
        University::CityU
    }

    fn scrape(&self, fetcher: &Fetcher) -> Result<Vec<RawPosting>, AdapterError> {
        let mut postings = Vec::new();
        let mut seen = HashSet::new();
        let mut last_error = None;

        for (i, (url, section)) in SECTIONS.iter().enumerate() {
            if i > 0 {
                fetcher.pause();
            }
            let html = match fetcher.get(url) {
                Ok(html) => html,
                Err(e) => {
                    warn!(url, section, error = %e, "CityU section failed");
                    last_error = Some(e);
                    continue;
                }
            };

            let section_postings = parse_listing(&html);
            debug!(section, count = section_postings.len(), "parsed CityU section");

            for posting in section_postings {
                let key = posting
                    .reference
                    .clone()
                    .unwrap_or_else(|| posting.title.clone());
                if seen.insert(key) {
                    postings.push(posting);
                }
            }
        }

        if postings.is_empty() {
            if let Some(e) = last_error {
                return Err(e.into());
            }
        }
        Ok(postings)
    }
}

pub fn parse_listing(html: &str) -> Vec<RawPosting> {
    let document = Html::parse_document(html);
    let row_sel = css("table tr");
    let cell_sel = css("td");
    let link_sel = css("a[href]");
    let ref_re = pattern(r"(?i)ref=([\w\-]+)");

    let mut postings = Vec::new();
    for row in document.select(&row_sel) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.len() < 2 {
            continue;
        }

        let Some(link) = cells[0].select(&link_sel).next() else {
            continue;
        };
        let title = element_text(&link);
        if title.len() < 3 {
            continue;
        }

        let href = link.value().attr("href").unwrap_or_default();
        let apply_url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("https://www.cityu.edu.hk{href}")
        };

        let reference = ref_re
            .captures(href)
            .map(|caps| caps[1].to_string());

        let department = element_text(&cells[1]);
        // Third cell may say "until filled"; the normalizer treats that as
        // open-ended.
        let deadline_text = cells.get(2).map(|cell| element_text(cell));

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

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body><table>
          <tr><th>Post</th><th>Department</th><th>Closing Date</th></tr>
          <tr>
            <td><a href="/hro/job.aspx?ref=UAC-123">Associate Professor in Economics</a></td>
            <td>Department of Economics and Finance</td>
            <td>30 September 2026</td>
          </tr>
          <tr>
            <td><a href="https://external.example/apply?ref=RS-9">Research Assistant</a></td>
            <td>Department of Chemistry</td>
            <td>until filled</td>
          </tr>
        </table></body></html>"#;

    #[test]
    fn test_parse_listing_rows() {
        let postings = parse_listing(LISTING);
        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(first.title, "Associate Professor in Economics");
        assert_eq!(first.reference.as_deref(), Some("UAC-123"));
        assert_eq!(first.department, "Department of Economics and Finance");
        assert_eq!(first.deadline_text.as_deref(), Some("30 September 2026"));
        assert!(first.apply_url.starts_with("https://www.cityu.edu.hk/"));
    }

    #[test]
    fn test_absolute_links_kept_as_is() {
        let postings = parse_listing(LISTING);
        assert_eq!(
            postings[1].apply_url,
            "https://external.example/apply?ref=RS-9"
        );
        assert_eq!(postings[1].reference.as_deref(), Some("RS-9"));
    }

    #[test]
    fn test_rows_without_link_skipped() {
        let html = "<table><tr><td>plain</td><td>cells</td><td>only</td></tr></table>";
        assert!(parse_listing(html).is_empty());
    }
}
