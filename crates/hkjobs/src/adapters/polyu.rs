use std::collections::HashSet;

use scraper::Html;
use tracing::{debug, warn};

use super::{css, element_text, pattern, RawPosting, SiteAdapter};
use crate::error::AdapterError;
use crate::fetch::Fetcher;
use crate::normalize::parse_date;
use crate::record::{PositionType, University};

const BASE: &str = "https://jobs.polyu.edu.hk";

/// Listing pages, all sharing the same table layout. The research page adds a
/// project-title column.
const PAGES: [&str; 5] = [
    "central_senior.php",
    "deans_heads.php",
    "academic.php",
    "rap.php",
    "research.php",
];

/// PolyU — static HTML tables across five listing pages.
/// Columns: Department/Unit | Position | (Project Title) | Closing Date | Ref No.
pub struct PolyUAdapter;

impl SiteAdapter for PolyUAdapter {
    fn university(&self) -> University {
        University::PolyU
    }

    fn scrape(&self, fetcher: &Fetcher) -> Result<Vec<RawPosting>, AdapterError> {
        let mut postings = Vec::new();
        let mut seen_refs = HashSet::new();
        let mut last_error = None;

        for (i, page) in PAGES.iter().enumerate() {
            if i > 0 {
                fetcher.pause();
            }
            let url = format!("{BASE}/{page}");
            let html = match fetcher.get(&url) {
                Ok(html) => html,
                Err(e) => {
                    warn!(url, error = %e, "PolyU listing page failed");
                    last_error = Some(e);
                    continue;
                }
            };

            let page_postings = parse_listing(&html);
            debug!(url, count = page_postings.len(), "parsed PolyU page");

            for posting in page_postings {
                let reference = posting.reference.clone().unwrap_or_default();
                if seen_refs.insert(reference) {
                    postings.push(posting);
                }
            }
        }

        // All pages down is a fetch failure, not an empty listing.
        if postings.is_empty() {
            if let Some(e) = last_error {
                return Err(e.into());
            }
        }
        Ok(postings)
    }
}

/// Parse one PolyU listing table. The reference is always a 7-10 digit
/// number; rows without one are section headers or noise.
pub fn parse_listing(html: &str) -> Vec<RawPosting> {
    let document = Html::parse_document(html);
    let table_sel = css("table");
    let row_sel = css("tr");
    let cell_sel = css("td");
    let ref_re = pattern(r"^\d{7,10}$");
    let year_re = pattern(r"\d{4}");

    let Some(table) = document.select(&table_sel).next() else {
        return Vec::new();
    };

    let mut postings = Vec::new();
    for row in table.select(&row_sel).skip(1) {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|cell| element_text(&cell))
            .collect();
        if cells.len() < 3 {
            continue;
        }

        let Some(reference) = cells
            .iter()
            .map(|t| t.replace(' ', ""))
            .find(|t| ref_re.is_match(t))
        else {
            continue;
        };

        let department = cells[0].clone();
        let title = cells[1].clone();
        if title.is_empty() {
            continue;
        }

        // Research page only: an extra project-title column between the
        // position and the closing date.
        let project_title = if cells.len() >= 5 {
            let candidate = &cells[2];
            if !candidate.is_empty() && *candidate != reference && !year_re.is_match(candidate) {
                Some(candidate.clone())
            } else {
                None
            }
        } else {
            None
        };

        let deadline_text = cells.iter().find(|t| parse_date(t).is_some()).cloned();

        let mut description = title.clone();
        if let Some(project) = &project_title {
            description.push_str(&format!(" — Project: {project}"));
        }
        description.push_str(&format!(
            " ({department}). See application link for full details."
        ));

        postings.push(RawPosting {
            apply_url: format!("{BASE}/job_detail.php?job={reference}"),
            reference: Some(reference),
            title,
            department,
            deadline_text,
            position_type: Some(PositionType::FullTime),
            description: Some(description),
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
          <tr><th>Department</th><th>Position</th><th>Closing Date</th><th>Ref No.</th></tr>
          <tr>
            <td>Department of Computing</td>
            <td>Assistant Professor in Data Science</td>
            <td>27 February 2026</td>
            <td>2309012</td>
          </tr>
          <tr>
            <td>Faculty of Business</td>
            <td>Professor of Accounting</td>
            <td>Open until filled</td>
            <td>2309500</td>
          </tr>
          <tr><td colspan="4">No vacancy in this category</td></tr>
        </table></body></html>"#;

    const RESEARCH_LISTING: &str = r#"
        <html><body><table>
          <tr><th>Dept</th><th>Position</th><th>Project Title</th><th>Closing Date</th><th>Ref No.</th></tr>
          <tr>
            <td>Department of Physics</td>
            <td>Research Fellow</td>
            <td>Quantum Sensing Lab</td>
            <td>15 March 2026</td>
            <td>2401234</td>
          </tr>
        </table></body></html>"#;

    #[test]
    fn test_parse_listing_extracts_rows() {
        let postings = parse_listing(LISTING);
        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(first.reference.as_deref(), Some("2309012"));
        assert_eq!(first.title, "Assistant Professor in Data Science");
        assert_eq!(first.department, "Department of Computing");
        assert_eq!(first.deadline_text.as_deref(), Some("27 February 2026"));
        assert_eq!(
            first.apply_url,
            "https://jobs.polyu.edu.hk/job_detail.php?job=2309012"
        );
    }

    #[test]
    fn test_open_ended_deadline_left_absent() {
        let postings = parse_listing(LISTING);
        assert_eq!(postings[1].deadline_text, None);
    }

    #[test]
    fn test_research_page_project_column_folds_into_description() {
        let postings = parse_listing(RESEARCH_LISTING);
        assert_eq!(postings.len(), 1);
        let posting = &postings[0];
        assert_eq!(posting.title, "Research Fellow");
        assert!(posting
            .description
            .as_deref()
            .unwrap()
            .contains("Project: Quantum Sensing Lab"));
        assert_eq!(posting.deadline_text.as_deref(), Some("15 March 2026"));
    }

    #[test]
    fn test_rows_without_reference_skipped() {
        let postings = parse_listing("<table><tr><td>a</td><td>b</td><td>c</td></tr></table>");
        assert!(postings.is_empty());
    }

    #[test]
    fn test_no_table_yields_nothing() {
        assert!(parse_listing("<html><body><p>maintenance</p></body></html>").is_empty());
    }
}
