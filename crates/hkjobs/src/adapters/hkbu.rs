use std::collections::HashSet;

use scraper::Html;
use serde_json::Value;
use tracing::{debug, warn};

use super::{css, element_text, pattern, RawPosting, SiteAdapter};
use crate::error::{AdapterError, FetchError};
use crate::fetch::Fetcher;
use crate::record::University;

const BASE: &str = "https://fa-ewqq-saasfaprod1.fa.ocs.oraclecloud.com";
const API: &str =
    "https://fa-ewqq-saasfaprod1.fa.ocs.oraclecloud.com/hcmRestApi/resources/latest/recruitingCEJobRequisitions";

/// Finder string the career site itself sends; the API rejects requests
/// without it.
const FINDER: &str = "CandidateExperience;siteNumber=CX_1,\
facetsList=LOCATIONS%3BWORK_LOCATIONS%3BTITLES%3BCATEGORIES\
%3BORGANIZATIONS%3BPOSTING_DATES%3BFLEX_FIELDS";

const PAGE_SIZE: usize = 25;
const MAX_OFFSET: usize = 1000;
const MAX_FALLBACK_LOADS: usize = 20;

/// HKBU — Oracle HCM Cloud recruiting API, paginated 25 postings per page.
pub struct HkbuAdapter;

impl SiteAdapter for HkbuAdapter {
    fn university(&self) -> University {
        University::Hkbu
    }

    fn scrape(&self, fetcher: &Fetcher) -> Result<Vec<RawPosting>, AdapterError> {
        let referer = format!("{BASE}/hcmUI/CandidateExperience/en/sites/hkbu/jobs");
        let headers: [(&str, &str); 2] = [("Referer", referer.as_str()), ("Origin", BASE)];

        let mut postings = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0usize;

        loop {
            let offset_str = offset.to_string();
            let query: [(&str, &str); 5] = [
                ("onlyData", "true"),
                ("finder", FINDER),
                ("limit", "25"),
                ("offset", &offset_str),
                ("sortBy", "POSTING_DATES_DESC"),
            ];

            let body = match fetcher.get_json(API, &query, &headers) {
                Ok(body) => body,
                Err(e) if offset == 0 => {
                    warn!(error = %e, "HKBU API unavailable, trying rendered listing");
                    return rendered_fallback(fetcher, e);
                }
                Err(e) => {
                    // Keep what earlier pages gave us rather than reporting a
                    // full failure for a partial one.
                    warn!(offset, error = %e, "HKBU pagination stopped early");
                    break;
                }
            };

            let items = body
                .get("items")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let has_more = body
                .get("hasMore")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            debug!(offset, count = items.len(), "parsed HKBU API page");

            for item in &items {
                if let Some(posting) = parse_item(item) {
                    if seen.insert(posting.title.clone()) {
                        postings.push(posting);
                    }
                }
            }

            if !has_more || items.is_empty() {
                break;
            }
            offset += PAGE_SIZE;
            if offset > MAX_OFFSET {
                break;
            }
            fetcher.pause();
        }

        Ok(postings)
    }
}

/// When the API refuses us, open the career site itself in the headless
/// browser and harvest the requisition links, loading more tiles until the
/// control disappears. Returns the original API error if this also comes
/// up empty.
fn rendered_fallback(
    fetcher: &Fetcher,
    api_error: FetchError,
) -> Result<Vec<RawPosting>, AdapterError> {
    let url = format!("{BASE}/hcmUI/CandidateExperience/en/sites/hkbu/jobs");
    let page = match fetcher.rendered(&url, Some("a[href*='/job/']")) {
        Ok(page) => page,
        Err(e) => {
            warn!(url, error = %e, "HKBU rendered fallback failed to open");
            return Err(api_error.into());
        }
    };
    page.settle(3000);

    let mut postings = Vec::new();
    let mut seen = HashSet::new();
    for _ in 0..MAX_FALLBACK_LOADS {
        let html = page.html()?;
        for posting in parse_job_links(&html) {
            if seen.insert(posting.title.clone()) {
                postings.push(posting);
            }
        }
        if !page.click_xpath(
            "//button[contains(translate(., 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', \
             'abcdefghijklmnopqrstuvwxyz'), 'show more')]",
        ) {
            break;
        }
        page.settle(2000);
    }
    debug!(count = postings.len(), "parsed HKBU rendered listing");

    if postings.is_empty() {
        return Err(api_error.into());
    }
    Ok(postings)
}

/// Requisition links on the rendered career site carry the same
/// "title, department" shape the API returns.
pub fn parse_job_links(html: &str) -> Vec<RawPosting> {
    let document = Html::parse_document(html);
    let link_sel = css("a[href*='/job/']");
    let ref_re = pattern(r"/job/(\d+)");

    let mut postings = Vec::new();
    for link in document.select(&link_sel) {
        let full_title = element_text(&link);
        if full_title.len() < 5 {
            continue;
        }

        let href = link.value().attr("href").unwrap_or_default();
        let apply_url = if href.starts_with('/') {
            format!("{BASE}{href}")
        } else {
            href.to_string()
        };
        let reference = ref_re.captures(&apply_url).map(|caps| caps[1].to_string());

        let (title, department) = match full_title.rfind(',') {
            Some(pos) => (
                full_title[..pos].trim().to_string(),
                full_title[pos + 1..].trim().to_string(),
            ),
            None => (full_title, University::Hkbu.full_name().to_string()),
        };

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

/// Field names vary between API revisions; try the known spellings in order.
fn string_field(item: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match item.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                return Some(crate::normalize::clean(s))
            }
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

pub fn parse_item(item: &Value) -> Option<RawPosting> {
    let full_title = string_field(item, &["Title", "title", "JobTitle", "displayTitle"])?;

    let reference = string_field(
        item,
        &[
            "Id",
            "id",
            "RequisitionNumber",
            "requisitionNumber",
            "ExternalReqNumber",
        ],
    );

    let apply_url = match &reference {
        Some(r) => format!("{BASE}/hcmUI/CandidateExperience/en/sites/hkbu/job/{r}"),
        None => format!("{BASE}/hcmUI/CandidateExperience/en/sites/hkbu/jobs"),
    };

    let deadline_text = string_field(
        item,
        &["PostedEndDate", "postedEndDate", "ClosingDate", "closingDate"],
    );

    let description = string_field(
        item,
        &["ExternalDescriptionStr", "ShortDescription", "description"],
    );

    // "Senior Lecturer, Department of Religion" → title + department.
    let (title, mut department) = match full_title.rfind(',') {
        Some(pos) => (
            full_title[..pos].trim().to_string(),
            full_title[pos + 1..].trim().to_string(),
        ),
        None => (full_title, String::new()),
    };

    if department.is_empty() {
        if let Some(desc) = &description {
            let sits_under = pattern(
                r"sits under (?:the\s+)?([A-Z][^,.]{3,60}?)(?:\s+at our|\s+campus|,|\.|$)",
            );
            if let Some(caps) = sits_under.captures(desc) {
                department = caps[1].trim().to_string();
            }
        }
    }
    if department.is_empty() {
        department = University::Hkbu.full_name().to_string();
    }

    let description = description
        .map(|d| d.chars().take(500).collect::<String>())
        .or_else(|| {
            Some(format!(
                "{title} — {department}. Please visit the application link for full details."
            ))
        });

    Some(RawPosting {
        title,
        reference,
        apply_url,
        department,
        deadline_text,
        description,
        ..RawPosting::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_item_splits_department_from_title() {
        let item = json!({
            "Title": "Assistant Professor, Department of Computer Science",
            "Id": 30012,
            "PostedEndDate": "2026-03-31",
            "ShortDescription": "Tenure-track post."
        });

        let posting = parse_item(&item).unwrap();
        assert_eq!(posting.title, "Assistant Professor");
        assert_eq!(posting.department, "Department of Computer Science");
        assert_eq!(posting.reference.as_deref(), Some("30012"));
        assert_eq!(posting.deadline_text.as_deref(), Some("2026-03-31"));
        assert!(posting.apply_url.ends_with("/sites/hkbu/job/30012"));
    }

    #[test]
    fn test_parse_item_sits_under_fallback() {
        let item = json!({
            "Title": "Research Assistant Professor",
            "RequisitionNumber": "REQ-77",
            "ExternalDescriptionStr": "This post sits under the Academy of Film at our main campus."
        });

        let posting = parse_item(&item).unwrap();
        assert_eq!(posting.department, "Academy of Film");
        assert_eq!(posting.reference.as_deref(), Some("REQ-77"));
    }

    #[test]
    fn test_parse_item_without_title_is_none() {
        assert!(parse_item(&json!({ "Id": 1 })).is_none());
        assert!(parse_item(&json!({ "Title": "   " })).is_none());
    }

    #[test]
    fn test_department_defaults_to_university() {
        let item = json!({ "Title": "Provost" });
        let posting = parse_item(&item).unwrap();
        assert_eq!(posting.department, "Hong Kong Baptist University");
    }

    const RENDERED: &str = r#"
        <html><body>
          <a href="/hcmUI/CandidateExperience/en/sites/hkbu/job/30012">Assistant Professor, Department of Computer Science</a>
          <a href="https://fa-ewqq-saasfaprod1.fa.ocs.oraclecloud.com/hcmUI/CandidateExperience/en/sites/hkbu/job/30099">Provost</a>
          <a href="/hcmUI/CandidateExperience/en/sites/hkbu/jobs">All openings</a>
        </body></html>"#;

    #[test]
    fn test_rendered_listing_parses_like_the_api() {
        let postings = parse_job_links(RENDERED);
        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(first.title, "Assistant Professor");
        assert_eq!(first.department, "Department of Computer Science");
        assert_eq!(first.reference.as_deref(), Some("30012"));
        assert!(first.apply_url.ends_with("/sites/hkbu/job/30012"));

        let provost = &postings[1];
        assert_eq!(provost.department, "Hong Kong Baptist University");
        assert_eq!(provost.reference.as_deref(), Some("30099"));
    }

    #[test]
    fn test_rendered_listing_skips_navigation_links() {
        let postings = parse_job_links(RENDERED);
        assert!(postings.iter().all(|p| p.title != "All openings"));
    }
}
