use std::collections::HashSet;

use scraper::Html;
use tracing::{debug, warn};

use super::{css, element_text, pattern, RawPosting, SiteAdapter};
use crate::error::AdapterError;
use crate::fetch::Fetcher;
use crate::record::University;

const BASE: &str = "https://lingnan.csod.com";
const HOME: &str = "https://lingnan.csod.com/ux/ats/careersite/4/home?c=lingnan";
const MAX_PAGES: usize = 10;

/// Lingnan — Cornerstone career site, JS-rendered list of requisition links.
pub struct LingnanAdapter;

impl SiteAdapter for LingnanAdapter {
    fn university(&self) -> University {
        University::Lu
    }

    fn scrape(&self, fetcher: &Fetcher) -> Result<Vec<RawPosting>, AdapterError> {
        let page = fetcher.rendered(HOME, Some("a[href*='requisition']"))?;
        page.settle(2000);

        let mut postings = Vec::new();
        let mut seen = HashSet::new();

        for page_num in 1..=MAX_PAGES {
            let html = page.html()?;
            let mut added = 0usize;
            for posting in parse_jobs(&html) {
                if seen.insert(posting.title.clone()) {
                    added += 1;
                    postings.push(posting);
                }
            }
            debug!(page = page_num, added, "parsed Lingnan page");

            if added == 0 && page_num > 1 {
                break;
            }
            // Cornerstone renders numbered page buttons; a Next-labelled
            // control only shows up in some skins.
            let advanced = page.click_xpath(&page_control_xpath(page_num + 1))
                || page.click_xpath("//*[@aria-label='Next' or @title='Next']");
            if !advanced {
                break;
            }
            page.settle(2500);
        }

        if postings.is_empty() {
            warn!(url = HOME, "Lingnan site rendered but no requisitions parsed");
        }
        Ok(postings)
    }
}

/// The numbered pagination control for one page.
fn page_control_xpath(page: usize) -> String {
    format!(
        "//button[normalize-space(.)='{page}'] | //a[normalize-space(.)='{page}'] \
         | //*[@aria-label='Page {page}']"
    )
}

pub fn parse_jobs(html: &str) -> Vec<RawPosting> {
    let document = Html::parse_document(html);
    let link_sel = css("a[href*='requisition']");
    let ref_re = pattern(r"requisition/(\d+)");

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

        // "Professor of Marketing, Faculty of Business" → title + department.
        let (title, department) = match full_title.rfind(',') {
            Some(pos) => (
                full_title[..pos].trim().to_string(),
                full_title[pos + 1..].trim().to_string(),
            ),
            None => (
                full_title.clone(),
                University::Lu.full_name().to_string(),
            ),
        };
        if title.len() < 3 {
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
            ..RawPosting::default()
        });
    }

    postings
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <a href="/ux/ats/careersite/4/requisition/1234?c=lingnan">Assistant Professor of Economics, Department of Economics</a>
          <a href="https://lingnan.csod.com/ux/ats/careersite/4/requisition/1250?c=lingnan">Registrar</a>
          <a href="/ux/ats/careersite/4/requisition/1234?c=lingnan">Assistant Professor of Economics, Department of Economics</a>
          <a href="/ux/ats/careersite/4/home?c=lingnan">Home</a>
        </body></html>"#;

    #[test]
    fn test_parse_jobs_splits_department() {
        let postings = parse_jobs(LISTING);

        let first = &postings[0];
        assert_eq!(first.title, "Assistant Professor of Economics");
        assert_eq!(first.department, "Department of Economics");
        assert_eq!(first.reference.as_deref(), Some("1234"));
        assert_eq!(
            first.apply_url,
            "https://lingnan.csod.com/ux/ats/careersite/4/requisition/1234?c=lingnan"
        );
    }

    #[test]
    fn test_title_without_comma_defaults_department() {
        let postings = parse_jobs(LISTING);
        let registrar = postings
            .iter()
            .find(|p| p.title == "Registrar")
            .expect("registrar posting");
        assert_eq!(registrar.department, "Lingnan University");
        assert_eq!(registrar.reference.as_deref(), Some("1250"));
    }

    #[test]
    fn test_page_control_targets_the_numbered_button() {
        let xpath = page_control_xpath(3);
        assert!(xpath.contains("normalize-space(.)='3'"));
        assert!(xpath.contains("@aria-label='Page 3'"));
        // Numbered controls come first; Next is only the fallback click.
        assert!(!xpath.contains("'Next'"));
    }

    #[test]
    fn test_non_requisition_links_ignored() {
        let postings = parse_jobs(LISTING);
        assert!(postings.iter().all(|p| p.title != "Home"));
    }
}
