use std::collections::HashSet;

use tracing::{debug, warn};

use super::{pattern, text_window, RawPosting, SiteAdapter};
use crate::error::AdapterError;
use crate::fetch::Fetcher;
use crate::record::University;

const PAGES: [(&str, &str); 2] = [
    (
        "https://hkustcareers.hkust.edu.hk/join-us/current-opening/academic-careers",
        "Academic",
    ),
    (
        "https://hkustcareers.hkust.edu.hk/join-us/current-opening/teaching-support",
        "Teaching",
    ),
];

/// HKUST — card layout with no stable markup; parse the rendered body text
/// anchored on "Job ID: <digits>". Title sits above the anchor, department
/// and "Apply by:" below.
pub struct HkustAdapter;

impl SiteAdapter for HkustAdapter {
    fn university(&self) -> University {
        University::Hkust
    }

    fn scrape(&self, fetcher: &Fetcher) -> Result<Vec<RawPosting>, AdapterError> {
        let mut postings = Vec::new();
        let mut seen = HashSet::new();
        let mut last_error = None;

        for (url, section) in PAGES {
            let page = match fetcher.rendered(url, None) {
                Ok(page) => page,
                Err(e) => {
                    warn!(url, section, error = %e, "HKUST page failed to render");
                    last_error = Some(e);
                    continue;
                }
            };
            page.settle(3000);

            let body = page.body_text()?;
            let section_postings = parse_body(&body);
            debug!(section, count = section_postings.len(), "parsed HKUST page");

            for posting in section_postings {
                let reference = posting.reference.clone().unwrap_or_default();
                if seen.insert(reference) {
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

pub fn parse_body(body: &str) -> Vec<RawPosting> {
    let anchor_re = pattern(r"Job ID: (\d+)");
    let filter_count_re = pattern(r"\(\d+\)$");
    let meta_re = pattern(r"Open Date|Apply by|\d{4}-\d{2}");
    let deadline_re = pattern(r"Apply by: ([\d\-]+)");

    let mut postings = Vec::new();
    let mut seen = HashSet::new();

    for anchor in anchor_re.captures_iter(body) {
        let m = anchor.get(0).expect("whole match");
        let reference = anchor[1].to_string();
        if !seen.insert(reference.clone()) {
            continue;
        }

        let (before, after) = text_window(body, m.start(), 300, 300);

        // Title: last meaningful line above the anchor, skipping facet labels
        // like "School of Engineering (3)".
        let title = before
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| line.len() > 4 && !filter_count_re.is_match(line))
            .unwrap_or_default()
            .to_string();
        if title.len() < 4 {
            continue;
        }

        // Department: first line after the anchor, before any date metadata.
        let mut department = String::new();
        for line in after.lines().skip(1).map(str::trim) {
            if meta_re.is_match(line) {
                break;
            }
            if line.len() > 4 {
                department = line.to_string();
                break;
            }
        }

        let deadline_text = deadline_re
            .captures(after)
            .map(|caps| caps[1].to_string());

        let apply_url = format!(
            "https://hrmsxprod.psft.ust.hk:8044/psp/hrmsxprod/EMPLOYEE/HRMS/c/HRS_HRAM.HRS_CE.GBL?Page=HRS_CE_JOB_DTL&Action=A&JobOpeningId={reference}&SiteId=1000&PostingSeq=1"
        );

        let description = if department.is_empty() {
            format!("{title}. Please visit the application link for full details.")
        } else {
            format!("{title} — {department}. Please visit the application link for full details.")
        };

        postings.push(RawPosting {
            title: crate::normalize::clean(&title),
            reference: Some(reference),
            apply_url,
            department,
            deadline_text,
            description: Some(description),
            ..RawPosting::default()
        });
    }

    postings
}
