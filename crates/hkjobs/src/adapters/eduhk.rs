use std::collections::HashSet;

use tracing::{debug, warn};

use super::{pattern, text_window, RawPosting, SiteAdapter};
use crate::error::AdapterError;
use crate::fetch::Fetcher;
use crate::record::University;

const BASE: &str = "https://www.eduhk.hk";
const CATEGORIES: [(&str, &str); 4] = [
    ("senior-management", "Senior Management"),
    ("deanship-headship-appointments", "Deanship/Headship"),
    ("academic-teaching-posts", "Academic"),
    ("research-support-posts", "Research"),
];
const MAX_PAGES: usize = 20;

/// UI strings that show up between cards in the rendered text.
const NOISE: [&str; 10] = [
    "n/a", "na", "reset", "search", "filter", "apply", "clear", "go", "next", "previous",
];

/// EdUHK — JS-rendered category pages; cards are recovered from body text
/// anchored on "Ad Date:". Paginated by a Next control.
pub struct EduhkAdapter;

impl SiteAdapter for EduhkAdapter {
    fn university(&self) -> University {
        University::EdUhk
    }

    fn scrape(&self, fetcher: &Fetcher) -> Result<Vec<RawPosting>, AdapterError> {
        let mut postings = Vec::new();
        let mut seen = HashSet::new();
        let mut last_error = None;

        for (category, section) in CATEGORIES {
            let url = format!("{BASE}/en/current-openings?category={category}&department=&q=");
            let page = match fetcher.rendered(&url, None) {
                Ok(page) => page,
                Err(e) => {
                    warn!(url, section, error = %e, "EdUHK category failed to render");
                    last_error = Some(e);
                    continue;
                }
            };
            page.settle(3000);

            let mut category_count = 0usize;
            for page_num in 0..MAX_PAGES {
                let body = page.body_text()?;
                if !body.contains("Ad Date:") {
                    break;
                }

                for posting in parse_body(&body, &url) {
                    let key = match &posting.reference {
                        Some(r) => format!("{}|{}", posting.title, r),
                        None => format!("{}|{}", posting.title, posting.department),
                    };
                    if seen.insert(key) {
                        category_count += 1;
                        postings.push(posting);
                    }
                }

                if !page.click_xpath(
                    "//a[contains(., 'Next')] | //button[contains(., 'Next')] \
                     | //*[@aria-label='Next']",
                ) {
                    break;
                }
                page.settle(3000);
                debug!(section, page = page_num + 2, "EdUHK next page");
            }
            debug!(section, count = category_count, "parsed EdUHK category");
        }

        if postings.is_empty() {
            if let Some(e) = last_error {
                return Err(e.into());
            }
        }
        Ok(postings)
    }
}

pub fn parse_body(body: &str, listing_url: &str) -> Vec<RawPosting> {
    let anchor_re = pattern(r"Ad Date:");
    let nav_re = pattern(r"(?i)^(Next|Previous|Go to page|Search|Filter|Home|Menu|\d+)$");
    let ref_label_re = pattern(r"^Ref:");
    let dept_re =
        pattern(r"(?i)^(Department|Faculty|School|Academy|Division|Office|Centre|Center)");
    let ref_re = pattern(r"Ref:\s*(\d{6,})");
    let close_re = pattern(r"Close Date[:\s]+([A-Za-z0-9 ]+)");

    let mut postings = Vec::new();
    let mut seen = HashSet::new();

    for m in anchor_re.find_iter(body) {
        let (before, after) = text_window(body, m.start(), 600, 200);

        let content_lines: Vec<&str> = before
            .lines()
            .map(str::trim)
            .filter(|line| {
                line.len() > 2
                    && !nav_re.is_match(line)
                    && !ref_label_re.is_match(line)
                    && !NOISE.contains(&line.to_lowercase().as_str())
            })
            .collect();
        if content_lines.is_empty() {
            continue;
        }

        // Walk backwards: collect the innermost department-like line, then
        // the first non-department line is the title.
        let mut title = String::new();
        let mut department = String::new();
        for line in content_lines.iter().rev() {
            if dept_re.is_match(line) {
                if department.is_empty() {
                    department = line.to_string();
                }
            } else {
                title = line.to_string();
                break;
            }
        }
        // Only department-like lines found: the last one is the title.
        if title.is_empty() {
            title = std::mem::take(&mut department);
        }
        if title.len() < 3 {
            continue;
        }

        // The Ref: line sits just above the Ad Date, sometimes just after.
        let ref_scope = {
            let mut start = before.len().saturating_sub(150);
            while start < before.len() && !before.is_char_boundary(start) {
                start += 1;
            }
            let mut end = after.len().min(50);
            while end < after.len() && !after.is_char_boundary(end) {
                end += 1;
            }
            format!("{}{}", &before[start..], &after[..end])
        };
        let reference = ref_re.captures(&ref_scope).map(|caps| caps[1].to_string());

        let key = match &reference {
            Some(r) => format!("{title}|{r}"),
            None => format!("{title}|{department}"),
        };
        if !seen.insert(key) {
            continue;
        }

        let deadline_text = close_re.captures(after).and_then(|caps| {
            let raw = caps[1].trim().to_string();
            match raw.to_uppercase().as_str() {
                "N/A" | "NA" | "" => None,
                _ => Some(raw),
            }
        });

        let description = if department.is_empty() {
            format!("{title}. See EdUHK website for full details.")
        } else {
            format!("{title} — {department}. See EdUHK website for full details.")
        };

        postings.push(RawPosting {
            title,
            reference,
            apply_url: listing_url.to_string(),
            department,
            deadline_text,
            description: Some(description),
            ..RawPosting::default()
        });
    }

    postings
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.eduhk.hk/en/current-openings?category=academic-teaching-posts&department=&q=";

    const BODY: &str = "\
Home\n\
Search\n\
Assistant Professor of English Language Education\n\
Department of English Language Education\n\
Ref: 202600123\n\
Ad Date: 10 Aug 2026\n\
Close Date: 30 Sep 2026\n\
\n\
Senior Research Assistant\n\
Department of Psychology\n\
Ref: 202600456\n\
Ad Date: 12 Aug 2026\n\
Close Date: N/A\n\
Next\n";

    #[test]
    fn test_parse_body_recovers_cards() {
        let postings = parse_body(BODY, URL);
        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(
            first.title,
            "Assistant Professor of English Language Education"
        );
        assert_eq!(first.department, "Department of English Language Education");
        assert_eq!(first.reference.as_deref(), Some("202600123"));
        assert_eq!(first.deadline_text.as_deref(), Some("30 Sep 2026"));
        assert_eq!(first.apply_url, URL);
    }

    #[test]
    fn test_na_close_date_is_open_ended() {
        let postings = parse_body(BODY, URL);
        assert_eq!(postings[1].deadline_text, None);
    }

    #[test]
    fn test_nav_lines_never_become_titles() {
        let postings = parse_body(BODY, URL);
        assert!(postings
            .iter()
            .all(|p| p.title != "Next" && p.title != "Search" && p.title != "Home"));
    }

    #[test]
    fn test_department_only_card_uses_it_as_title() {
        let body = "Faculty of Education and Human Development\nAd Date: 1 Aug 2026\n";
        let postings = parse_body(body, URL);
        assert_eq!(postings.len(), 1);
        assert_eq!(
            postings[0].title,
            "Faculty of Education and Human Development"
        );
        assert!(postings[0].department.is_empty());
    }
}
