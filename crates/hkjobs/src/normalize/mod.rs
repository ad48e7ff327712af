pub mod dates;
pub mod id;
pub mod rank;

pub use dates::parse_date;
pub use id::make_id;
pub use rank::{classify_rank, detect_position_type};

use chrono::NaiveDate;

use crate::adapters::RawPosting;
use crate::record::{JobRecord, University};

/// Collapse internal whitespace and trim. Applied to every free-text field.
pub fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a raw posting into the canonical record shape. `is_new` and
/// `date_added` are provisional here; the merge engine owns them.
pub fn normalize(raw: &RawPosting, university: University, run_date: NaiveDate) -> JobRecord {
    let title = clean(&raw.title);
    let department = clean(&raw.department);
    let reference = raw.reference.as_deref().map(clean).unwrap_or_default();

    // No stable reference: derive the id from what does identify the posting.
    let id_key = if reference.is_empty() {
        format!("{}|{}|{}", title, department, raw.apply_url)
    } else {
        reference.clone()
    };

    JobRecord {
        id: make_id(university, &id_key),
        rank: classify_rank(&title),
        position_type: raw
            .position_type
            .unwrap_or_else(|| detect_position_type(&title)),
        university,
        university_full: university.full_name().to_string(),
        deadline: raw.deadline_text.as_deref().and_then(parse_date),
        is_new: true,
        date_added: run_date,
        salary: raw.salary.as_deref().map(clean).unwrap_or_default(),
        start_date: raw.start_date_text.as_deref().and_then(parse_date),
        apply_url: raw.apply_url.clone(),
        description: raw.description.as_deref().map(clean).unwrap_or_default(),
        department,
        reference,
        title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PositionType, RankCategory};

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
    }

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean("  a \t b\n c  "), "a b c");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn test_normalize_builds_full_record() {
        let raw = RawPosting {
            title: "Assistant  Professor in Computer Science".to_string(),
            reference: Some("9876543".to_string()),
            apply_url: "https://jobs.example.hk/job_detail.php?job=9876543".to_string(),
            department: "Department of Computing".to_string(),
            deadline_text: Some("27 February 2026".to_string()),
            ..RawPosting::default()
        };

        let record = normalize(&raw, University::PolyU, run_date());

        assert_eq!(record.id, "POLYU-9876543");
        assert_eq!(record.title, "Assistant Professor in Computer Science");
        assert_eq!(record.rank, RankCategory::AssistantProfessor);
        assert_eq!(record.university, University::PolyU);
        assert_eq!(
            record.university_full,
            "Hong Kong Polytechnic University"
        );
        assert_eq!(
            record.deadline,
            NaiveDate::from_ymd_opt(2026, 2, 27)
        );
        assert_eq!(record.position_type, PositionType::FullTime);
        assert_eq!(record.date_added, run_date());
        assert!(record.is_new);
    }

    #[test]
    fn test_missing_reference_derives_stable_id() {
        let raw = RawPosting {
            title: "Lecturer in History".to_string(),
            apply_url: "https://example.hk/postings/42".to_string(),
            department: "History".to_string(),
            ..RawPosting::default()
        };

        let first = normalize(&raw, University::Lu, run_date());
        let second = normalize(&raw, University::Lu, run_date());
        assert_eq!(first.id, second.id);
        assert!(first.id.starts_with("LU-"));
        assert!(first.reference.is_empty());
    }

    #[test]
    fn test_unparseable_deadline_keeps_record() {
        let raw = RawPosting {
            title: "Professor of Music".to_string(),
            reference: Some("111".to_string()),
            apply_url: "https://example.hk/111".to_string(),
            deadline_text: Some("open until filled".to_string()),
            ..RawPosting::default()
        };

        let record = normalize(&raw, University::Hku, run_date());
        assert_eq!(record.deadline, None);
        assert_eq!(record.rank, RankCategory::Professor);
    }

    #[test]
    fn test_position_type_hint_wins_over_title() {
        let raw = RawPosting {
            title: "Part-time Tutor".to_string(),
            reference: Some("5".to_string()),
            apply_url: "https://example.hk/5".to_string(),
            position_type: Some(PositionType::FullTime),
            ..RawPosting::default()
        };

        let record = normalize(&raw, University::CityU, run_date());
        assert_eq!(record.position_type, PositionType::FullTime);
    }
}
