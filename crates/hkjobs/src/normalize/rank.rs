use crate::record::{PositionType, RankCategory};

/// Keyword table for rank classification, checked in order. Longer, more
/// specific phrases come first so "Assistant Professor" never falls through
/// to the bare "professor" entry.
const RANK_KEYWORDS: [(&str, RankCategory); 10] = [
    ("chair professor", RankCategory::Professor),
    ("associate professor", RankCategory::AssociateProfessor),
    ("assistant professor", RankCategory::AssistantProfessor),
    ("professor", RankCategory::Professor),
    ("postdoc", RankCategory::Postdoc),
    ("research fellow", RankCategory::Postdoc),
    ("lecturer", RankCategory::Lecturer),
    ("teaching fellow", RankCategory::Lecturer),
    ("instructor", RankCategory::Lecturer),
    ("clinical", RankCategory::Lecturer),
];

/// Infer the rank category from a free-text job title. First match wins;
/// no match classifies as `Other`.
pub fn classify_rank(title: &str) -> RankCategory {
    let title = title.to_lowercase();
    for (keyword, rank) in RANK_KEYWORDS {
        if title.contains(keyword) {
            return rank;
        }
    }
    RankCategory::Other
}

/// Infer the position type from a job title.
pub fn detect_position_type(title: &str) -> PositionType {
    let title = title.to_lowercase();
    if title.contains("temporary") || title.contains("fixed-term") {
        PositionType::FixedTerm
    } else if title.contains("part-time") {
        PositionType::PartTime
    } else {
        PositionType::FullTime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_professor_is_not_professor() {
        assert_eq!(
            classify_rank("Assistant Professor in Computer Science"),
            RankCategory::AssistantProfessor
        );
    }

    #[test]
    fn test_associate_before_bare_professor() {
        assert_eq!(
            classify_rank("Associate Professor of Mathematics"),
            RankCategory::AssociateProfessor
        );
    }

    #[test]
    fn test_chair_professor_is_professor() {
        assert_eq!(
            classify_rank("Chair Professor of Physics"),
            RankCategory::Professor
        );
        assert_eq!(classify_rank("Professor of Law"), RankCategory::Professor);
    }

    #[test]
    fn test_research_fellow_is_postdoc() {
        assert_eq!(
            classify_rank("Research Fellow (Biology)"),
            RankCategory::Postdoc
        );
        assert_eq!(
            classify_rank("Postdoctoral Fellow in Chemistry"),
            RankCategory::Postdoc
        );
    }

    #[test]
    fn test_teaching_staff_is_lecturer() {
        assert_eq!(classify_rank("Senior Lecturer"), RankCategory::Lecturer);
        assert_eq!(classify_rank("Teaching Fellow"), RankCategory::Lecturer);
        assert_eq!(classify_rank("Instructor I"), RankCategory::Lecturer);
    }

    #[test]
    fn test_unmatched_title_is_other() {
        assert_eq!(classify_rank("Executive Officer"), RankCategory::Other);
    }

    #[test]
    fn test_position_type_detection() {
        assert_eq!(
            detect_position_type("Temporary Research Assistant"),
            PositionType::FixedTerm
        );
        assert_eq!(
            detect_position_type("Part-time Tutor"),
            PositionType::PartTime
        );
        assert_eq!(
            detect_position_type("Assistant Professor"),
            PositionType::FullTime
        );
    }
}
