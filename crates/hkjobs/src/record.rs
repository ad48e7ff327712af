use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The eight covered institutions. Codes are fixed; the CSV stores both the
/// short code and the full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum University {
    CityU,
    Cuhk,
    EdUhk,
    Hkbu,
    Hku,
    Hkust,
    Lu,
    PolyU,
}

impl University {
    pub const ALL: [University; 8] = [
        University::CityU,
        University::Cuhk,
        University::EdUhk,
        University::Hkbu,
        University::Hku,
        University::Hkust,
        University::Lu,
        University::PolyU,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            University::CityU => "CityU",
            University::Cuhk => "CUHK",
            University::EdUhk => "EdUHK",
            University::Hkbu => "HKBU",
            University::Hku => "HKU",
            University::Hkust => "HKUST",
            University::Lu => "LU",
            University::PolyU => "PolyU",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            University::CityU => "City University of Hong Kong",
            University::Cuhk => "Chinese University of Hong Kong",
            University::EdUhk => "Education University of Hong Kong",
            University::Hkbu => "Hong Kong Baptist University",
            University::Hku => "University of Hong Kong",
            University::Hkust => "HK University of Science & Technology",
            University::Lu => "Lingnan University",
            University::PolyU => "Hong Kong Polytechnic University",
        }
    }

    /// Case-insensitive lookup by short code. Accepts "lingnan" as an alias
    /// for LU, matching the name the career site itself uses.
    pub fn from_code(code: &str) -> Option<University> {
        let code = code.trim();
        if code.eq_ignore_ascii_case("lingnan") {
            return Some(University::Lu);
        }
        University::ALL
            .into_iter()
            .find(|u| u.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for University {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for University {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for University {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        University::from_code(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown university code '{raw}'")))
    }
}

/// Canonical academic seniority bucket, assigned from free-text titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankCategory {
    Professor,
    AssociateProfessor,
    AssistantProfessor,
    Postdoc,
    Lecturer,
    Other,
}

impl RankCategory {
    /// The text form the presentation layer expects in the `rank` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            RankCategory::Professor => "Professor",
            RankCategory::AssociateProfessor => "Associate Professor",
            RankCategory::AssistantProfessor => "Assistant Professor",
            RankCategory::Postdoc => "Postdoc",
            RankCategory::Lecturer => "Lecturer",
            RankCategory::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> RankCategory {
        match raw.trim() {
            "Professor" => RankCategory::Professor,
            "Associate Professor" => RankCategory::AssociateProfessor,
            "Assistant Professor" => RankCategory::AssistantProfessor,
            "Postdoc" => RankCategory::Postdoc,
            "Lecturer" => RankCategory::Lecturer,
            _ => RankCategory::Other,
        }
    }
}

impl fmt::Display for RankCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RankCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RankCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RankCategory::parse(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionType {
    FullTime,
    PartTime,
    FixedTerm,
    Unknown,
}

impl PositionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionType::FullTime => "Full-time",
            PositionType::PartTime => "Part-time",
            PositionType::FixedTerm => "Fixed-term",
            PositionType::Unknown => "Unknown",
        }
    }

    pub fn parse(raw: &str) -> PositionType {
        match raw.trim() {
            "Full-time" => PositionType::FullTime,
            "Part-time" => PositionType::PartTime,
            "Fixed-term" => PositionType::FixedTerm,
            _ => PositionType::Unknown,
        }
    }
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PositionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PositionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(PositionType::parse(&raw))
    }
}

/// One job posting. Field order is the CSV column order; field names are the
/// CSV header names, so the struct round-trips through `csv` unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub rank: RankCategory,
    pub university: University,
    pub university_full: String,
    pub department: String,
    #[serde(with = "wire_date_opt")]
    pub deadline: Option<NaiveDate>,
    #[serde(with = "wire_bool")]
    pub is_new: bool,
    #[serde(with = "wire_date")]
    pub date_added: NaiveDate,
    #[serde(default)]
    pub reference: String,
    pub position_type: PositionType,
    #[serde(default)]
    pub salary: String,
    #[serde(with = "wire_date_opt", default)]
    pub start_date: Option<NaiveDate>,
    pub apply_url: String,
    #[serde(default)]
    pub description: String,
}

/// Required `%Y-%m-%d` date column.
mod wire_date {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Optional date column: empty cell means absent. Junk left behind by older
/// runs deserializes to absent rather than failing the row.
mod wire_date_opt {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok())
    }
}

/// `TRUE` / `FALSE` tokens, as the presentation layer expects.
mod wire_bool {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "TRUE" } else { "FALSE" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.trim().eq_ignore_ascii_case("true"))
    }
}
