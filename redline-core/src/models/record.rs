use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category::Category;
use super::flag::CategoryFlagSet;
use super::score::{CategoryScoreSet, Score};
use crate::error::RedlineError;
use crate::severity::SeverityBand;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id for payloads that arrive without one.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An image produced by one generating model for a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub model: String,
}

/// What a record is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentRef {
    /// An uploaded image that went through screening.
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        url: String,
    },
    /// A generated prompt, with the images each model produced for it.
    Prompt {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        images: Vec<GeneratedImage>,
    },
}

impl ContentRef {
    /// One-line description for tables and exports.
    pub fn summary(&self) -> &str {
        match self {
            ContentRef::Image { name: Some(name), .. } => name,
            ContentRef::Image { url, .. } => url,
            ContentRef::Prompt { text, .. } => text,
        }
    }
}

/// Output of a live scoring analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredAssessment {
    pub scores: CategoryScoreSet,
    /// Authoritative overall severity as supplied upstream.
    pub total: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ScoredAssessment {
    /// Max over the category scores. Display convenience only; `total` wins.
    pub fn recomputed_total(&self) -> Score {
        self.scores.max()
    }
}

/// The two ways a record's categories are assessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assessment {
    Scored(ScoredAssessment),
    Flagged { flags: CategoryFlagSet },
}

/// Whether an assessment counts as hitting a category.
pub trait CategoryMatch {
    fn matches_category(&self, category: Category, threshold: SeverityBand) -> bool;
}

impl CategoryMatch for ScoredAssessment {
    fn matches_category(&self, category: Category, threshold: SeverityBand) -> bool {
        self.scores
            .get(category)
            .is_some_and(|score| SeverityBand::from(score) >= threshold)
    }
}

impl CategoryMatch for CategoryFlagSet {
    fn matches_category(&self, category: Category, _threshold: SeverityBand) -> bool {
        self.is_flagged(category)
    }
}

impl CategoryMatch for Assessment {
    fn matches_category(&self, category: Category, threshold: SeverityBand) -> bool {
        match self {
            Assessment::Scored(scored) => scored.matches_category(category, threshold),
            Assessment::Flagged { flags } => flags.matches_category(category, threshold),
        }
    }
}

/// A single reviewed item. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationRecord {
    id: RecordId,
    created_at: NaiveDate,
    content: ContentRef,
    assessment: Assessment,
}

impl ModerationRecord {
    pub fn new(
        id: RecordId,
        created_at: NaiveDate,
        content: ContentRef,
        assessment: Assessment,
    ) -> Self {
        Self {
            id,
            created_at,
            content,
            assessment,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn created_at(&self) -> NaiveDate {
        self.created_at
    }

    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn matches_category(&self, category: Category, threshold: SeverityBand) -> bool {
        self.assessment.matches_category(category, threshold)
    }
}

/// Parse an upstream date into a calendar date.
///
/// Accepts `2024-05-01`, the catalog's compact `20240501`, or an RFC 3339
/// timestamp. Time of day is dropped.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, RedlineError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y%m%d") {
            return Ok(date);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.date_naive());
    }
    Err(RedlineError::InvalidRecord(format!("unrecognised date '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::flag::tests::flags_with;
    use crate::models::score::tests::scores_with;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_calendar_date_formats() {
        assert_eq!(parse_calendar_date("2024-05-03").unwrap(), date("2024-05-03"));
        assert_eq!(parse_calendar_date("20240503").unwrap(), date("2024-05-03"));
        assert_eq!(
            parse_calendar_date("2024-05-03T23:59:59+00:00").unwrap(),
            date("2024-05-03")
        );
        assert!(parse_calendar_date("May 3rd").is_err());
        assert!(parse_calendar_date("20241340").is_err());
    }

    #[test]
    fn test_scored_matches_at_threshold() {
        let scored = ScoredAssessment {
            scores: scores_with(&[(Category::Violence, 3)]),
            total: Score::new(3).unwrap(),
            reason: None,
        };
        assert!(scored.matches_category(Category::Violence, SeverityBand::Moderate));
        assert!(!scored.matches_category(Category::Violence, SeverityBand::Elevated));
        assert!(!scored.matches_category(Category::Sexual, SeverityBand::Moderate));
        // No etc score means no etc match.
        assert!(!scored.matches_category(Category::Etc, SeverityBand::Safe));
    }

    #[test]
    fn test_flagged_ignores_threshold() {
        let flags = flags_with(&[Category::Etc]);
        assert!(flags.matches_category(Category::Etc, SeverityBand::Severe));
        assert!(!flags.matches_category(Category::Privacy, SeverityBand::Safe));
    }

    #[test]
    fn test_recomputed_total_is_separate_from_authoritative() {
        let scored = ScoredAssessment {
            scores: scores_with(&[(Category::Illegal, 4)]),
            total: Score::new(2).unwrap(),
            reason: Some("borderline".to_string()),
        };
        assert_eq!(scored.total.get(), 2);
        assert_eq!(scored.recomputed_total().get(), 4);
    }

    #[test]
    fn test_record_serialises_tagged_variants() {
        let record = ModerationRecord::new(
            RecordId::new("p-1"),
            date("2024-05-01"),
            ContentRef::Prompt {
                text: "a prompt".to_string(),
                images: vec![],
            },
            Assessment::Flagged {
                flags: flags_with(&[Category::Violence]),
            },
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "p-1");
        assert_eq!(value["created_at"], "2024-05-01");
        assert_eq!(value["content"]["type"], "prompt");
        assert_eq!(value["assessment"]["kind"], "flagged");
        assert_eq!(value["assessment"]["flags"]["violence"], true);

        let back: ModerationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_content_summary() {
        let named = ContentRef::Image {
            name: Some("image_001.jpg".to_string()),
            url: "https://cdn/1.jpg".to_string(),
        };
        assert_eq!(named.summary(), "image_001.jpg");
        let unnamed = ContentRef::Image {
            name: None,
            url: "https://cdn/2.jpg".to_string(),
        };
        assert_eq!(unnamed.summary(), "https://cdn/2.jpg");
    }
}
