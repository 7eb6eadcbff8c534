//! Date-range and category filters over moderation records.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Category, ModerationRecord};
use crate::severity::{Classifier, SeverityBand};

/// What the reviewer has selected in the filter panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Inclusive; `None` means unbounded past.
    pub date_from: Option<NaiveDate>,
    /// Inclusive; `None` means unbounded future.
    pub date_to: Option<NaiveDate>,
    pub selected_categories: BTreeSet<Category>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last `days` days up to and including `today`. A lookback past the
    /// calendar's range leaves the start unbounded.
    pub fn last_days(today: NaiveDate, days: i64) -> Self {
        let date_from = Duration::try_days(days).and_then(|d| today.checked_sub_signed(d));
        Self {
            date_from,
            date_to: Some(today),
            selected_categories: BTreeSet::new(),
        }
    }

    pub fn from_date(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn to_date(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.selected_categories.extend(categories);
        self
    }

    /// Both bounds present and `date_from > date_to`.
    pub fn is_inverted(&self) -> bool {
        matches!((self.date_from, self.date_to), (Some(from), Some(to)) if from > to)
    }
}

pub trait RecordFilter {
    fn matches(&self, record: &ModerationRecord, spec: &FilterSpec) -> bool;
}

/// Inclusive calendar-date window. An inverted window matches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRangeFilter;

impl RecordFilter for DateRangeFilter {
    fn matches(&self, record: &ModerationRecord, spec: &FilterSpec) -> bool {
        if spec.is_inverted() {
            return false;
        }
        let created = record.created_at();
        spec.date_from.map_or(true, |from| created >= from)
            && spec.date_to.map_or(true, |to| created <= to)
    }
}

/// OR across the selected categories. No selection means no filtering.
#[derive(Debug, Clone, Copy)]
pub struct CategoryFilter {
    threshold: SeverityBand,
}

impl CategoryFilter {
    pub fn new(classifier: &Classifier) -> Self {
        Self {
            threshold: classifier.flag_threshold(),
        }
    }
}

impl RecordFilter for CategoryFilter {
    fn matches(&self, record: &ModerationRecord, spec: &FilterSpec) -> bool {
        spec.selected_categories.is_empty()
            || spec
                .selected_categories
                .iter()
                .any(|c| record.matches_category(*c, self.threshold))
    }
}

/// Date range AND categories.
#[derive(Debug, Clone, Copy)]
pub struct ReviewFilter {
    dates: DateRangeFilter,
    categories: CategoryFilter,
}

impl ReviewFilter {
    pub fn new(classifier: &Classifier) -> Self {
        Self {
            dates: DateRangeFilter,
            categories: CategoryFilter::new(classifier),
        }
    }
}

impl RecordFilter for ReviewFilter {
    fn matches(&self, record: &ModerationRecord, spec: &FilterSpec) -> bool {
        self.dates.matches(record, spec) && self.categories.matches(record, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::score::tests::scores_with;
    use crate::models::{Assessment, ContentRef, RecordId, Score, ScoredAssessment};
    use crate::store::tests::prompt_record;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn scored_record(id: &str, day: &str, overrides: &[(Category, i64)]) -> ModerationRecord {
        ModerationRecord::new(
            RecordId::new(id),
            date(day),
            ContentRef::Image {
                name: None,
                url: format!("https://cdn.example/{id}.jpg"),
            },
            Assessment::Scored(ScoredAssessment {
                scores: scores_with(overrides),
                total: Score::new(1).unwrap(),
                reason: None,
            }),
        )
    }

    #[test]
    fn test_date_range_inclusive_bounds() {
        let record = prompt_record("1", "2024-05-03", &[]);
        let spec = FilterSpec::new()
            .from_date(date("2024-05-01"))
            .to_date(date("2024-05-03"));
        assert!(DateRangeFilter.matches(&record, &spec));

        let spec = FilterSpec::new().from_date(date("2024-05-04"));
        assert!(!DateRangeFilter.matches(&record, &spec));

        let spec = FilterSpec::new().from_date(date("2024-05-03"));
        assert!(DateRangeFilter.matches(&record, &spec));
    }

    #[test]
    fn test_date_range_unbounded() {
        let record = prompt_record("1", "1999-01-01", &[]);
        assert!(DateRangeFilter.matches(&record, &FilterSpec::new()));
        let spec = FilterSpec::new().to_date(date("2000-01-01"));
        assert!(DateRangeFilter.matches(&record, &spec));
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let spec = FilterSpec::new()
            .from_date(date("2024-05-10"))
            .to_date(date("2024-05-01"));
        assert!(spec.is_inverted());
        for day in ["2024-04-30", "2024-05-01", "2024-05-05", "2024-05-10", "2024-05-11"] {
            let record = prompt_record("1", day, &[Category::Violence]);
            assert!(!DateRangeFilter.matches(&record, &spec), "{day} should not match");
        }
    }

    #[test]
    fn test_empty_selection_matches_everything() {
        let filter = CategoryFilter::new(&Classifier::default());
        let spec = FilterSpec::new();
        assert!(filter.matches(&prompt_record("1", "2024-05-01", &[]), &spec));
        assert!(filter.matches(&scored_record("2", "2024-05-01", &[]), &spec));
        assert!(filter.matches(
            &prompt_record("3", "2024-05-01", &[Category::Sexual]),
            &spec
        ));
    }

    #[test]
    fn test_violence_selection_on_scored_records() {
        let filter = CategoryFilter::new(&Classifier::default());
        let spec = FilterSpec::new().with_categories([Category::Violence]);
        for (score, expected) in [(1, false), (2, false), (3, true), (4, true), (5, true)] {
            let record = scored_record("s", "2024-05-01", &[(Category::Violence, score)]);
            assert_eq!(filter.matches(&record, &spec), expected, "violence score {score}");
        }
    }

    #[test]
    fn test_violence_selection_on_flagged_records() {
        let filter = CategoryFilter::new(&Classifier::default());
        let spec = FilterSpec::new().with_categories([Category::Violence]);
        assert!(filter.matches(
            &prompt_record("1", "2024-05-01", &[Category::Violence]),
            &spec
        ));
        assert!(!filter.matches(
            &prompt_record("2", "2024-05-01", &[Category::Shocking]),
            &spec
        ));
    }

    #[test]
    fn test_selection_is_or() {
        let filter = CategoryFilter::new(&Classifier::default());
        let spec = FilterSpec::new().with_categories([Category::Sexual, Category::Privacy]);
        assert!(filter.matches(&prompt_record("1", "2024-05-01", &[Category::Privacy]), &spec));
        assert!(filter.matches(&scored_record("2", "2024-05-01", &[(Category::Sexual, 4)]), &spec));
        assert!(!filter.matches(&prompt_record("3", "2024-05-01", &[Category::Fake]), &spec));
    }

    #[test]
    fn test_threshold_follows_classifier() {
        let strict = CategoryFilter::new(&Classifier::new(SeverityBand::Severe));
        let spec = FilterSpec::new().with_categories([Category::Illegal]);
        let four = scored_record("1", "2024-05-01", &[(Category::Illegal, 4)]);
        let five = scored_record("2", "2024-05-01", &[(Category::Illegal, 5)]);
        assert!(!strict.matches(&four, &spec));
        assert!(strict.matches(&five, &spec));
    }

    #[test]
    fn test_review_filter_is_and() {
        let filter = ReviewFilter::new(&Classifier::default());
        let spec = FilterSpec::new()
            .from_date(date("2024-05-01"))
            .to_date(date("2024-05-31"))
            .with_categories([Category::Violence]);
        assert!(filter.matches(&prompt_record("1", "2024-05-15", &[Category::Violence]), &spec));
        assert!(!filter.matches(&prompt_record("2", "2024-06-01", &[Category::Violence]), &spec));
        assert!(!filter.matches(&prompt_record("3", "2024-05-15", &[Category::Fake]), &spec));
    }

    #[test]
    fn test_last_days() {
        let spec = FilterSpec::last_days(date("2024-05-31"), 30);
        assert_eq!(spec.date_from, Some(date("2024-05-01")));
        assert_eq!(spec.date_to, Some(date("2024-05-31")));
        assert!(spec.selected_categories.is_empty());
    }

    #[test]
    fn test_last_days_beyond_calendar_is_unbounded() {
        let today = date("2024-05-31");
        for days in [1_000_000_000, i64::MAX] {
            let spec = FilterSpec::last_days(today, days);
            assert_eq!(spec.date_from, None);
            assert_eq!(spec.date_to, Some(today));
        }
    }

    #[test]
    fn test_spec_deserialises_with_defaults() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"selected_categories":["violence","etc"]}"#).unwrap();
        assert_eq!(spec.date_from, None);
        assert_eq!(spec.selected_categories.len(), 2);

        let spec: FilterSpec = serde_json::from_str(r#"{"date_from":"2024-05-01"}"#).unwrap();
        assert_eq!(spec.date_from, Some(date("2024-05-01")));
    }
}
