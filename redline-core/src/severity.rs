//! Severity banding of 1-5 scores.
//!
//! | score | band     |
//! |-------|----------|
//! | 1     | Safe     |
//! | 2     | Low      |
//! | 3     | Moderate |
//! | 4     | Elevated |
//! | 5     | Severe   |
//!
//! Catalog O/X flags were produced upstream with the same banding: a category
//! is flagged when its band reaches the flag threshold (Moderate by default).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RedlineError;
use crate::models::{Category, CategoryScoreSet, Score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Safe,
    Low,
    Moderate,
    Elevated,
    Severe,
}

impl SeverityBand {
    pub const ALL: [SeverityBand; 5] = [
        SeverityBand::Safe,
        SeverityBand::Low,
        SeverityBand::Moderate,
        SeverityBand::Elevated,
        SeverityBand::Severe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::Safe => "safe",
            SeverityBand::Low => "low",
            SeverityBand::Moderate => "moderate",
            SeverityBand::Elevated => "elevated",
            SeverityBand::Severe => "severe",
        }
    }

    /// Display tier used to colour score cells.
    pub fn emphasis(&self) -> &'static str {
        match self {
            SeverityBand::Safe => "calm",
            SeverityBand::Low => "mild",
            SeverityBand::Moderate => "caution",
            SeverityBand::Elevated => "warning",
            SeverityBand::Severe => "danger",
        }
    }
}

impl From<Score> for SeverityBand {
    fn from(score: Score) -> Self {
        match score.get() {
            1 => SeverityBand::Safe,
            2 => SeverityBand::Low,
            3 => SeverityBand::Moderate,
            4 => SeverityBand::Elevated,
            _ => SeverityBand::Severe,
        }
    }
}

impl FromStr for SeverityBand {
    type Err = RedlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        SeverityBand::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| RedlineError::UnknownBand(s.to_string()))
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies raw scores and decides when a score counts as "flagged".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    flag_threshold: SeverityBand,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            flag_threshold: SeverityBand::Moderate,
        }
    }
}

impl Classifier {
    pub fn new(flag_threshold: SeverityBand) -> Self {
        Self { flag_threshold }
    }

    pub fn flag_threshold(&self) -> SeverityBand {
        self.flag_threshold
    }

    /// Band for a raw score. Out-of-range input is an error, never clamped.
    pub fn classify(&self, score: i64) -> Result<SeverityBand, RedlineError> {
        Score::new(score).map(SeverityBand::from)
    }

    pub fn is_flagged(&self, score: Score) -> bool {
        SeverityBand::from(score) >= self.flag_threshold
    }
}

/// Convenience aggregate: the highest category score. Not the authoritative total.
pub fn total_of(set: &CategoryScoreSet) -> Score {
    set.max()
}

/// Categories whose band is at or above `band`.
pub fn categories_above(set: &CategoryScoreSet, band: SeverityBand) -> BTreeSet<Category> {
    set.iter()
        .filter(|(_, score)| SeverityBand::from(*score) >= band)
        .map(|(category, _)| category)
        .collect()
}
