use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::category::Category;
use crate::error::RedlineError;

/// A 1 (no concern) to 5 (severe) score. Construction rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, RedlineError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Score(value as u8))
        } else {
            Err(RedlineError::InvalidScore(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = RedlineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-category scores of one analysed item.
///
/// Always carries every policy category. `etc` is optional because the
/// screening model does not score it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Category, Score>", into = "BTreeMap<Category, Score>")]
pub struct CategoryScoreSet {
    scores: BTreeMap<Category, Score>,
}

impl CategoryScoreSet {
    pub fn new(scores: impl IntoIterator<Item = (Category, Score)>) -> Result<Self, RedlineError> {
        let scores: BTreeMap<Category, Score> = scores.into_iter().collect();
        let missing: Vec<&str> = Category::POLICY
            .iter()
            .filter(|c| !scores.contains_key(c))
            .map(|c| c.id())
            .collect();
        if !missing.is_empty() {
            return Err(RedlineError::InvalidRecord(format!(
                "score set missing categories: {}",
                missing.join(", ")
            )));
        }
        Ok(Self { scores })
    }

    pub fn get(&self, category: Category) -> Option<Score> {
        self.scores.get(&category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, Score)> + '_ {
        self.scores.iter().map(|(c, s)| (*c, *s))
    }

    /// Highest score across all categories.
    pub fn max(&self) -> Score {
        self.scores
            .values()
            .copied()
            .max()
            .unwrap_or(Score(Score::MIN))
    }
}

impl TryFrom<BTreeMap<Category, Score>> for CategoryScoreSet {
    type Error = RedlineError;

    fn try_from(scores: BTreeMap<Category, Score>) -> Result<Self, Self::Error> {
        CategoryScoreSet::new(scores)
    }
}

impl From<CategoryScoreSet> for BTreeMap<Category, Score> {
    fn from(set: CategoryScoreSet) -> Self {
        set.scores
    }
}
