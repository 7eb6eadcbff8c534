use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::category::Category;
use crate::error::RedlineError;

/// O/X include flags from the saved-prompt catalog. Covers all ten categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Category, bool>", into = "BTreeMap<Category, bool>")]
pub struct CategoryFlagSet {
    flags: BTreeMap<Category, bool>,
}

impl CategoryFlagSet {
    pub fn new(flags: impl IntoIterator<Item = (Category, bool)>) -> Result<Self, RedlineError> {
        let flags: BTreeMap<Category, bool> = flags.into_iter().collect();
        let missing: Vec<&str> = Category::ALL
            .iter()
            .filter(|c| !flags.contains_key(c))
            .map(|c| c.id())
            .collect();
        if !missing.is_empty() {
            return Err(RedlineError::InvalidRecord(format!(
                "flag set missing categories: {}",
                missing.join(", ")
            )));
        }
        Ok(Self { flags })
    }

    pub fn is_flagged(&self, category: Category) -> bool {
        self.flags.get(&category).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, bool)> + '_ {
        self.flags.iter().map(|(c, f)| (*c, *f))
    }

    /// Categories marked O, in display order.
    pub fn flagged(&self) -> impl Iterator<Item = Category> + '_ {
        self.iter().filter(|(_, f)| *f).map(|(c, _)| c)
    }
}

impl TryFrom<BTreeMap<Category, bool>> for CategoryFlagSet {
    type Error = RedlineError;

    fn try_from(flags: BTreeMap<Category, bool>) -> Result<Self, Self::Error> {
        CategoryFlagSet::new(flags)
    }
}

impl From<CategoryFlagSet> for BTreeMap<Category, bool> {
    fn from(set: CategoryFlagSet) -> Self {
        set.flags
    }
}

/// Parse a catalog mark: `O` includes, `X` excludes.
pub fn parse_mark(mark: &str) -> Result<bool, RedlineError> {
    match mark.trim() {
        "O" | "o" => Ok(true),
        "X" | "x" => Ok(false),
        other => Err(RedlineError::InvalidRecord(format!(
            "flag mark must be O or X, got '{}'",
            other
        ))),
    }
}

pub fn mark(flagged: bool) -> &'static str {
    if flagged {
        "O"
    } else {
        "X"
    }
}
