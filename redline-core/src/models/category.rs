use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RedlineError;

/// A policy dimension content is reviewed against.
///
/// The first nine variants are the scored policy categories. `Etc` is the
/// catch-all bucket used by the saved-prompt catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sexual,
    Violence,
    Discrimination,
    Illegal,
    Fake,
    Shocking,
    Culture,
    Privacy,
    Disrespect,
    Etc,
}

impl Category {
    /// Categories every score set must carry.
    pub const POLICY: [Category; 9] = [
        Category::Sexual,
        Category::Violence,
        Category::Discrimination,
        Category::Illegal,
        Category::Fake,
        Category::Shocking,
        Category::Culture,
        Category::Privacy,
        Category::Disrespect,
    ];

    /// Every category, in display order.
    pub const ALL: [Category; 10] = [
        Category::Sexual,
        Category::Violence,
        Category::Discrimination,
        Category::Illegal,
        Category::Fake,
        Category::Shocking,
        Category::Culture,
        Category::Privacy,
        Category::Disrespect,
        Category::Etc,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::Sexual => "sexual",
            Category::Violence => "violence",
            Category::Discrimination => "discrimination",
            Category::Illegal => "illegal",
            Category::Fake => "fake",
            Category::Shocking => "shocking",
            Category::Culture => "culture",
            Category::Privacy => "privacy",
            Category::Disrespect => "disrespect",
            Category::Etc => "etc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Sexual => "Sexual",
            Category::Violence => "Violence",
            Category::Discrimination => "Discrimination",
            Category::Illegal => "Illegal",
            Category::Fake => "Fake",
            Category::Shocking => "Shocking",
            Category::Culture => "Culture",
            Category::Privacy => "Privacy",
            Category::Disrespect => "Disrespect",
            Category::Etc => "Etc",
        }
    }

    pub fn is_policy(&self) -> bool {
        !matches!(self, Category::Etc)
    }
}

impl FromStr for Category {
    type Err = RedlineError;

    /// Case-insensitive: upstream payloads use both `violence` and `Violence`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.id().eq_ignore_ascii_case(needle))
            .ok_or_else(|| RedlineError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
