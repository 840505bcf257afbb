use serde::{Serialize, Serializer};
use std::fmt;

/// Activity type of an entry. The well-known kinds are matched
/// case-insensitively; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Paper,
    Conference,
    Project,
    Course,
    Other,
    Custom(String),
}

impl Category {
    /// Parse user input. Blank input is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }

        let known = match trimmed.to_lowercase().as_str() {
            "paper" => Some(Category::Paper),
            "conference" => Some(Category::Conference),
            "project" => Some(Category::Project),
            "course" => Some(Category::Course),
            "other" => Some(Category::Other),
            _ => None,
        };

        Some(known.unwrap_or_else(|| Category::Custom(trimmed.to_string())))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Paper => "Paper",
            Category::Conference => "Conference",
            Category::Project => "Project",
            Category::Course => "Course",
            Category::Other => "Other",
            Category::Custom(s) => s,
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &str {
        self.as_str()
    }

    /// Convert DB string → enum. Stored values are never blank, but old rows
    /// may be; those read back as `Other`.
    pub fn from_db_str(s: &str) -> Self {
        Category::parse(s).unwrap_or(Category::Other)
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Category::Custom(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
