use super::category::Category;
use crate::errors::{AppError, AppResult};
use crate::utils::date::{DATE_FMT, TIMESTAMP_FMT};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One logged CPD activity, as stored.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub id: i64,
    pub created_at: NaiveDateTime, // ⇔ entries.created_at (TEXT "YYYY-MM-DD HH:MM:SS")
    pub period_start: NaiveDate,   // ⇔ entries.period_start (TEXT "YYYY-MM-DD")
    pub period_end: NaiveDate,     // ⇔ entries.period_end
    pub name: String,
    pub category: Category,
    pub description: String,
    pub photo_path: String, // "" means no photo
    pub points: u32,
}

impl Entry {
    pub fn period_start_str(&self) -> String {
        self.period_start.format(DATE_FMT).to_string()
    }

    pub fn period_end_str(&self) -> String {
        self.period_end.format(DATE_FMT).to_string()
    }

    pub fn created_at_str(&self) -> String {
        self.created_at.format(TIMESTAMP_FMT).to_string()
    }

    pub fn has_photo(&self) -> bool {
        !self.photo_path.is_empty()
    }
}

/// A validated entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub photo_path: String,
    pub points: u32,
}

impl NewEntry {
    /// Build and validate an entry from already-typed parts.
    pub fn new(
        period_start: NaiveDate,
        period_end: NaiveDate,
        name: &str,
        category: Category,
        description: &str,
    ) -> AppResult<Self> {
        let entry = Self {
            period_start,
            period_end,
            name: name.trim().to_string(),
            category,
            description: description.trim().to_string(),
            photo_path: String::new(),
            points: 0,
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }

    pub fn with_photo<S: Into<String>>(mut self, photo_path: S) -> Self {
        self.photo_path = photo_path.into();
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::Validation("Description is required".into()));
        }
        if self.category.as_str().trim().is_empty() {
            return Err(AppError::Validation(
                "Please select an activity type".into(),
            ));
        }
        if self.period_end < self.period_start {
            return Err(AppError::Validation(
                "End date cannot be before start date".into(),
            ));
        }
        Ok(())
    }
}

/// Raw form input as typed by the user, before any parsing.
#[derive(Debug, Clone, Default)]
pub struct EntryForm {
    pub start: Option<String>,
    pub end: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub description: String,
    pub points: Option<u32>,
}

impl EntryForm {
    /// Check the form in the order a user fills it in and build a `NewEntry`.
    pub fn into_new_entry(self) -> AppResult<NewEntry> {
        let start_raw = self
            .start
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Please select start date".into()))?;
        let end_raw = self
            .end
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Please select end date".into()))?;

        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }

        let category = self
            .category
            .as_deref()
            .and_then(Category::parse)
            .ok_or_else(|| AppError::Validation("Please select an activity type".into()))?;

        if self.description.trim().is_empty() {
            return Err(AppError::Validation("Description is required".into()));
        }

        let start = crate::utils::date::parse_date(&start_raw)
            .ok_or_else(|| AppError::InvalidDate(start_raw.clone()))?;
        let end = crate::utils::date::parse_date(&end_raw)
            .ok_or_else(|| AppError::InvalidDate(end_raw.clone()))?;

        Ok(NewEntry::new(start, end, &self.name, category, &self.description)?
            .with_points(self.points.unwrap_or(0)))
    }
}

/// Append extracted text to a description: replaces a blank description,
/// otherwise goes after a blank line. Blank text leaves it unchanged.
pub fn append_extracted_text(description: &str, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return description.to_string();
    }
    if description.trim().is_empty() {
        text.to_string()
    } else {
        format!("{description}\n\n{text}")
    }
}
