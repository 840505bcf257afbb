// src/export/model.rs

use crate::models::Entry;
use serde::Serialize;

/// Flat row used by every export format.
#[derive(Serialize, Clone, Debug)]
pub struct EntryExport {
    pub id: i64,
    pub created_at: String,
    pub period_start: String,
    pub period_end: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub points: u32,
    pub photo: String,
}

impl From<&Entry> for EntryExport {
    fn from(e: &Entry) -> Self {
        Self {
            id: e.id,
            created_at: e.created_at_str(),
            period_start: e.period_start_str(),
            period_end: e.period_end_str(),
            name: e.name.clone(),
            category: e.category.to_string(),
            description: e.description.clone(),
            points: e.points,
            photo: e.photo_path.clone(),
        }
    }
}

/// CSV header, in column order.
pub(crate) const CSV_HEADERS: [&str; 8] = [
    "Entry Date",
    "Start Date",
    "End Date",
    "Activity Name",
    "Activity Type",
    "Description",
    "CPD Points",
    "Photo",
];

pub(crate) fn entry_to_row(e: &EntryExport) -> [String; 8] {
    [
        e.created_at.clone(),
        e.period_start.clone(),
        e.period_end.clone(),
        e.name.clone(),
        e.category.clone(),
        e.description.clone(),
        e.points.to_string(),
        e.photo.clone(),
    ]
}
