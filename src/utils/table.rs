//! Table rendering utilities for CLI outputs.

pub struct Column {
    pub header: String,
    /// Upper bound for the column; longer cells are cut with "...".
    pub max_width: usize,
}

impl Column {
    pub fn new(header: &str, max_width: usize) -> Self {
        Self {
            header: header.to_string(),
            max_width,
        }
    }
}

pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let content = self
                    .rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .max()
                    .unwrap_or(0);
                content
                    .max(col.header.chars().count())
                    .min(col.max_width)
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();

        // Header
        for (col, w) in self.columns.iter().zip(&widths) {
            out.push_str(&format!("{:<width$} ", col.header, width = *w));
        }
        out.push('\n');

        for w in &widths {
            out.push_str(&"-".repeat(*w));
            out.push(' ');
        }
        out.push('\n');

        // Rows
        for row in &self.rows {
            for (i, w) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                out.push_str(&format!("{:<width$} ", truncate(cell, *w), width = *w));
            }
            out.push('\n');
        }

        out
    }
}

/// Cut `s` to `width` visible chars, single-line.
pub fn truncate(s: &str, width: usize) -> String {
    let flat = s.replace(['\n', '\r'], " ");
    if flat.chars().count() <= width {
        return flat;
    }
    if width <= 3 {
        return flat.chars().take(width).collect();
    }
    let mut cut: String = flat.chars().take(width - 3).collect();
    cut.push_str("...");
    cut
}
