use crate::config::Config;
use crate::core::ocr::TextExtractor;
use crate::db::{Store, entries, log};
use crate::errors::{AppError, AppResult};
use crate::models::entry::append_extracted_text;
use crate::models::{EntryForm, NewEntry};
use crate::ui::messages::{info, warning};
use crate::utils::date::{file_stamp, now_seconds};
use std::fs;
use std::path::{Path, PathBuf};

/// High-level business logic for the `add` command.
pub struct AddLogic;

impl AddLogic {
    /// Validate the form, attach the photo (and its extracted text when an
    /// extractor is given) and store the entry. Returns the new id.
    pub fn apply(
        store: &Store,
        cfg: &Config,
        form: EntryForm,
        photo: Option<&Path>,
        extractor: Option<&dyn TextExtractor>,
    ) -> AppResult<i64> {
        let mut entry: NewEntry = form.into_new_entry()?;

        let stored_photo = match photo {
            Some(src) => Some(store_photo(src, &cfg.photos_path())?),
            None => None,
        };

        if let Some(path) = &stored_photo {
            entry.photo_path = path.to_string_lossy().to_string();

            if let Some(ex) = extractor {
                match ex.extract(path) {
                    Ok(text) if text.trim().is_empty() => warning("No text found in photo."),
                    Ok(text) => {
                        entry.description = append_extracted_text(&entry.description, &text);
                        info("Text added to description.");
                    }
                    Err(e) => warning(format!("Text extraction failed: {}", e)),
                }
            }
        }

        let id = match entries::insert_entry(&store.conn, &entry) {
            Ok(id) => id,
            Err(e) => {
                // Do not leave an orphaned copy behind a failed insert.
                if let Some(path) = &stored_photo
                    && let Err(rm) = fs::remove_file(path)
                {
                    warning(format!(
                        "Could not remove photo {}: {}",
                        path.display(),
                        rm
                    ));
                }
                return Err(e);
            }
        };

        if let Err(e) = log::ttlog(
            &store.conn,
            "add",
            &format!("entry {}", id),
            &format!(
                "{} [{}] {} → {} ({} pts)",
                entry.name,
                entry.category,
                entry.period_start,
                entry.period_end,
                entry.points
            ),
        ) {
            warning(format!("Failed to write internal log: {}", e));
        }

        Ok(id)
    }
}

/// Copy a photo into the photo directory as `cpd_photo_<stamp>.<ext>`.
pub fn store_photo(src: &Path, photos_dir: &Path) -> AppResult<PathBuf> {
    if !src.is_file() {
        return Err(AppError::Validation(format!(
            "Photo not found: {}",
            src.display()
        )));
    }

    fs::create_dir_all(photos_dir)?;

    let ext = src
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "png".to_string());
    let stem = format!("cpd_photo_{}", file_stamp(&now_seconds()));

    // Two photos in the same second get a numeric suffix.
    let mut dest = photos_dir.join(format!("{stem}.{ext}"));
    let mut n = 1;
    while dest.exists() {
        dest = photos_dir.join(format!("{stem}_{n}.{ext}"));
        n += 1;
    }

    fs::copy(src, &dest)?;
    info(format!("Photo saved: {}", dest.display()));
    Ok(dest)
}
