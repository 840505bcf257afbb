use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::add::AddLogic;
use crate::core::backup::{BackupScheduler, Trigger, report_outcome};
use crate::core::ocr::{CommandExtractor, TextExtractor};
use crate::db::open_store;
use crate::errors::AppResult;
use crate::models::EntryForm;
use crate::ui::messages::{success, warning};
use std::path::PathBuf;

/// Record a CPD activity, then run the scheduled backup.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Add {
        start,
        end,
        name,
        category,
        description,
        points,
        photo,
        ocr,
        no_backup,
    } = cmd
    {
        let form = EntryForm {
            start: start.clone(),
            end: end.clone(),
            name: name.clone(),
            category: category.clone(),
            description: description.clone(),
            points: *points,
        };

        // Without a usable extractor the entry is still saved, just without text.
        let extractor = if *ocr {
            match CommandExtractor::from_config(cfg) {
                Ok(ex) => Some(ex),
                Err(e) => {
                    warning(format!("Text extraction skipped: {}", e));
                    None
                }
            }
        } else {
            None
        };
        let photo = photo.as_deref().map(PathBuf::from);

        let store = open_store(cfg.database_path())?;
        let id = AddLogic::apply(
            &store,
            cfg,
            form,
            photo.as_deref(),
            extractor.as_ref().map(|e| e as &dyn TextExtractor),
        )?;
        store.close()?;

        success(format!("Entry saved successfully (id {id})"));

        if *no_backup {
            return Ok(());
        }

        // The entry is already stored; a backup problem never fails the save.
        match BackupScheduler::from_config(cfg).spawn(Trigger::Scheduled) {
            Ok(handle) => report_outcome(&handle.wait()),
            Err(e) => warning(format!("Could not start backup: {}", e)),
        }
    }

    Ok(())
}
