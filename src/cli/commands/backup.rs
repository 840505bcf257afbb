use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::backup::{BackupLogic, BackupOutcome};
use crate::errors::{AppError, AppResult};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Backup {
        force,
        history,
        limit,
        prune,
        status,
    } = cmd
    {
        if *status {
            BackupLogic::print_status(cfg);
        }

        if *history {
            BackupLogic::print_history(cfg, *limit)?;
        }

        if let Some(keep) = prune {
            BackupLogic::prune(cfg, *keep);
        }

        // Bare `backup` runs the due-checked path; the listing flags alone do not.
        let listing_only = *status || *history || prune.is_some();
        if *force || !listing_only {
            let outcome = BackupLogic::run(cfg, *force)?;
            if let BackupOutcome::Failed(msg) = outcome {
                return Err(AppError::Archive(msg));
            }
        }
    }

    Ok(())
}
