use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::{log, open_store};
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};
use std::fs;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file (skipped with `--test`)
///  - the SQLite database and all pending migrations
///  - the photo, backup and export directories
pub fn handle(cli: &Cli) -> AppResult<()> {
    let cfg = Config::init_all(cli.db.clone(), cli.test)?;
    let db_path = cfg.database_path();

    println!("⚙️  Initializing cpdtracker…");
    if !cli.test {
        println!("📄 Config file : {}", Config::config_file().display());
    }
    println!("🗄️  Database   : {}", db_path.display());

    let store = open_store(&db_path)?;

    for dir in [cfg.photos_path(), cfg.backups_path(), cfg.exports_path()] {
        fs::create_dir_all(&dir)?;
    }

    success(format!("Database initialized at {}", db_path.display()));

    if let Err(e) = log::ttlog(
        &store.conn,
        "init",
        "Database initialized",
        &format!("Database initialized at {}", db_path.display()),
    ) {
        warning(format!("Failed to write internal log: {}", e));
    }

    store.close()?;

    println!("🎉 cpdtracker initialization completed!");
    Ok(())
}
