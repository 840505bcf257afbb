use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for cpdtracker
/// CLI application to record CPD activities with SQLite and zip backups
#[derive(Parser)]
#[command(
    name = "cpdtracker",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track Continuing Professional Development activities and keep them safely backed up",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Run configuration file migrations if needed")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/vim/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Record a CPD activity
    Add {
        /// First day of the activity (YYYY-MM-DD)
        #[arg(long = "start", value_name = "DATE")]
        start: Option<String>,

        /// Last day of the activity (YYYY-MM-DD)
        #[arg(long = "end", value_name = "DATE")]
        end: Option<String>,

        #[arg(long = "name", default_value = "", help = "Activity name")]
        name: String,

        #[arg(
            long = "category",
            help = "Activity type: Paper, Conference, Project, Course, Other or any custom text"
        )]
        category: Option<String>,

        #[arg(long = "description", default_value = "", help = "What was done")]
        description: String,

        #[arg(long = "points", help = "CPD points earned (default 0)")]
        points: Option<u32>,

        #[arg(long = "photo", value_name = "FILE", help = "Attach a photo of the evidence")]
        photo: Option<String>,

        #[arg(
            long = "ocr",
            requires = "photo",
            help = "Append text extracted from the photo to the description"
        )]
        ocr: bool,

        #[arg(long = "no-backup", help = "Skip the scheduled backup after saving")]
        no_backup: bool,
    },

    /// List recorded activities
    List {
        #[arg(long, short, help = "Only show one activity type")]
        category: Option<String>,

        #[arg(long = "summary", help = "Show point totals per activity type")]
        summary: bool,
    },

    /// Back up the database and photos to a zip archive
    Backup {
        #[arg(long, short = 'f', help = "Run a backup now, even if none is due")]
        force: bool,

        #[arg(long = "history", help = "List recorded backup attempts")]
        history: bool,

        #[arg(long = "limit", requires = "history", help = "Show at most N history rows")]
        limit: Option<usize>,

        #[arg(long = "prune", value_name = "N", help = "Keep only the N newest archives")]
        prune: Option<usize>,

        #[arg(long = "status", help = "Show the last backup and whether one is due")]
        status: bool,
    },

    /// Export recorded activities
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: Option<String>,

        #[arg(
            long,
            value_name = "RANGE",
            help = "Filter export by year/month/day or a custom range"
        )]
        range: Option<String>,

        #[arg(long, short = 'f')]
        force: bool,
    },
}
