//! Plain data types shared by the store, the backup pipeline and the CLI.

pub mod backup_record;
pub mod category;
pub mod entry;

pub use backup_record::{BackupRecord, BackupStatus};
pub use category::Category;
pub use entry::{Entry, EntryForm, NewEntry};
