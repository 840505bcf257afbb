pub mod backup_log;
pub mod entries;
pub mod log;
pub mod migrate;
pub mod stats;
pub mod store;

pub use store::{Store, open_store};
