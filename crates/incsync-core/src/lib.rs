pub mod catalog;
pub mod config;
pub mod desync;
pub mod duplicates;
pub mod error;
pub mod io;
pub mod lifecycle;
pub mod metadata;
pub mod paths;
pub mod spec_doc;
pub mod sync_settings;
pub mod tasks;
pub mod tracker;
pub mod types;
pub mod workspace;

pub use error::{IncsyncError, Result};
