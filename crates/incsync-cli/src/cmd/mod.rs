pub mod check;
pub mod create;
pub mod duplicates;
pub mod init;
pub mod lifecycle;
pub mod migrate;
pub mod refresh;
pub mod status;
