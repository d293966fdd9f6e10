pub mod config;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod notify;
pub mod process;

pub use process::{clean_table, clean_table_default, CleanTable, RawTable};
