pub mod engine;
pub mod keys;
pub mod table;

pub use engine::{aggregate, StreamAggregator};
pub use keys::{file_extension, AuthorByFileType, AuthorKey, AuthorOnly, FileTypeKey, KeyPolicy, NO_EXTENSION};
pub use table::{AggregateTable, RunningTotal};
