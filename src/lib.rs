pub mod aggregate;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod git;
pub mod hot;
pub mod line;
pub mod model;
pub mod numstat;
pub mod patterns;
pub mod people;
pub mod secure;
pub mod style;
pub mod top;
pub mod util;
