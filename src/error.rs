use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalystError>;

#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("Cannot read history from {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("Cannot write export {}: {source}", path.display())]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid pattern '{label}': {source}")]
    Pattern {
        label: String,
        #[source]
        source: regex::Error,
    },
    #[error("History traversal interrupted")]
    Interrupted,
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Git open error: {0}")]
    Open(#[from] Box<gix::open::Error>),
    #[error("Git discover error: {0}")]
    Discover(#[from] Box<gix::discover::Error>),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit lookup error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Head peel error: {0}")]
    HeadPeel(#[from] Box<gix::head::peel::to_commit::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::open::Error> for AnalystError {
    fn from(err: gix::open::Error) -> Self {
        AnalystError::Open(Box::new(err))
    }
}

impl From<gix::discover::Error> for AnalystError {
    fn from(err: gix::discover::Error) -> Self {
        AnalystError::Discover(Box::new(err))
    }
}

impl From<gix::object::find::existing::Error> for AnalystError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        AnalystError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for AnalystError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        AnalystError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for AnalystError {
    fn from(err: gix::object::commit::Error) -> Self {
        AnalystError::Commit(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for AnalystError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        AnalystError::RefFind(Box::new(err))
    }
}

impl From<gix::head::peel::to_commit::Error> for AnalystError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        AnalystError::HeadPeel(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for AnalystError {
    fn from(err: gix::objs::decode::Error) -> Self {
        AnalystError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for AnalystError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        AnalystError::DiffTreeToTree(Box::new(err))
    }
}
