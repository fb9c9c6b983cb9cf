pub mod repo;
pub mod walk;

pub use repo::GitRepo;
pub use walk::{CommitWalk, WalkOptions};

use std::path::Path;

/// True when `path` holds repository metadata directly (a `.git` directory
/// or gitfile).
pub fn is_repository(path: &Path) -> bool {
    path.join(".git").exists()
}
