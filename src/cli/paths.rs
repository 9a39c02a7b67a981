use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Find the git root directory by searching upward from `start`.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut path = start;

    loop {
        if path.join(".git").exists() {
            return Some(path.to_path_buf());
        }
        path = path.parent()?;
    }
}

/// Resolve the workspace root: explicit path, else the enclosing git root, else cwd.
///
/// An explicit path is created when missing so a fresh project can start empty.
pub fn resolve_workspace_root(workspace: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = workspace {
        let path = PathBuf::from(path.trim());
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create workspace root: {}", path.display()))?;
        return path
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize workspace root: {}", path.display()));
    }

    let current = std::env::current_dir().context("Failed to get current directory")?;
    Ok(find_git_root(&current).unwrap_or(current))
}
