//! Sandboxed file access confined to a workspace root.
//!
//! Every path handed to the store is untrusted (most of them come straight
//! out of model output). `resolve` normalises it, resolves symlinks for the
//! part that exists on disk, and rejects anything that does not land below
//! the canonical workspace root.

use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::WorkspaceError;
use super::rules::MAX_CONTEXT_FILE_SIZE;
use super::scanner::{relative_path, scan_workspace};

/// Sandboxed read/write/delete/enumerate over one root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a workspace rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(WorkspaceError::io(root))?;
        let root = root.canonicalize().map_err(WorkspaceError::io(root))?;
        debug!("Workspace root: {}", root.display());
        Ok(Self { root })
    }

    /// Canonical workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a workspace-relative (or absolute) path inside the sandbox.
    pub fn resolve(&self, input: &str) -> Result<PathBuf, WorkspaceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(WorkspaceError::EmptyPath);
        }

        let normalized = trimmed.replace('\\', "/");
        let candidate = Path::new(&normalized);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        let resolved = canonicalize_lenient(&joined);
        if resolved == self.root || !resolved.starts_with(&self.root) {
            warn!("Rejected path outside workspace: {}", input);
            return Err(WorkspaceError::OutsideWorkspace {
                path: input.to_string(),
            });
        }

        Ok(resolved)
    }

    pub fn file_exists(&self, path: &str) -> Result<bool, WorkspaceError> {
        Ok(self.resolve(path)?.is_file())
    }

    /// Read a file as text. A missing file reads as an empty string.
    pub fn read_file(&self, path: &str) -> Result<String, WorkspaceError> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Ok(String::new());
        }
        let bytes = fs::read(&full).map_err(WorkspaceError::io(&full))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn save_file(&self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(WorkspaceError::io(parent))?;
        }
        fs::write(&full, content).map_err(WorkspaceError::io(&full))?;
        info!("Saved file {}", self.display_path(&full));
        Ok(())
    }

    /// Delete a file if present. Deleting a missing file is not an error.
    pub fn delete_file(&self, path: &str) -> Result<(), WorkspaceError> {
        let full = self.resolve(path)?;
        if full.is_file() {
            fs::remove_file(&full).map_err(WorkspaceError::io(&full))?;
            info!("Deleted file {}", self.display_path(&full));
        } else {
            debug!("Nothing to delete at {}", self.display_path(&full));
        }
        Ok(())
    }

    /// Every tracked file, as sorted `/`-separated workspace-relative paths.
    pub fn enumerate_files(&self) -> Vec<String> {
        scan_workspace(&self.root)
            .iter()
            .filter_map(|p| relative_path(&self.root, p))
            .collect()
    }

    pub fn has_files(&self) -> bool {
        !self.enumerate_files().is_empty()
    }

    /// Concatenate `# FILE: <path>` headers and file contents.
    ///
    /// `None` means every tracked file. Paths that are missing, too large or
    /// outside the sandbox are skipped with a log line.
    pub fn file_context(&self, files: Option<&[String]>) -> String {
        let all;
        let files = match files {
            Some(list) => list,
            None => {
                all = self.enumerate_files();
                &all
            }
        };

        let mut context = String::new();
        for path in files {
            let full = match self.resolve(path) {
                Ok(p) => p,
                Err(e) => {
                    warn!("Skipping {} in context: {}", path, e);
                    continue;
                }
            };

            let metadata = match fs::metadata(&full) {
                Ok(m) if m.is_file() => m,
                _ => {
                    debug!("Skipping {} in context: file does not exist yet", path);
                    continue;
                }
            };

            if metadata.len() > MAX_CONTEXT_FILE_SIZE {
                debug!(
                    "Skipping large file in context ({} bytes): {}",
                    metadata.len(),
                    path
                );
                continue;
            }

            match fs::read(&full) {
                Ok(bytes) => {
                    let _ = writeln!(context, "# FILE: {}", path);
                    let _ = writeln!(context, "{}", String::from_utf8_lossy(&bytes));
                }
                Err(e) => warn!("Failed to read {} for context: {}", path, e),
            }
        }

        context
    }

    fn display_path(&self, full: &Path) -> String {
        relative_path(&self.root, full).unwrap_or_else(|| full.display().to_string())
    }
}

/// Remove `.` and `..` components without touching the file system.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the longest existing ancestor and re-append the rest.
///
/// Files that do not exist yet (everything the planner wants to create)
/// still resolve, while symlinked directories are followed to their target.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    let normalized = normalize_lexically(path);
    let mut existing = normalized.as_path();
    let mut remainder: Vec<OsString> = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut result = canonical;
            for part in remainder.iter().rev() {
                result.push(part);
            }
            return result;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                remainder.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}
