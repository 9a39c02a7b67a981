//! File scanning for workspace enumeration.
//!
//! Uses `ignore::WalkBuilder` so a `.codesmithignore` file can narrow what is
//! tracked, while the built-in allow-list in `rules` decides which file types
//! count at all. VCS, dependency and build-output folders are pruned before
//! descending into them.

use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};
use tracing::{debug, warn};

use super::rules::{is_excluded_dir, is_tracked_file_name, IGNORE_FILENAME};

fn is_pruned(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
    is_dir
        && entry
            .file_name()
            .to_str()
            .map(is_excluded_dir)
            .unwrap_or(false)
}

/// Build a walker with the workspace rules configured.
///
/// Standard filters (hidden files, .gitignore) are off: tracking is decided
/// by the allow-list, not by what git happens to ignore.
fn build_walker(root_path: &Path) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root_path);

    builder.standard_filters(false);
    builder.follow_links(false);
    builder.add_custom_ignore_filename(IGNORE_FILENAME);
    builder.filter_entry(|entry| !is_pruned(entry));

    builder
}

/// Convert an absolute path below `root_path` into a `/`-separated relative path.
pub fn relative_path(root_path: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root_path)
        .ok()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
}

/// Scan a workspace directory and return every tracked file (absolute paths, sorted).
pub fn scan_workspace(root_path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    debug!("Scanning workspace: {}", root_path.display());

    for entry in build_walker(root_path).build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error walking directory: {}", e);
                continue;
            }
        };

        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        let tracked = entry
            .file_name()
            .to_str()
            .map(is_tracked_file_name)
            .unwrap_or(false);
        if tracked {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!("Found {} tracked files in workspace", files.len());

    files
}
