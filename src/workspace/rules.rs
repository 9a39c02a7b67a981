//! File selection rules for workspace enumeration.
//!
//! Only source, config and documentation files are tracked. Everything else
//! (binaries, archives, build output, dependency folders) never reaches a
//! prompt and is never checkpointed.

/// Reserved directory holding checkpoint archives.
pub const CHECKPOINTS_DIR: &str = ".checkpoints";

/// Optional gitignore-syntax file at any level of the workspace.
pub const IGNORE_FILENAME: &str = ".codesmithignore";

/// Files larger than this are left out of prompt context.
pub const MAX_CONTEXT_FILE_SIZE: u64 = 1024 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    // General
    "md", "txt",
    // Config / data
    "json", "xml", "yml", "yaml", "ini", "toml", "config",
    // C#
    "cs", "csproj", "sln",
    // C / C++
    "c", "cpp", "h", "hpp", "cc",
    // Java
    "java", "gradle", "groovy", "properties", "pom",
    // JavaScript / TypeScript
    "js", "jsx", "ts", "tsx", "mjs", "cjs",
    // Web
    "html", "css", "scss", "less",
    // Python
    "py",
    // Go
    "go",
    // Rust
    "rs",
    // PHP
    "php",
];

/// Exact file names tracked regardless of extension.
pub const ALLOWED_FILENAMES: &[&str] = &[
    "requirements.txt",
    "pyproject.toml",
    "setup.py",
    "go.mod",
    "go.sum",
    "Cargo.toml",
    "Cargo.lock",
    "composer.json",
    "composer.lock",
    "Makefile",
    "Dockerfile",
    ".dockerignore",
];

pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    // Binaries
    "dll", "exe", "pdb", "so", "dylib", "o", "a",
    // Java
    "class", "jar", "war", "ear",
    // Python
    "pyc", "pyo",
    // Archives
    "zip", "tar", "gz", "7z", "rar",
    // Logs
    "log",
];

pub const EXCLUDED_DIRS: &[&str] = &[
    CHECKPOINTS_DIR,
    // VCS / editors
    ".git", ".svn", ".hg", ".idea", ".vs", ".vscode",
    // .NET
    "bin", "obj",
    // Java / Rust
    "target", "out",
    // JavaScript / web
    "node_modules", "dist", "build",
    // Python
    "__pycache__", ".pytest_cache", ".mypy_cache",
    // Go
    "pkg",
    // General cache
    ".cache",
];

fn contains_ignore_case(list: &[&str], value: &str) -> bool {
    list.iter().any(|item| item.eq_ignore_ascii_case(value))
}

/// Directory names that are pruned from the walk.
pub fn is_excluded_dir(name: &str) -> bool {
    contains_ignore_case(EXCLUDED_DIRS, name)
}

/// Whether a file (by name) is tracked.
pub fn is_tracked_file_name(file_name: &str) -> bool {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    if !extension.is_empty() && contains_ignore_case(EXCLUDED_EXTENSIONS, extension) {
        return false;
    }

    contains_ignore_case(ALLOWED_FILENAMES, file_name)
        || (!extension.is_empty() && contains_ignore_case(ALLOWED_EXTENSIONS, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_file_names() {
        assert!(is_tracked_file_name("main.rs"));
        assert!(is_tracked_file_name("README.md"));
        assert!(is_tracked_file_name("Makefile"));
        assert!(is_tracked_file_name("makefile"));
        assert!(is_tracked_file_name("Dockerfile"));
        assert!(is_tracked_file_name(".dockerignore"));
        assert!(is_tracked_file_name("App.CS"));

        assert!(!is_tracked_file_name("app.exe"));
        assert!(!is_tracked_file_name("server.log"));
        assert!(!is_tracked_file_name("bundle.tar.gz"));
        assert!(!is_tracked_file_name("image.png"));
        assert!(!is_tracked_file_name("LICENSE"));
    }

    #[test]
    fn test_excluded_dirs() {
        assert!(is_excluded_dir(".git"));
        assert!(is_excluded_dir("node_modules"));
        assert!(is_excluded_dir(CHECKPOINTS_DIR));
        assert!(!is_excluded_dir("src"));
    }
}
