//! Snapshot/restore of the workspace as single-file archives.
//!
//! A checkpoint is `<epoch-seconds>.ckpt.gz` inside the reserved
//! `.checkpoints` directory: a gzip-compressed JSON manifest holding every
//! tracked file (base64 content plus SHA256 digest). Tracked files are first
//! copied into a staging directory so the archive reflects one consistent
//! copy of the tree, then the staging directory is discarded.
//!
//! Restore is destructive and single-use: the workspace is wiped, the
//! archive extracted, and the archive deleted. Archives are decoded and
//! verified before anything in the workspace is touched.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use super::error::CheckpointError;
use super::rules::CHECKPOINTS_DIR;
use super::scanner::relative_path;
use super::store::FileStore;

/// File suffix of checkpoint archives.
pub const CHECKPOINT_SUFFIX: &str = ".ckpt.gz";

const STAGING_PREFIX: &str = "codesmith-checkpoint-";

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointArchive {
    created_at: i64,
    files: Vec<ArchivedFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArchivedFile {
    path: String,
    sha256: String,
    /// Base64 of the raw file bytes.
    content: String,
}

/// An archive present in the checkpoint store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointInfo {
    /// Artifact file name, e.g. `1718000000.ckpt.gz`.
    pub name: String,
    pub path: PathBuf,
    /// Seconds since epoch encoded in the name.
    pub created_at: i64,
    created: SystemTime,
}

/// Outcome of a restore attempt. `Display` gives the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored { checkpoint: String, files: usize },
    NoCheckpoints,
    Failed(String),
}

impl RestoreOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, RestoreOutcome::Restored { .. })
    }
}

impl std::fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreOutcome::Restored { checkpoint, files } => write!(
                f,
                "Workspace restored from checkpoint {} ({} files); checkpoint deleted.",
                checkpoint, files
            ),
            RestoreOutcome::NoCheckpoints => write!(f, "No checkpoints found to restore."),
            RestoreOutcome::Failed(msg) => write!(f, "Failed to restore checkpoint: {}", msg),
        }
    }
}

fn compute_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Versioned snapshot store living under `<workspace>/.checkpoints`.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    files: FileStore,
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(files: FileStore) -> Self {
        let dir = files.root().join(CHECKPOINTS_DIR);
        Self { files, dir }
    }

    pub fn checkpoints_dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot every tracked file.
    ///
    /// Returns `Ok(None)` when the workspace has nothing to protect. An
    /// artifact with the same (second-resolution) name is replaced.
    pub fn create_checkpoint(&self) -> Result<Option<CheckpointInfo>, CheckpointError> {
        let tracked = self.files.enumerate_files();
        if tracked.is_empty() {
            info!("Workspace has no tracked files; no checkpoint needed");
            return Ok(None);
        }

        fs::create_dir_all(&self.dir).map_err(CheckpointError::io(&self.dir))?;

        let created_at = Utc::now().timestamp();
        let name = format!("{}{}", created_at, CHECKPOINT_SUFFIX);
        let archive_path = self.dir.join(&name);

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir()
            .map_err(CheckpointError::io(&self.dir))?;

        for rel in &tracked {
            let source = self.files.root().join(rel);
            let dest = staging.path().join(rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(CheckpointError::io(parent))?;
            }
            fs::copy(&source, &dest).map_err(CheckpointError::io(&source))?;
        }

        let archive = archive_directory(staging.path(), created_at)?;
        let file_count = archive.files.len();

        if archive_path.exists() {
            debug!("Replacing existing checkpoint {}", name);
            fs::remove_file(&archive_path).map_err(CheckpointError::io(&archive_path))?;
        }
        write_archive(&archive_path, &archive)?;

        let staging_path = staging.path().to_path_buf();
        staging
            .close()
            .map_err(CheckpointError::io(&staging_path))?;

        info!(
            "💾 Checkpoint created: {}/{} ({} files)",
            CHECKPOINTS_DIR, name, file_count
        );

        let created = fs::metadata(&archive_path)
            .and_then(|m| m.created().or_else(|_| m.modified()))
            .unwrap_or_else(|_| SystemTime::now());

        Ok(Some(CheckpointInfo {
            name,
            path: archive_path,
            created_at,
            created,
        }))
    }

    /// Existing checkpoints, newest first (by file creation time).
    pub fn list(&self) -> Result<Vec<CheckpointInfo>, CheckpointError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut checkpoints = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(CheckpointError::io(&self.dir))? {
            let entry = entry.map_err(CheckpointError::io(&self.dir))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = name.strip_suffix(CHECKPOINT_SUFFIX) else {
                continue;
            };

            let path = entry.path();
            let metadata = entry.metadata().map_err(CheckpointError::io(&path))?;
            if !metadata.is_file() {
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            checkpoints.push(CheckpointInfo {
                created_at: stem.parse().unwrap_or(0),
                name,
                path,
                created,
            });
        }

        checkpoints.sort_by(|a, b| {
            b.created
                .cmp(&a.created)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(checkpoints)
    }

    pub fn latest(&self) -> Result<Option<CheckpointInfo>, CheckpointError> {
        Ok(self.list()?.into_iter().next())
    }

    /// Restore the most recent checkpoint, never failing loudly.
    pub fn restore_latest(&self) -> RestoreOutcome {
        match self.try_restore_latest() {
            Ok(Some((checkpoint, files))) => {
                info!("Workspace restored from {} and checkpoint deleted", checkpoint);
                RestoreOutcome::Restored { checkpoint, files }
            }
            Ok(None) => {
                warn!("No checkpoints found to restore");
                RestoreOutcome::NoCheckpoints
            }
            Err(e) => {
                error!("Failed to restore checkpoint: {}", e);
                RestoreOutcome::Failed(e.to_string())
            }
        }
    }

    fn try_restore_latest(&self) -> Result<Option<(String, usize)>, CheckpointError> {
        let latest = match self.latest()? {
            Some(c) => c,
            None => return Ok(None),
        };

        info!("⏪ Restoring checkpoint: {}/{}", CHECKPOINTS_DIR, latest.name);

        let archive = read_archive(&latest.path)?;
        let mut targets = Vec::with_capacity(archive.files.len());
        for entry in &archive.files {
            let bytes = decode_entry(entry)?;
            let target = self.files.resolve(&entry.path)?;
            targets.push((target, bytes));
        }

        // Full reset: files created after the checkpoint go too.
        for rel in self.files.enumerate_files() {
            let full = self.files.root().join(&rel);
            fs::remove_file(&full).map_err(CheckpointError::io(&full))?;
            debug!("Removed {}", rel);
        }

        for (target, bytes) in &targets {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(CheckpointError::io(parent))?;
            }
            fs::write(target, bytes).map_err(CheckpointError::io(target))?;
        }

        fs::remove_file(&latest.path).map_err(CheckpointError::io(&latest.path))?;

        Ok(Some((latest.name, targets.len())))
    }
}

/// Build a manifest from every file below the staging directory.
fn archive_directory(staging: &Path, created_at: i64) -> Result<CheckpointArchive, CheckpointError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(staging).sort_by_file_name() {
        let entry = entry.map_err(|e| CheckpointError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| staging.to_path_buf()),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(path) = relative_path(staging, entry.path()) else {
            continue;
        };
        let bytes = fs::read(entry.path()).map_err(CheckpointError::io(entry.path()))?;

        files.push(ArchivedFile {
            path,
            sha256: compute_digest(&bytes),
            content: STANDARD.encode(&bytes),
        });
    }

    Ok(CheckpointArchive { created_at, files })
}

fn write_archive(path: &Path, archive: &CheckpointArchive) -> Result<(), CheckpointError> {
    let file = File::create(path).map_err(CheckpointError::io(path))?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, archive).map_err(|source| CheckpointError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    encoder.finish().map_err(CheckpointError::io(path))?;
    Ok(())
}

fn read_archive(path: &Path) -> Result<CheckpointArchive, CheckpointError> {
    let file = File::open(path).map_err(CheckpointError::io(path))?;
    let decoder = GzDecoder::new(BufReader::new(file));
    serde_json::from_reader(decoder).map_err(|source| CheckpointError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_entry(entry: &ArchivedFile) -> Result<Vec<u8>, CheckpointError> {
    let bytes = STANDARD
        .decode(entry.content.as_bytes())
        .map_err(|e| CheckpointError::CorruptEntry {
            entry: entry.path.clone(),
            reason: e.to_string(),
        })?;

    if compute_digest(&bytes) != entry.sha256 {
        return Err(CheckpointError::CorruptEntry {
            entry: entry.path.clone(),
            reason: "digest mismatch".to_string(),
        });
    }

    Ok(bytes)
}
