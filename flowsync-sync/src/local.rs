//! Local workflow directory: one pretty-printed JSON file per workflow.
//!
//! ## `write` protocol
//!
//! 1. Serialize the document (2-space indent, trailing newline).
//! 2. Compare with the bytes already on disk → skip if identical.
//! 3. Write to `<file>.flowsync.tmp`.
//! 4. Rename to the final path (atomic on POSIX).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use flowsync_core::{naming::normalize, Identity, WorkflowDocument};

use crate::error::{io_err, SyncError};

/// Files that live in the workflow directory but are not workflows.
pub const IGNORED_FILES: &[&str] = &[".gitkeep", "README.md"];

const TMP_SUFFIX: &str = "flowsync.tmp";

/// A workflow file found in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub identity: Identity,
    pub path: PathBuf,
}

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped: serialized content matches what is on disk.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }
}

/// Flat directory of `<identity>.json` files.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<identity>.json`: pure, no I/O.
    pub fn path_for(&self, identity: &Identity) -> PathBuf {
        self.dir.join(identity.file_name())
    }

    /// Create the workflow directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), SyncError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))
    }

    /// Every `*.json` workflow file, sorted by file name.
    ///
    /// A missing directory is an empty inventory. The identity of each entry
    /// is the normalized file stem, so a hand-named `My Flow.json` is
    /// addressed as `my-flow`.
    pub fn list(&self) -> Result<Vec<LocalEntry>, SyncError> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(io_err(&self.dir, e)),
        };

        let mut entries: Vec<LocalEntry> = read_dir
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| {
                let path = e.path();
                let file_name = path.file_name()?.to_string_lossy().into_owned();
                if IGNORED_FILES.contains(&file_name.as_str()) {
                    return None;
                }
                if path.extension().and_then(|x| x.to_str()) != Some("json") {
                    return None;
                }
                let stem = path.file_stem()?.to_string_lossy().into_owned();
                Some(LocalEntry {
                    identity: normalize(&stem),
                    path,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Read `<dir>/<identity>.json`.
    pub fn read(&self, identity: &Identity) -> Result<WorkflowDocument, SyncError> {
        read_document(&self.path_for(identity))
    }

    /// Read the file behind a listed entry.
    pub fn read_entry(&self, entry: &LocalEntry) -> Result<WorkflowDocument, SyncError> {
        read_document(&entry.path)
    }

    /// Serialize `doc` to `<dir>/<identity>.json`, skipping identical content.
    pub fn write(
        &self,
        identity: &Identity,
        doc: &WorkflowDocument,
        dry_run: bool,
    ) -> Result<WriteResult, SyncError> {
        let path = self.path_for(identity);
        let content = render(doc)?;
        atomic_write(&path, &content, dry_run)
    }
}

/// Pretty JSON with a trailing newline, as stored on disk.
pub fn render(doc: &WorkflowDocument) -> Result<String, SyncError> {
    let mut out = serde_json::to_string_pretty(doc)?;
    out.push('\n');
    Ok(out)
}

fn read_document(path: &Path) -> Result<WorkflowDocument, SyncError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|source| SyncError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn tmp_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.{TMP_SUFFIX}", path.display()))
}

pub(crate) fn atomic_write(
    path: &Path,
    content: &str,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    atomic_write_with_tmp(path, content, dry_run, &tmp_path_for(path))
}

fn atomic_write_with_tmp(
    path: &Path,
    content: &str,
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(existing) if existing == content => {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(path, e)),
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
