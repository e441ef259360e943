//! Log file lifecycle: directory creation, append-mode opens and handle swaps

use crate::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

#[cfg(unix)]
const DIR_MODE: u32 = 0o777;
#[cfg(unix)]
const FILE_MODE: u32 = 0o660;

/// The file receiving writes during one rotation epoch.
///
/// The inner mutex is the single write-serialization point for the file: a
/// whole line is written while it is held.
#[derive(Debug)]
pub struct ActiveFile {
    name: String,
    path: PathBuf,
    file: Mutex<File>,
}

impl ActiveFile {
    /// Timestamp-derived file name, without directory
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path the file was opened at
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size as seen by the filesystem, looked up by path so that an
    /// externally removed file is reported as an error
    pub fn size_on_disk(&self) -> Result<u64> {
        fs::metadata(&self.path)
            .map(|metadata| metadata.len())
            .map_err(|source| Error::Stat {
                path: self.path.clone(),
                source,
            })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(name: &str, path: PathBuf, file: File) -> Self {
        Self {
            name: name.to_string(),
            path,
            file: Mutex::new(file),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, File> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Best-effort flush of a retired handle. The descriptor itself closes
    /// when the last writer still holding this epoch lets go of it.
    fn retire(&self) {
        let _ = self.lock().flush();
    }
}

/// Result of a successful rotation
#[derive(Debug)]
pub struct Rotated {
    pub current: Arc<ActiveFile>,
    pub previous: Option<Arc<ActiveFile>>,
}

impl Rotated {
    /// Release the previous epoch's handle. Call only after every reader has
    /// been pointed at `current`.
    pub fn retire_previous(&mut self) {
        if let Some(previous) = self.previous.take() {
            previous.retire();

            tracing::debug!(
                rotalog.event = "log_file_retired",
                file_path = %previous.path().display(),
                "Previous log file released"
            );
        }
    }
}

/// Owns the current log file. Exactly one file is current once the first
/// rotation has succeeded.
#[derive(Debug, Default)]
pub struct LogFileManager {
    current: Option<Arc<ActiveFile>>,
}

impl LogFileManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Arc<ActiveFile>> {
        self.current.as_ref()
    }

    /// Open `name` under `dir` and install it as the current file.
    ///
    /// The previous file is handed back untouched in [`Rotated::previous`];
    /// nothing is closed here, so a failed open leaves the current file
    /// in place.
    pub fn rotate(&mut self, dir: &Path, name: &str) -> Result<Rotated> {
        ensure_dir(dir)?;

        let path = dir.join(name);
        let file = open_append(&path)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        let current = Arc::new(ActiveFile {
            name: name.to_string(),
            path,
            file: Mutex::new(file),
        });
        let previous = self.current.replace(Arc::clone(&current));

        tracing::debug!(
            rotalog.event = "log_file_opened",
            file_path = %current.path().display(),
            current_size = size,
            "Log file opened"
        );

        Ok(Rotated { current, previous })
    }

    /// All `.log` files in `dir`, oldest epoch first
    pub fn find_log_files(dir: &Path) -> Result<Vec<LogFileInfo>> {
        let mut log_files = Vec::new();

        if !dir.exists() {
            return Ok(log_files);
        }

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            let is_log = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == crate::naming::FILE_EXTENSION)
                .unwrap_or(false);

            if is_log && entry.file_type()?.is_file() {
                let metadata = entry.metadata()?;
                log_files.push(LogFileInfo {
                    path,
                    size: metadata.len(),
                    modified: metadata.modified()?,
                });
            }
        }

        // Names are timestamps, so name order is epoch order
        log_files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(log_files)
    }
}

/// Information about a log file on disk
#[derive(Debug, Clone)]
pub struct LogFileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl LogFileInfo {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }

    builder.create(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        rotalog.event = "log_dir_created",
        log_dir = %dir.display(),
        "Log directory created"
    );

    Ok(())
}

fn open_append(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true).read(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }

    options.open(path).map_err(|source| Error::OpenFile {
        path: path.to_path_buf(),
        source,
    })
}
