use crate::error::{CorelogError, Result};
use crate::logs::entry::LogEntry;
use crate::logs::format::format_entry;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tokio::fs::File as TokioFile;
use tokio::io::AsyncWriteExt;

/// Default maximum log file size before rotation (10MB)
pub const DEFAULT_MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of numbered backups kept
pub const DEFAULT_MAX_BACKUPS: usize = 5;

/// Default number of frames written per error
pub const DEFAULT_STACK_TRACE_DEPTH: usize = 10;

/// Rotation and formatting settings for a `LogFileWriter`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_file_size_bytes: u64,
    pub max_backup_files: usize,
    pub stack_trace_depth: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_LOG_SIZE,
            max_backup_files: DEFAULT_MAX_BACKUPS,
            stack_trace_depth: DEFAULT_STACK_TRACE_DEPTH,
        }
    }
}

/// LogFileWriter owns the log file handle and its numbered backups
///
/// Only the writer thread ever holds one, so no file-level locking is needed.
pub struct LogFileWriter {
    /// Path to the base log file
    path: PathBuf,
    /// Async file handle for the base file
    file: TokioFile,
    policy: RotationPolicy,
    /// Current size of the base file
    size: u64,
}

impl LogFileWriter {
    /// Open (or create) the base log file in append mode
    ///
    /// # Arguments
    /// * `path` - Path of the base log file; parent directories are created
    /// * `policy` - Rotation thresholds and stack trace depth
    ///
    /// # Returns
    /// * `Ok(LogFileWriter)` - File opened, size taken from its metadata
    /// * `Err(CorelogError)` - Directory or file could not be created
    pub async fn open(path: &Path, policy: RotationPolicy) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CorelogError::from_file_io("Failed to create log directory", e))?;
        }

        let file = Self::open_append(path)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            path: path.to_path_buf(),
            file: TokioFile::from_std(file),
            policy,
            size,
        })
    }

    fn open_append(path: &Path) -> Result<std::fs::File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| CorelogError::from_file_io("Failed to open log file", e))
    }

    /// Write one entry, rotating first if the file already reached the limit
    pub async fn write_entry(&mut self, entry: &LogEntry) -> Result<()> {
        if self.size >= self.policy.max_file_size_bytes {
            self.rotate().await?;
        }

        let line = format_entry(entry, self.policy.stack_trace_depth);

        self.file
            .write_all(line.as_bytes())
            .await
            .map_err(|e| CorelogError::from_file_io("Failed to write to log", e))?;

        self.file
            .flush()
            .await
            .map_err(|e| CorelogError::from_file_io("Failed to flush log", e))?;

        self.size += line.len() as u64;

        Ok(())
    }

    /// Shift backups up by one and start a fresh base file.
    ///
    /// `.N` is deleted, `.i` becomes `.(i+1)` from the top down, and the base
    /// becomes `.1`. With no backups configured the base is truncated.
    pub async fn rotate(&mut self) -> Result<()> {
        let max = self.policy.max_backup_files;

        if max == 0 {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)
                .map_err(|e| rotation_error("Failed to truncate log file", e))?;
            drop(file);
        } else {
            let oldest = backup_path(&self.path, max);
            if tokio::fs::try_exists(&oldest).await.unwrap_or(false) {
                tokio::fs::remove_file(&oldest)
                    .await
                    .map_err(|e| rotation_error("Failed to delete oldest backup", e))?;
            }

            for i in (1..max).rev() {
                let from = backup_path(&self.path, i);
                if tokio::fs::try_exists(&from).await.unwrap_or(false) {
                    tokio::fs::rename(&from, backup_path(&self.path, i + 1))
                        .await
                        .map_err(|e| rotation_error("Failed to shift backup", e))?;
                }
            }

            if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
                tokio::fs::rename(&self.path, backup_path(&self.path, 1))
                    .await
                    .map_err(|e| rotation_error("Failed to rotate log", e))?;
            }
        }

        self.file = self.reopen_file().await?;
        self.size = 0;

        Ok(())
    }

    /// Reopen the base file after rotation
    async fn reopen_file(&self) -> Result<TokioFile> {
        let file = Self::open_append(&self.path)?;
        Ok(TokioFile::from_std(file))
    }

    /// Get the path to the base log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the tracked size of the base log file
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.file
            .flush()
            .await
            .map_err(|e| CorelogError::from_file_io("Failed to flush log", e))
    }
}

fn rotation_error(context: &str, err: std::io::Error) -> CorelogError {
    match CorelogError::from_file_io(context, err) {
        CorelogError::LogWriteError(msg) => CorelogError::LogRotationError(msg),
        other => other,
    }
}

/// Path of the `index`-th backup: `<base>.<index>`
pub fn backup_path(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}
