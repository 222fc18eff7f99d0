//! WAL file handle
//!
//! Appends framed entries to a single log file and applies the fsync policy
//! of the configured [`DurabilityMode`].

use crate::encoding::encode_entry;
use crate::error::WalError;
use crate::mode::DurabilityMode;
use crate::recovery::{recover, RecoveryResult};
use crate::wal::WalEntry;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Append-only WAL file
pub struct WalFile {
    file: File,
    path: PathBuf,
    mode: DurabilityMode,
    /// Length of the valid log, used to cut off a failed append
    len: u64,
    /// Appends since the last fsync
    pending: usize,
    last_sync: Instant,
    #[cfg(test)]
    fail_next_sync: bool,
}

impl WalFile {
    /// Open (or create) the WAL at `path` and replay it.
    ///
    /// A torn tail found during replay is truncated from the file before
    /// the handle is returned, so new entries follow the last valid frame.
    pub fn open(path: &Path, mode: DurabilityMode) -> Result<(Self, RecoveryResult), WalError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let recovered = recover(path)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        if recovered.has_issues() {
            warn!(
                path = %path.display(),
                bytes = recovered.truncated_bytes,
                "Truncating torn WAL tail"
            );
            file.set_len(recovered.valid_len)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::Start(recovered.valid_len))?;

        let wal = WalFile {
            file,
            path: path.to_path_buf(),
            mode,
            len: recovered.valid_len,
            pending: 0,
            last_sync: Instant::now(),
            #[cfg(test)]
            fail_next_sync: false,
        };
        Ok((wal, recovered))
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the valid log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Check if the log holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append an entry, fsyncing according to the durability mode.
    ///
    /// On failure, whether writing or syncing, the file is cut back to its
    /// previous length: a partial frame never precedes later entries and a
    /// rejected entry never resurfaces on replay.
    pub fn append(&mut self, entry: &WalEntry) -> Result<(), WalError> {
        let frame = encode_entry(entry)?;

        if let Err(e) = self.file.write_all(&frame) {
            self.discard_partial_write();
            return Err(e.into());
        }

        let pending = self.pending + 1;
        let sync_now = match self.mode {
            DurabilityMode::None => false,
            DurabilityMode::Strict => true,
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                pending >= batch_size
                    || self.last_sync.elapsed() >= Duration::from_millis(interval_ms)
            }
        };

        if sync_now {
            if let Err(e) = self.sync() {
                warn!(error = %e, "WAL sync failed, discarding appended entry");
                self.discard_partial_write();
                return Err(e.into());
            }
            self.pending = 0;
            self.last_sync = Instant::now();
        } else {
            self.pending = pending;
        }
        self.len += frame.len() as u64;
        Ok(())
    }

    /// Force an fsync of everything appended so far
    pub fn flush(&mut self) -> Result<(), WalError> {
        self.sync()?;
        self.pending = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    fn sync(&mut self) -> std::io::Result<()> {
        #[cfg(test)]
        {
            if std::mem::take(&mut self.fail_next_sync) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "injected sync failure",
                ));
            }
        }
        self.file.sync_data()
    }

    fn discard_partial_write(&mut self) {
        let restored = self
            .file
            .set_len(self.len)
            .and_then(|_| self.file.seek(SeekFrom::Start(self.len)).map(|_| ()));
        if let Err(e) = restored {
            warn!(error = %e, "Failed to discard partial WAL write");
        }
    }
}

impl Drop for WalFile {
    fn drop(&mut self) {
        if self.pending > 0 {
            if let Err(e) = self.file.sync_data() {
                warn!(error = %e, "Final WAL sync failed");
            } else {
                debug!(pending = self.pending, "Synced WAL on close");
            }
        }
    }
}

impl std::fmt::Debug for WalFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalFile")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("len", &self.len)
            .field("pending", &self.pending)
            .finish()
    }
}
