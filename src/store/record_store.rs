//! Record Store
//!
//! The single owner of the store file.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::line::{format_line, parse_line};
use crate::config::SyncPolicy;
use crate::error::{Result, RolodexError};
use crate::protocol::Record;

/// Append-only record store backed by one flat file
///
/// ## Concurrency Model
///
/// One `Mutex<File>` guards both appends and scans. A PUT writes its whole
/// line with one `write_all` while holding the lock, and a GET scans the
/// file while holding the same lock, so no GET observes a partial line and
/// no two PUTs interleave their bytes.
pub struct RecordStore {
    /// Location of the store file
    path: PathBuf,

    /// The only handle onto the store file (opened in append mode)
    file: Mutex<File>,

    /// Flush-only or flush + fsync on every PUT
    sync_policy: SyncPolicy,
}

impl RecordStore {
    /// Create the store file, truncating whatever was there
    pub fn create(path: impl AsRef<Path>, sync_policy: SyncPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Truncate first, then reopen in append mode so every write lands at
        // the end no matter where the last scan left the cursor.
        File::create(&path)?;
        let file = OpenOptions::new().read(true).append(true).open(&path)?;

        tracing::debug!("Created store file {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
            sync_policy,
        })
    }

    /// Append a record
    ///
    /// Duplicate ids are accepted; each PUT adds a new line.
    pub fn put(&self, record: &Record) -> Result<()> {
        let line = format_line(record);

        let mut file = self.file.lock();
        append_line(&mut *file, &line, self.sync_policy == SyncPolicy::EveryWrite)?;

        tracing::trace!("Appended record id={} ({} bytes)", record.id(), line.len());
        Ok(())
    }

    /// Find the first record with the given id, in file order
    ///
    /// Returns `RecordNotFound` when no line matches.
    pub fn get(&self, id: u32) -> Result<Record> {
        let mut found = None;
        self.scan(|record| {
            if record.id() == id {
                found = Some(record);
                false
            } else {
                true
            }
        })?;
        found.ok_or(RolodexError::RecordNotFound(id))
    }

    /// All well-formed records, in file order
    pub fn records(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        self.scan(|record| {
            records.push(record);
            true
        })?;
        Ok(records)
    }

    /// Walk the file from the start under the lock, feeding each parsed
    /// record to `visit` until it returns false. Malformed lines are
    /// logged and skipped.
    fn scan<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(Record) -> bool,
    {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(0))?;

        let mut reader = BufReader::new(&*file);
        let mut line = Vec::new();
        let mut line_no = 0usize;

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            line_no += 1;

            match parse_line(&line) {
                Ok(record) => {
                    if !visit(record) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping malformed line {} in {}: {}",
                        line_no,
                        self.path.display(),
                        e
                    );
                }
            }
        }

        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the store file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the sync policy
    pub fn sync_policy(&self) -> SyncPolicy {
        self.sync_policy
    }
}

/// File operations an append needs, so a failed write can be rolled back
trait AppendTarget: Write {
    fn current_len(&self) -> io::Result<u64>;
    fn truncate_to(&self, len: u64) -> io::Result<()>;
    fn sync(&self) -> io::Result<()>;
}

impl AppendTarget for File {
    fn current_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Append one whole line or nothing
///
/// On a failed write, flush or sync the file is cut back to its previous
/// length, so a fragment never prefixes the next line.
fn append_line<T: AppendTarget>(target: &mut T, line: &[u8], sync: bool) -> io::Result<()> {
    let start = target.current_len()?;

    let result = target
        .write_all(line)
        .and_then(|_| target.flush())
        .and_then(|_| if sync { target.sync() } else { Ok(()) });

    if let Err(e) = result {
        if let Err(trunc_err) = target.truncate_to(start) {
            tracing::error!(
                "Failed to roll back partial append to {} bytes: {}",
                start,
                trunc_err
            );
        }
        return Err(e);
    }

    Ok(())
}
