//! File-backed job record store.
//!
//! Layout: `<jobs_base>/<ticket>/job.json` holds the serialized
//! [`JobRecord`], `<jobs_base>/<ticket>/job.fasta` the raw query payload that
//! the pipeline reads. Paths are only ever built from a validated [`Ticket`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{JobRecord, Ticket};

const RECORD_FILE: &str = "job.json";
const QUERY_FILE: &str = "job.fasta";

/// Errors from the job record store.
#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("Job record not found for ticket {0}")]
    NotFound(String),

    #[error("Job record already exists for ticket {0}")]
    AlreadyExists(String),

    #[error("Job record for ticket {ticket} is corrupt: {reason}")]
    Corrupt { ticket: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Durable, write-once store of job records keyed by ticket.
#[derive(Debug, Clone)]
pub struct JobStore {
    base: PathBuf,
}

impl JobStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory holding all files of one job (pipeline output lands here too).
    pub fn job_dir(&self, ticket: &Ticket) -> PathBuf {
        self.base.join(ticket.as_str())
    }

    /// Persist `record` for `ticket`.
    ///
    /// Both files are written to a temporary name, fsynced and renamed into
    /// place, so once this returns the record survives a crash. Fails with
    /// [`JobStoreError::AlreadyExists`] if the ticket already has a record.
    pub fn write(&self, ticket: &Ticket, record: &JobRecord) -> Result<(), JobStoreError> {
        let dir = self.job_dir(ticket);
        match fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if dir.join(RECORD_FILE).exists() {
                    return Err(JobStoreError::AlreadyExists(ticket.to_string()));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&dir)?;
            }
            Err(e) => return Err(e.into()),
        }

        let json = serde_json::to_vec_pretty(record).map_err(|e| JobStoreError::Corrupt {
            ticket: ticket.to_string(),
            reason: e.to_string(),
        })?;

        // The query file first: a visible job.json implies a complete job dir.
        write_atomic(&dir, QUERY_FILE, record.query.as_bytes())?;
        write_atomic(&dir, RECORD_FILE, &json)?;
        sync_dir(&dir);
        sync_dir(&self.base);
        Ok(())
    }

    /// Load the record for `ticket`.
    pub fn read(&self, ticket: &Ticket) -> Result<JobRecord, JobStoreError> {
        let path = self.job_dir(ticket).join(RECORD_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(JobStoreError::NotFound(ticket.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let record: JobRecord =
            serde_json::from_slice(&bytes).map_err(|e| JobStoreError::Corrupt {
                ticket: ticket.to_string(),
                reason: e.to_string(),
            })?;

        if record.database.is_empty() {
            return Err(JobStoreError::Corrupt {
                ticket: ticket.to_string(),
                reason: "no databases selected".to_string(),
            });
        }

        Ok(record)
    }

    pub fn exists(&self, ticket: &Ticket) -> bool {
        self.job_dir(ticket).join(RECORD_FILE).is_file()
    }
}

fn write_atomic(dir: &Path, name: &str, contents: &[u8]) -> io::Result<()> {
    let tmp = dir.join(format!(".{}.tmp", name));
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, dir.join(name))
}

/// Best-effort fsync of a directory's entry table so renames are durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = fs::File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
