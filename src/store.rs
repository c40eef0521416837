//! The jobs file: a pretty-printed JSON array of [`JobRecord`]s.
//!
//! Writes go to a temp file in the same directory and are renamed over the
//! destination, so readers only ever see a complete old or a complete new file.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use tracing::warn;

use crate::error::StoreError;
use crate::job::JobRecord;

/// Reads the jobs file. A missing, empty or invalid file reads as no jobs.
pub fn load(path: &Path) -> Vec<JobRecord> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read jobs file");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<JobRecord>>(&raw) {
        Ok(jobs) => jobs,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable jobs file");
            Vec::new()
        }
    }
}

pub fn save_atomic(path: &Path, jobs: &[JobRecord]) -> Result<(), StoreError> {
    write_atomic(path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, jobs)?;
        Ok(())
    })
}

/// Runs `write` against a temp file next to `path`, then renames it into place.
/// On error the temp file is removed and `path` is not touched.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), StoreError>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|source| io_error(dir, source))?;

    let tmp = tempfile::Builder::new()
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|source| io_error(dir, source))?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        write(&mut writer)?;
        writer.flush().map_err(|source| io_error(tmp.path(), source))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|source| io_error(tmp.path(), source))?;

    tmp.persist(path)
        .map_err(|e| io_error(path, e.error))?;
    Ok(())
}

/// Modification time of the jobs file in local time, if it exists.
pub fn last_modified(path: &Path) -> Option<DateTime<Local>> {
    let modified: SystemTime = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Local>::from(modified))
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
