//! Atomic file persistence with timestamped backups.
//!
//! Every configuration write follows the same pattern: copy the existing
//! file to `<basename>.<UTC stamp>.bak`, write the new content to a sibling
//! temporary file, and rename it over the destination. When the rename
//! fails the backup is copied back before the error is surfaced.

use std::{fs, io::Write, path::Path};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Backup file name for `file_name` at `now`:
/// `<file_name>.<YYYYMMDDTHHMMSSZ>.bak`.
pub(crate) fn backup_name(file_name: &str, now: DateTime<Utc>) -> String {
    format!("{file_name}.{}.bak", now.format("%Y%m%dT%H%M%SZ"))
}

/// Writes `value` to `path` as pretty-printed JSON, atomically and with a
/// backup of any existing file.
pub(crate) fn write_json_atomic(path: &Path, value: &Value) -> Result<(), ConfigError> {
    let persist_error = |source: std::io::Error| ConfigError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory).map_err(persist_error)?;

    let backup = if path.exists() {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let backup = directory.join(backup_name(&file_name, Utc::now()));
        fs::copy(path, &backup).map_err(persist_error)?;
        debug!(backup = %backup.display(), "backup written");
        Some(backup)
    } else {
        None
    };

    let result = (|| -> Result<(), std::io::Error> {
        let mut file = NamedTempFile::new_in(directory)?;
        serde_json::to_writer_pretty(&mut file, value).map_err(std::io::Error::other)?;
        file.write_all(b"\n")?;
        file.persist(path).map_err(|error| error.error)?;
        Ok(())
    })();

    if let Err(source) = result {
        if let Some(backup) = &backup
            && let Err(restore_error) = fs::copy(backup, path)
        {
            warn!(
                path = %path.display(),
                error = %restore_error,
                "failed to restore backup after write failure"
            );
        }
        return Err(persist_error(source));
    }
    Ok(())
}
