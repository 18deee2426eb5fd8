// Archive codec - one comma-delimited line per route, no header

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{RouteRecord, RouteSnapshot};
use crate::error::{AppError, AppResult};

pub const FIELD_DELIMITER: char = ',';
pub const ARCHIVE_EXTENSION: &str = "rback";
pub const DEFAULT_ARCHIVE_NAME: &str = "archive.rback";

/// Append the archive extension unless the path already carries it.
///
/// A path naming a directory (trailing separator, `..`, root) gets the
/// default archive name joined instead.
pub fn normalize_archive_path(path: &Path) -> PathBuf {
    let names_directory = path
        .to_string_lossy()
        .chars()
        .next_back()
        .is_some_and(std::path::is_separator);
    let file_name = match path.file_name() {
        Some(name) if !names_directory => name,
        _ => return path.join(DEFAULT_ARCHIVE_NAME),
    };

    let dot_file = format!(".{}", ARCHIVE_EXTENSION);
    if path.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION) || file_name == dot_file.as_str() {
        return path.to_path_buf();
    }

    let mut normalized = path.as_os_str().to_os_string();
    normalized.push(".");
    normalized.push(ARCHIVE_EXTENSION);
    PathBuf::from(normalized)
}

/// Write `snapshot` to `path`, truncating any existing file.
///
/// The file is written in place. An error partway through leaves a partial
/// archive behind and is returned as `AppError::Io`.
pub fn write_archive(snapshot: &RouteSnapshot, path: &Path) -> AppResult<()> {
    let context = || format!("archive '{}'", path.display());

    let file = File::create(path).map_err(|e| AppError::io(context(), e))?;
    let mut writer = BufWriter::new(file);
    encode_snapshot(snapshot, &mut writer).map_err(|e| AppError::io(context(), e))?;
    writer.flush().map_err(|e| AppError::io(context(), e))?;

    tracing::debug!("Wrote {} routes to {}", snapshot.len(), path.display());
    Ok(())
}

pub fn encode_snapshot<W: Write>(snapshot: &RouteSnapshot, writer: &mut W) -> std::io::Result<()> {
    for record in snapshot {
        writeln!(writer, "{}", record)?;
    }
    Ok(())
}

/// Read an archive back into a snapshot.
///
/// The file is opened read-only; nothing is applied to the live routing
/// table.
pub fn read_archive(path: &Path) -> AppResult<RouteSnapshot> {
    let not_found = |source| AppError::ArchiveNotFound {
        path: path.to_path_buf(),
        source,
    };

    // Opening a directory succeeds on Linux; only the first read fails
    let file = File::open(path).map_err(not_found)?;
    if file.metadata().map_err(not_found)?.is_dir() {
        return Err(not_found(std::io::Error::other("is a directory")));
    }

    let snapshot = decode_snapshot(BufReader::new(file))
        .map_err(|e| with_archive_context(e, path))?;

    tracing::debug!("Read {} routes from {}", snapshot.len(), path.display());
    Ok(snapshot)
}

pub fn decode_snapshot<R: BufRead>(reader: R) -> AppResult<RouteSnapshot> {
    let mut routes = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| AppError::io("archive", e))?;
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            tracing::debug!("Skipping blank archive line {}", index + 1);
            continue;
        }

        routes.push(decode_record(line)?);
    }

    Ok(RouteSnapshot::new(routes))
}

/// Parse one archive line using the same positional rules as the capture
/// side.
pub fn decode_record(line: &str) -> AppResult<RouteRecord> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();

    if fields.len() != RouteRecord::FIELD_COUNT {
        tracing::warn!(
            "Archive line has {} fields, expected {}: {:?}",
            fields.len(),
            RouteRecord::FIELD_COUNT,
            line
        );
    }

    RouteRecord::from_fields(fields)
}

fn with_archive_context(err: AppError, path: &Path) -> AppError {
    match err {
        AppError::Io { source, .. } => AppError::io(format!("archive '{}'", path.display()), source),
        other => other,
    }
}
