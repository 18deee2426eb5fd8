// Operator-facing output. Nothing else in the crate prints.

use serde::Serialize;
use std::io::{self, Stderr, Stdout, Write};
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::routes::RouteSnapshot;

const TOOL_PREFIX: &str = "rback";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
enum Summary<'a> {
    Export {
        path: &'a Path,
        routes: usize,
    },
    Import {
        path: &'a Path,
        routes: &'a RouteSnapshot,
    },
}

pub struct Reporter<O: Write, E: Write> {
    out: O,
    err: E,
    format: ReportFormat,
}

impl Reporter<Stdout, Stderr> {
    pub fn stdio(format: ReportFormat) -> Self {
        Reporter::new(io::stdout(), io::stderr(), format)
    }
}

impl<O: Write, E: Write> Reporter<O, E> {
    pub fn new(out: O, err: E, format: ReportFormat) -> Self {
        Reporter { out, err, format }
    }

    pub fn set_format(&mut self, format: ReportFormat) {
        self.format = format;
    }

    pub fn exported(&mut self, path: &Path, snapshot: &RouteSnapshot) -> AppResult<()> {
        match self.format {
            ReportFormat::Text => writeln!(
                self.out,
                "exported {} routes to '{}'",
                snapshot.len(),
                path.display()
            )
            .map_err(stdout_error)?,
            ReportFormat::Json => self.write_json(&Summary::Export {
                path,
                routes: snapshot.len(),
            })?,
        }
        Ok(())
    }

    pub fn imported(&mut self, path: &Path, snapshot: &RouteSnapshot) -> AppResult<()> {
        match self.format {
            ReportFormat::Text => {
                for record in snapshot {
                    writeln!(self.out, "imported: {}", record).map_err(stdout_error)?;
                }
                writeln!(
                    self.out,
                    "read {} routes from '{}'",
                    snapshot.len(),
                    path.display()
                )
                .map_err(stdout_error)?;
            }
            ReportFormat::Json => self.write_json(&Summary::Import {
                path,
                routes: snapshot,
            })?,
        }
        Ok(())
    }

    pub fn usage(&mut self, help: &str) -> AppResult<()> {
        write!(self.out, "{}", help).map_err(stdout_error)
    }

    /// Best effort: a failure to print the failure is not reported again
    pub fn failure(&mut self, error: &AppError) {
        let _ = writeln!(self.err, "{}: {}", TOOL_PREFIX, error);
        if let Some(hint) = error.hint() {
            let _ = writeln!(self.err, "{}: hint: {}", TOOL_PREFIX, hint);
        }
    }

    fn write_json(&mut self, summary: &Summary<'_>) -> AppResult<()> {
        serde_json::to_writer_pretty(&mut self.out, summary)?;
        writeln!(self.out).map_err(stdout_error)
    }

    #[cfg(test)]
    fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

fn stdout_error(e: io::Error) -> AppError {
    AppError::io("standard output", e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::RouteRecord;

    fn snapshot() -> RouteSnapshot {
        RouteSnapshot::new(vec![
            RouteRecord::from_fields([
                "0.0.0.0", "192.168.1.1", "0.0.0.0", "UG", "0", "0", "0", "eth0",
            ])
            .unwrap(),
            RouteRecord::from_fields([
                "192.168.1.0", "0.0.0.0", "255.255.255.0", "U", "0", "0", "0", "eth0",
            ])
            .unwrap(),
        ])
    }

    fn text_reporter() -> Reporter<Vec<u8>, Vec<u8>> {
        Reporter::new(Vec::new(), Vec::new(), ReportFormat::Text)
    }

    #[test]
    fn test_exported_text() {
        let mut reporter = text_reporter();
        reporter
            .exported(Path::new("/tmp/archive.rback"), &snapshot())
            .unwrap();

        let (out, err) = reporter.into_parts();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "exported 2 routes to '/tmp/archive.rback'\n"
        );
        assert!(err.is_empty());
    }

    #[test]
    fn test_imported_text() {
        let mut reporter = text_reporter();
        reporter
            .imported(Path::new("/tmp/archive.rback"), &snapshot())
            .unwrap();

        let (out, _) = reporter.into_parts();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "imported: 0.0.0.0,192.168.1.1,0.0.0.0,UG,0,0,0,eth0\n\
             imported: 192.168.1.0,0.0.0.0,255.255.255.0,U,0,0,0,eth0\n\
             read 2 routes from '/tmp/archive.rback'\n"
        );
    }

    #[test]
    fn test_imported_json() {
        let mut reporter = Reporter::new(Vec::new(), Vec::new(), ReportFormat::Json);
        reporter
            .imported(Path::new("/tmp/archive.rback"), &snapshot())
            .unwrap();

        let (out, _) = reporter.into_parts();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["mode"], "import");
        assert_eq!(value["path"], "/tmp/archive.rback");
        assert_eq!(value["routes"].as_array().unwrap().len(), 2);
        assert_eq!(value["routes"][0]["gateway"], "192.168.1.1");
        assert_eq!(value["routes"][1]["genmask"], "255.255.255.0");
    }

    #[test]
    fn test_exported_json() {
        let mut reporter = Reporter::new(Vec::new(), Vec::new(), ReportFormat::Json);
        reporter
            .exported(Path::new("/tmp/archive.rback"), &snapshot())
            .unwrap();

        let (out, _) = reporter.into_parts();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["mode"], "export");
        assert_eq!(value["routes"], 2);
    }

    #[test]
    fn test_failure_goes_to_stderr_with_prefix() {
        let mut reporter = text_reporter();
        reporter.failure(&AppError::Usage(
            "choose to import or export route data, not both".to_string(),
        ));

        let (out, err) = reporter.into_parts();
        let err = String::from_utf8(err).unwrap();
        assert!(out.is_empty());
        assert!(err.starts_with("rback: usage error: choose to import or export"));
        assert!(err.contains("rback: hint: run with --help"));
    }
}
