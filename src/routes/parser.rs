// Routing table capture from the `route -n` tabular output

use futures::StreamExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_stream::wrappers::LinesStream;

use super::{RouteRecord, RouteSnapshot};
use crate::error::{AppError, AppResult};

/// How to run the routing table enumeration command
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub command: String,
    pub args: Vec<String>,
    /// Leading lines to discard (banner and column titles)
    pub header_lines: usize,
    pub timeout: Duration,
}

impl CaptureOptions {
    /// Command line as shown to the operator
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run the enumeration command and parse its output into a snapshot.
pub async fn capture(options: &CaptureOptions) -> AppResult<RouteSnapshot> {
    let command_line = options.command_line();
    tracing::info!("Capturing routing table with `{}`", command_line);

    let mut child = Command::new(&options.command)
        .args(&options.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| AppError::CommandUnavailable {
            command: command_line.clone(),
            source,
        })?;

    let stdout = child.stdout.take().ok_or_else(|| {
        AppError::io(
            format!("`{}` output", command_line),
            std::io::Error::other("stdout was not captured"),
        )
    })?;

    let run = async {
        let snapshot = parse_route_output(stdout, options.header_lines).await?;
        let status = child
            .wait()
            .await
            .map_err(|e| AppError::io(format!("`{}` exit status", command_line), e))?;
        Ok::<_, AppError>((snapshot, status))
    };

    // The child is killed on drop if the deadline passes
    let outcome = tokio::time::timeout(options.timeout, run).await;
    let (snapshot, status) = match outcome {
        Ok(result) => result?,
        Err(_) => {
            return Err(AppError::CommandTimeout {
                command: command_line,
                seconds: options.timeout.as_secs(),
            });
        }
    };

    if !status.success() {
        return Err(AppError::CommandFailed {
            command: command_line,
            status: status.to_string(),
        });
    }

    tracing::info!("Captured {} routes", snapshot.len());
    Ok(snapshot)
}

/// Parse the command's output stream, skipping `header_lines` leading lines
/// by position.
pub async fn parse_route_output<R>(reader: R, header_lines: usize) -> AppResult<RouteSnapshot>
where
    R: AsyncRead + Unpin,
{
    let mut lines = LinesStream::new(BufReader::new(reader).lines())
        .skip(header_lines)
        .enumerate();
    let mut routes = Vec::new();

    while let Some((index, line)) = lines.next().await {
        let line = line.map_err(|e| AppError::io("routing table output", e))?;
        let line_number = header_lines + index + 1;

        match parse_route_line(&line)? {
            Some(record) => routes.push(record),
            None => tracing::debug!("Skipping blank routing table line {}", line_number),
        }
    }

    Ok(RouteSnapshot::new(routes))
}

/// Parse one data line of the routing table.
///
/// Tokens are split on runs of whitespace and assigned to columns by
/// position. A line without tokens yields `None`.
pub fn parse_route_line(line: &str) -> AppResult<Option<RouteRecord>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(None);
    }

    if tokens.len() != RouteRecord::FIELD_COUNT {
        tracing::warn!(
            "Routing table line has {} columns, expected {}: {:?}",
            tokens.len(),
            RouteRecord::FIELD_COUNT,
            line
        );
    }

    RouteRecord::from_fields(tokens).map(Some)
}
