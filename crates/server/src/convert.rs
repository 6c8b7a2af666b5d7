//! SQL script to database conversion.
//!
//! The orchestrator only sees the [`Converter`] capability. The default
//! implementation shells out to the `sqlite3` CLI, but an in-process
//! implementation can be swapped in without touching the rollback logic.

use async_trait::async_trait;
use sqldepot_core::config::ConversionConfig;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Maximum number of stderr bytes kept for logging.
const MAX_STDERR_BYTES: usize = 4096;

/// Conversion failure. Every variant is reported to clients as the same
/// generic error; the detail is for logs.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("conversion failed: {0}")]
    Other(String),
}

/// Builds a database file from a SQL script.
///
/// Conversion is all-or-nothing from the caller's point of view: on error
/// the output may or may not exist and must be cleaned up by the caller.
#[async_trait]
pub trait Converter: Send + Sync + 'static {
    /// Read `script` into a new database at `database`.
    async fn convert(&self, script: &Path, database: &Path) -> Result<(), ConversionError>;
}

/// Converter that runs `<program> -safe -bail <database> ".read '<script>'"`.
///
/// `-safe` makes the shell refuse dot-commands and SQL functions that reach
/// outside the database (`.shell`, `.system`, `.output`, `ATTACH`, ...), so
/// an uploaded script can only build its own database.
#[derive(Clone, Debug)]
pub struct SqliteCli {
    program: String,
    timeout: Option<Duration>,
}

impl SqliteCli {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.program.clone(), config.timeout())
    }

    fn command(&self, script: &Path, database: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-safe")
            .arg("-bail")
            .arg(database)
            .arg(format!(".read '{}'", script.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Converter for SqliteCli {
    #[tracing::instrument(skip(self), fields(program = %self.program))]
    async fn convert(&self, script: &Path, database: &Path) -> Result<(), ConversionError> {
        let child = self
            .command(script, database)
            .spawn()
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it
        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| ConversionError::TimedOut {
                    program: self.program.clone(),
                    timeout,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| ConversionError::Other(format!("waiting for {}: {e}", self.program)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = &output.stderr[..output.stderr.len().min(MAX_STDERR_BYTES)];
        Err(ConversionError::Failed {
            program: self.program.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        })
    }
}
