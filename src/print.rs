//! Hands a finished photo to the system print spooler.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

/// Spooler command used when the config names none.
pub const DEFAULT_PRINT_COMMAND: &str = "lp";

/// Errors that can occur when printing.
#[derive(Debug)]
pub enum PrintError {
    /// Print command not found on PATH
    CommandNotFound(String),
    /// Failed to spawn the print command
    SpawnFailed(std::io::Error),
    /// Print command exited with non-zero status
    Failed { exit_code: Option<i32>, stderr: String },
}

impl std::fmt::Display for PrintError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrintError::CommandNotFound(command) => write!(
                f,
                "Print command '{}' not found. Set [print] command in the config file.",
                command
            ),
            PrintError::SpawnFailed(e) => write!(f, "Failed to start printing: {}", e),
            PrintError::Failed { exit_code, stderr } => {
                write!(f, "Printing failed with code {:?}\n{}", exit_code, stderr)
            }
        }
    }
}

impl std::error::Error for PrintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrintError::SpawnFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Runs `<command> <args...> <file>` once per print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printer {
    command: String,
    args: Vec<String>,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(DEFAULT_PRINT_COMMAND, Vec::new())
    }
}

impl Printer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Full argument list for printing `file`.
    pub fn build_args(&self, file: &Path) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(file.to_string_lossy().into_owned());
        args
    }

    /// Print `file` and wait for the spooler to accept it.
    pub async fn print(&self, file: &Path) -> Result<(), PrintError> {
        let args = self.build_args(file);
        log::info!("Printing {} with {}", file.display(), self.command);

        let output = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PrintError::CommandNotFound(self.command.clone())
                } else {
                    PrintError::SpawnFailed(e)
                }
            })?;

        if !output.status.success() {
            return Err(PrintError::Failed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            log::info!("{}", stdout.trim());
        }
        Ok(())
    }
}
