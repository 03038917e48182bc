//! Pipeline stages and shared run state.

pub mod tools;
pub mod extract;

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output},
    sync::Mutex,
};
use crate::{
    FailurePolicy,
    err::add_path,
    ext,
};

/// Explicit failure policy for every stage of the run.
///
/// Fragment generation and significance calling always abort:
/// every later stage depends on their output.
#[derive(Debug, Clone, Copy)]
pub struct Policies {
    /// One (sample, chromosome pair) extraction unit failed.
    pub extract: FailurePolicy,
    /// Fragment reference generation failed.
    pub fragments: FailurePolicy,
    /// Significance calling failed for one contact file.
    pub significance: FailurePolicy,
    /// One result file could not be read during aggregation.
    pub combine: FailurePolicy,
}

impl Policies {
    pub fn new(strict: bool) -> Self {
        Self {
            extract: if strict { FailurePolicy::Abort } else { FailurePolicy::Skip },
            fragments: FailurePolicy::Abort,
            significance: FailurePolicy::Abort,
            combine: if strict { FailurePolicy::Abort } else { FailurePolicy::Skip },
        }
    }
}

/// Applies a stage policy to the result of one unit of work:
/// propagates the error under `Abort`, logs and swallows it under `Skip`.
pub fn apply_policy(result: crate::Result<()>, policy: FailurePolicy, context: &str) -> crate::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) => match policy {
            FailurePolicy::Abort => Err(e),
            FailurePolicy::Skip => {
                log::error!("{}: {}", context, e.display());
                Ok(())
            }
        }
    }
}

/// Append-only log file, receiving the command line, exit status and captured
/// stdout/stderr of every tool invocation across the run.
/// Shared across extraction workers, hence the mutex.
pub struct ToolLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ToolLog {
    pub fn create(path: PathBuf) -> crate::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path).map_err(add_path!(path))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one invocation record.
    pub fn record(&self, cmd: &Command, output: &Output) -> crate::Result<()> {
        let mut buf = Vec::new();
        writeln!(buf, "$ {}", ext::fmt::command(cmd)).map_err(add_path!(!))?;
        writeln!(buf, "# exit status: {}", output.status).map_err(add_path!(!))?;
        buf.extend_from_slice(&output.stdout);
        if !output.stdout.ends_with(b"\n") && !output.stdout.is_empty() {
            buf.push(b'\n');
        }
        buf.extend_from_slice(&output.stderr);
        if !output.stderr.ends_with(b"\n") && !output.stderr.is_empty() {
            buf.push(b'\n');
        }
        let mut file = self.file.lock().unwrap();
        file.write_all(&buf).map_err(add_path!(self.path))
    }
}
