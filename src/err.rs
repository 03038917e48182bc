use std::{
    io,
    fmt::Write,
    path::PathBuf,
    process::Output,
};
use colored::Colorize;
use crate::ext;

/// General enum, representing possible errors.
#[derive(Debug)]
pub enum Error {
    /// Input/output error together with the files it relates to.
    Io(io::Error, Vec<PathBuf>),
    /// Error, produced by an argument parser.
    Lexopt(lexopt::Error),
    /// External tool exited with a non-zero status: `(tool name, process output)`.
    ToolFail(&'static str, Output),
    /// Text record does not match the expected layout.
    MalformedRecord(String),
    /// File, required by a later stage, does not exist.
    MissingFile(PathBuf),
    /// Executable not found.
    NoExec(PathBuf),
    InvalidInput(String),
}

impl From<lexopt::Error> for Error {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

impl Error {
    /// Format error message.
    pub fn display(&self) -> String {
        let mut s = String::new();
        match self {
            Self::Io(e, files) => {
                write!(s, "{} in relation to ", "Input/Output error".red()).unwrap();
                if files.is_empty() {
                    write!(s, "unnamed streams").unwrap();
                } else {
                    write!(s, "{}", files.iter().map(|f| ext::fmt::path(f).cyan().to_string())
                        .collect::<Vec<_>>().join(", ")).unwrap();
                }
                write!(s, ": {}", e.kind()).unwrap();
                if let Some(e2) = e.get_ref() {
                    write!(s, ", {}", e2).unwrap();
                }
            }
            Self::Lexopt(e) => write!(s, "{} to parse command-line arguments: {}", "Failed".red(), e).unwrap(),
            Self::ToolFail(tool, output) => {
                write!(s, "{} {} ({})", tool.red(), "failed".red(), output.status).unwrap();
                let stderr = String::from_utf8_lossy(&output.stderr);
                let tail: Vec<_> = stderr.trim_end().lines().rev().take(5).collect();
                // Full output is kept in the tool log, show the last lines only.
                for line in tail.into_iter().rev() {
                    write!(s, "\n    {}", line).unwrap();
                }
            }
            Self::MalformedRecord(e) => write!(s, "{}: {}", "Malformed record".red(), e).unwrap(),
            Self::MissingFile(path) => write!(s, "{} {}", "Missing required file".red(),
                ext::fmt::path(path).cyan()).unwrap(),
            Self::NoExec(path) => write!(s, "{} at {}", "Could not find executable".red(),
                ext::fmt::path(path).cyan()).unwrap(),
            Self::InvalidInput(e) => write!(s, "{}: {}", "Invalid input".red(), e).unwrap(),
        };
        s
    }
}

/// What to do when a single unit of work fails.
/// Fatal/non-fatal behavior is selected per stage, see `pipeline::Policies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Propagate the error, aborting the run.
    Abort,
    /// Log the error and continue with the next unit.
    Skip,
}

macro_rules! validate_param {
    ($cond:expr, $($arg:expr),+) => {{
        if !($cond) {
            (
                Err($crate::Error::InvalidInput(format!($($arg),+)))
            ?)
        }
    }};
}
pub(crate) use validate_param;

macro_rules! add_path {
    (!) => {
        |e| $crate::Error::Io(e, Vec::new())
    };
    ($path:expr) => {
        |e| $crate::Error::Io(e, vec![std::convert::AsRef::<std::path::Path>::as_ref(&$path).to_owned()])
    };
    ($($path:expr),+) => {
        |e| {
            let mut v = Vec::new();
            $(
                v.push(std::convert::AsRef::<std::path::Path>::as_ref(&$path).to_owned());
            )*
            $crate::Error::Io(e, v)
        }
    };
}
pub(crate) use add_path;

macro_rules! error {
    ($var:ident, $($arg:expr),+ $(,)?) => {
        $crate::Error::$var(format!($($arg),+))
    }
}
pub(crate) use error;

/// Wrapper around the standard result.
pub type Result<T> = std::result::Result<T, Error>;
