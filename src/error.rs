use std::io;
use thiserror::Error;

/// Every failure the engine can report for one input line.
///
/// None of these are fatal: the router prints them as a single line and
/// goes back to the prompt.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("pipe error: empty command")]
    EmptyStage,

    #[error("redirection error: {0}")]
    RedirectionSyntax(String),

    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("{0}: permission denied")]
    PermissionDenied(String),

    #[error("{0}: no such file or directory")]
    NotFound(String),

    #[error("{0}: is a directory")]
    IsADirectory(String),

    #[error("command '{command}' failed with exit code {code}")]
    ExitStatus { command: String, code: i32 },

    #[error("{0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Classify an OS error raised while acting on `subject`.
    pub fn from_io(subject: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ShellError::NotFound(subject.to_string()),
            io::ErrorKind::PermissionDenied => ShellError::PermissionDenied(subject.to_string()),
            io::ErrorKind::IsADirectory => ShellError::IsADirectory(subject.to_string()),
            _ => ShellError::Execution(format!("{subject}: {err}")),
        }
    }

    /// Like [`ShellError::from_io`], but a missing file means a missing program.
    pub fn from_spawn(program: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ShellError::CommandNotFound(program.to_string()),
            _ => Self::from_io(program, err),
        }
    }
}

pub type ShellResult<T> = Result<T, ShellError>;
