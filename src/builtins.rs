use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    time::SystemTime,
};

use crate::{
    error::{ShellError, ShellResult},
    utils::resolve,
};

/// Names of every builtin, in the order `help` lists them.
pub const BUILTIN_NAMES: [&str; 9] = [
    "cd", "pwd", "clear", "history", "help", "touch", "exit", "cat", "rm",
];

/// The closed set of in-process commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    Cd(Option<String>),
    Pwd,
    Clear,
    History,
    Help,
    Touch(Vec<String>),
    Rm(Vec<String>),
    Cat(Vec<String>),
    Exit,
}

impl Builtin {
    pub fn parse(name: &str, args: &[String]) -> Option<Self> {
        Some(match name {
            "cd" => Builtin::Cd(args.first().cloned()),
            "pwd" => Builtin::Pwd,
            "clear" => Builtin::Clear,
            "history" => Builtin::History,
            "help" => Builtin::Help,
            "touch" => Builtin::Touch(args.to_vec()),
            "rm" => Builtin::Rm(args.to_vec()),
            "cat" => Builtin::Cat(args.to_vec()),
            "exit" => Builtin::Exit,
            _ => return None,
        })
    }
}

/// A tokenized line without operators: either a builtin or a program to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Builtin(Builtin),
    External(Vec<String>),
}

impl Command {
    /// `tokens` must be non-empty.
    pub fn parse(tokens: Vec<String>) -> Self {
        match tokens.split_first().and_then(|(name, args)| Builtin::parse(name, args)) {
            Some(builtin) => Command::Builtin(builtin),
            None => Command::External(tokens),
        }
    }
}

/// New session directory after `cd target`; home when `target` is `None`.
pub fn cd(cwd: &Path, target: Option<&str>) -> ShellResult<PathBuf> {
    let path = match target {
        Some(t) => resolve(cwd, t),
        None => dirs::home_dir()
            .ok_or_else(|| ShellError::Execution("home directory is unknown".into()))?,
    };
    let shown = target.map_or_else(|| path.display().to_string(), str::to_string);

    let meta = fs::metadata(&path).map_err(|e| ShellError::from_io(&shown, e))?;
    if !meta.is_dir() {
        return Err(ShellError::Execution(format!("{shown}: not a directory")));
    }
    fs::canonicalize(&path).map_err(|e| ShellError::from_io(&shown, e))
}

/// Create `name` if absent and bump its modification time.
pub fn touch(cwd: &Path, name: &str) -> ShellResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(resolve(cwd, name))
        .map_err(|e| ShellError::from_io(name, e))?;
    file.set_modified(SystemTime::now())
        .map_err(|e| ShellError::from_io(name, e))
}

/// Delete the file `name`. Directories are refused.
pub fn rm(cwd: &Path, name: &str) -> ShellResult<()> {
    let path = resolve(cwd, name);
    if fs::symlink_metadata(&path).is_ok_and(|m| m.is_dir()) {
        return Err(ShellError::IsADirectory(name.to_string()));
    }
    fs::remove_file(&path).map_err(|e| ShellError::from_io(name, e))
}

/// Contents of `name`, for platforms without an external `cat`.
pub fn read_file(cwd: &Path, name: &str) -> ShellResult<Vec<u8>> {
    fs::read(resolve(cwd, name)).map_err(|e| ShellError::from_io(name, e))
}

pub fn help() -> &'static str {
    "
minish help:
  cd <path>         - Change directory (home when omitted).
  pwd               - Print working directory.
  clear             - Clear the screen.
  history           - Show command history.
  touch <file>...   - Create file(s) or update their timestamp.
  rm <file>...      - Remove file(s).
  cat <file>...     - Print file(s).
  exit              - Exit the shell.
  help              - Show this help message.

  Supports:
    - Built-in commands
    - System commands (ls, echo, mkdir, whoami, date)
    - I/O redirection: > (truncate), <
    - Pipes: |
"
}
