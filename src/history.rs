use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Lines entered so far, optionally mirrored to an append-only file.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
    path: Option<PathBuf>,
}

impl History {
    /// History that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load previous entries from `path` and keep appending to it.
    /// A missing file is an empty history.
    pub fn with_file(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append `line` unless it is blank or repeats the last entry.
    ///
    /// Returns whether the line was recorded. The in-memory entry is kept
    /// even when writing the file fails.
    pub fn record(&mut self, line: &str) -> io::Result<bool> {
        if line.trim().is_empty() || self.entries.last().is_some_and(|last| last == line) {
            return Ok(false);
        }
        self.entries.push(line.to_string());

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{line}")?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_duplicates_are_dropped() {
        let mut history = History::in_memory();
        assert!(history.record("ls").unwrap());
        assert!(!history.record("ls").unwrap());
        assert!(history.record("pwd").unwrap());
        assert!(history.record("ls").unwrap());
        assert_eq!(history.entries(), ["ls", "pwd", "ls"]);
    }

    #[test]
    fn blank_lines_are_not_recorded() {
        let mut history = History::in_memory();
        assert!(!history.record("   ").unwrap());
        assert!(history.entries().is_empty());
    }

    #[test]
    fn entries_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history");

        let mut history = History::with_file(&path).unwrap();
        assert!(history.entries().is_empty());
        history.record("echo one").unwrap();
        history.record("echo two").unwrap();

        let reloaded = History::with_file(&path).unwrap();
        assert_eq!(reloaded.entries(), ["echo one", "echo two"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "echo one\necho two\n");
    }
}
