use std::path::{Path, PathBuf};

/// Host flavour, used for the few commands whose native name differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Rewrite an argv so its program exists on this platform.
    ///
    /// `dir` is a `cmd.exe` builtin, so it is reached through `cmd /C`.
    pub fn native_argv(self, argv: &[String]) -> Vec<String> {
        let Some((program, args)) = argv.split_first() else {
            return Vec::new();
        };
        let prefix: &[&str] = match (self, program.as_str()) {
            (Platform::Windows, "ls") => &["cmd", "/C", "dir"],
            (Platform::Windows, "grep") => &["findstr"],
            _ => return argv.to_vec(),
        };
        prefix
            .iter()
            .map(|s| s.to_string())
            .chain(args.iter().cloned())
            .collect()
    }
}

/// Resolve `path` against the session directory.
pub fn resolve(cwd: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Render `path` with the home directory folded into `~` and every
/// segment but the last cut to one character (`.x` for dot-dirs).
pub fn short_path(path: &Path, home: Option<&Path>) -> String {
    let folded = match home.and_then(|h| path.strip_prefix(h).ok()) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    };

    let segments: Vec<&str> = folded.split('/').filter(|s| !s.is_empty()).collect();
    let start = if folded.starts_with('/') { "/" } else { "" };
    let Some((last, init)) = segments.split_last() else {
        return start.to_string();
    };

    let mut shortened: Vec<String> = init
        .iter()
        .map(|seg| {
            if let Some(rest) = seg.strip_prefix('.') {
                format!(".{}", rest.chars().next().unwrap_or_default())
            } else if *seg == "~" {
                seg.to_string()
            } else {
                seg.chars().next().unwrap_or_default().to_string()
            }
        })
        .collect();
    shortened.push(last.to_string());
    format!("{start}{}", shortened.join("/"))
}
