use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use log::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Fixed prompt; `None` shows the shortened current directory.
    pub prompt: Option<String>,
    pub history_file: Option<PathBuf>,
    /// Lines run once before the first prompt.
    pub startup: Vec<String>,
}

impl Config {
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file.clone().or_else(default_history_path)
    }
}

// rc file
pub fn config_file_path() -> Option<PathBuf> {
    env::var_os("MINISH_CONFIG")
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("minish").join("minishrc")))
}

pub fn default_history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".minish_history"))
}

pub fn init() -> Config {
    match config_file_path() {
        Some(path) => load_config(&path),
        None => Config::default(),
    }
}

pub fn load_config(path: &Path) -> Config {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Config::default(),
        Err(e) => {
            warn!("ignoring unreadable config {}: {e}", path.display());
            Config::default()
        }
    }
}

/// `key = value` lines, `#` comments, and a `#startup` section whose
/// lines are commands.
pub fn parse_config(content: &str) -> Config {
    let mut config = Config::default();
    let mut in_startup = false;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(comment) = line.strip_prefix('#') {
            if comment.trim().eq_ignore_ascii_case("startup") {
                in_startup = true;
            }
            continue;
        }

        if in_startup {
            config.startup.push(line.to_string());
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            warn!("config: ignoring line `{line}`");
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim() {
            "prompt" => config.prompt = Some(value.to_string()),
            "history" => config.history_file = Some(PathBuf::from(value)),
            other => warn!("config: unknown key `{other}`"),
        }
    }
    config
}
