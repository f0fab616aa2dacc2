use std::{borrow::Cow, path::Path};

use minish::utils::short_path;
use reedline::{Prompt, PromptEditMode, PromptHistorySearch};

pub struct ShellPrompt {
    left: String,
}

impl ShellPrompt {
    /// A fixed prompt from the config wins over the directory prompt.
    pub fn new(custom: Option<&str>, cwd: &Path) -> Self {
        let left = match custom {
            Some(prompt) => prompt.to_string(),
            None => format!("{}> ", short_path(cwd, dirs::home_dir().as_deref())),
        };
        Self { left }
    }
}

impl Prompt for ShellPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.left)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        Cow::Borrowed("? ")
    }
}
