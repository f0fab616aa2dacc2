use minish::builtins::BUILTIN_NAMES;
use reedline::{Completer, Span, Suggestion};

/// Completes the first word of a line against the builtin names.
pub struct BuiltinCompleter;

impl Completer for BuiltinCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line = &line[..pos];
        let start = line.rfind(char::is_whitespace).map_or(0, |i| i + 1);
        if !line[..start].trim().is_empty() {
            return Vec::new();
        }

        let current = &line[start..];
        BUILTIN_NAMES
            .iter()
            .filter(|name| name.starts_with(current))
            .map(|name| Suggestion {
                value: name.to_string(),
                span: Span::new(start, pos),
                append_whitespace: true,
                ..Default::default()
            })
            .collect()
    }
}
