use std::fmt;

use crate::error::{ShellError, ShellResult};

/// Line-level operators recognized outside quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Pipe,        // |
    RedirectOut, // >
    RedirectIn,  // <
}

impl Operator {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '|' => Some(Operator::Pipe),
            '>' => Some(Operator::RedirectOut),
            '<' => Some(Operator::RedirectIn),
            _ => None,
        }
    }

    pub fn redirect_kind(self) -> Option<RedirectKind> {
        match self {
            Operator::RedirectOut => Some(RedirectKind::Output),
            Operator::RedirectIn => Some(RedirectKind::Input),
            Operator::Pipe => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operator::Pipe => "|",
            Operator::RedirectOut => ">",
            Operator::RedirectIn => "<",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `<`: the first stage reads the file.
    Input,
    /// `>`: the last stage writes the file, truncating it.
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub kind: RedirectKind,
    pub target: String,
}

/// One external command of a pipeline. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage(Vec<String>);

impl Stage {
    pub fn new(argv: Vec<String>) -> ShellResult<Self> {
        if argv.is_empty() {
            return Err(ShellError::EmptyStage);
        }
        Ok(Stage(argv))
    }

    pub fn program(&self) -> &str {
        &self.0[0]
    }

    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.0
    }

    pub fn command_line(&self) -> String {
        self.0.join(" ")
    }
}

/// The resolved shape of one input line: stages left to right, plus at most
/// one redirection bound to the first (input) or last (output) stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    stages: Vec<Stage>,
    redirection: Option<Redirection>,
}

impl Plan {
    pub fn single(stage: Stage) -> Self {
        Plan {
            stages: vec![stage],
            redirection: None,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn redirection(&self) -> Option<&Redirection> {
        self.redirection.as_ref()
    }

    pub fn command_line(&self) -> String {
        self.stages
            .iter()
            .map(Stage::command_line)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Split a line into words, honouring single and double quotes.
pub fn tokenize(line: &str) -> ShellResult<Vec<String>> {
    shell_words::split(line).map_err(|e| ShellError::Syntax(e.to_string()))
}

/// Byte offsets of every operator that is neither quoted, escaped nor
/// inside a trailing comment.
pub fn find_operators(line: &str) -> Vec<(usize, Operator)> {
    let mut found = Vec::new();
    let mut quote: Option<char> = None;
    let mut at_word_start = true;
    let mut chars = line.char_indices();

    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => {}
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\\') => {
                chars.next();
            }
            (None, '"' | '\'') => quote = Some(c),
            (None, '#') if at_word_start => break,
            (None, _) => {
                if let Some(op) = Operator::from_char(c) {
                    found.push((i, op));
                }
            }
        }
        at_word_start = quote.is_none() && c.is_whitespace();
    }
    found
}

/// Tokenize the text between two operators. A `#` glued to the operator
/// before it belongs to a word, not to a comment.
fn tokenize_segment(segment: &str) -> ShellResult<Vec<String>> {
    if segment.starts_with('#') {
        tokenize(&format!("\\{segment}"))
    } else {
        tokenize(segment)
    }
}

/// Pipe mode: split the raw text at each unquoted `|` and tokenize every
/// segment on its own.
pub fn plan_pipeline(line: &str) -> ShellResult<Plan> {
    let ops = find_operators(line);
    if let Some((_, op)) = ops.iter().find(|(_, op)| op.redirect_kind().is_some()) {
        return Err(ShellError::RedirectionSyntax(format!(
            "'{op}' is not supported inside a pipeline"
        )));
    }

    let mut stages = Vec::with_capacity(ops.len() + 1);
    let mut start = 0;
    let ends = ops.iter().map(|&(i, _)| i).chain(std::iter::once(line.len()));
    for end in ends {
        let segment = if start == 0 {
            tokenize(&line[..end])?
        } else {
            tokenize_segment(&line[start..end])?
        };
        stages.push(Stage::new(segment)?);
        start = end + 1;
    }

    Ok(Plan {
        stages,
        redirection: None,
    })
}

/// Redirection mode: `command > file` or `command < file`.
pub fn plan_redirection(line: &str) -> ShellResult<Plan> {
    let ops = find_operators(line);
    let (at, op) = match ops.as_slice() {
        [] => {
            return Err(ShellError::RedirectionSyntax(
                "no redirection operator".into(),
            ));
        }
        [first, rest @ ..] => {
            if let Some((_, extra)) = rest.first() {
                return Err(ShellError::RedirectionSyntax(format!("unexpected '{extra}'")));
            }
            *first
        }
    };
    let kind = op.redirect_kind().ok_or_else(|| {
        ShellError::RedirectionSyntax(format!("'{op}' is not a redirection operator"))
    })?;

    let command = tokenize(&line[..at])?;
    if command.is_empty() {
        return Err(ShellError::RedirectionSyntax("missing command".into()));
    }

    let mut target = tokenize_segment(&line[at + 1..])?;
    let target = match target.len() {
        0 => return Err(ShellError::RedirectionSyntax("missing file".into())),
        1 => target.remove(0),
        _ => {
            return Err(ShellError::RedirectionSyntax(format!(
                "unexpected argument '{}' after file",
                target[1]
            )));
        }
    };

    Ok(Plan {
        stages: vec![Stage::new(command)?],
        redirection: Some(Redirection { kind, target }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn quoted_region_is_one_token() {
        assert_eq!(tokenize("\"a b\"").unwrap(), words(&["a b"]));
        assert_eq!(tokenize("a b").unwrap(), words(&["a", "b"]));
        assert_eq!(tokenize("  echo   'x  y' z ").unwrap(), words(&["echo", "x  y", "z"]));
    }

    #[test]
    fn empty_line_has_no_tokens() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t ").unwrap().is_empty());
    }

    #[test]
    fn unterminated_quote_is_syntax_error() {
        let err = tokenize("echo \"oops").unwrap_err();
        assert!(matches!(err, ShellError::Syntax(_)));
    }

    #[test]
    fn operators_inside_quotes_are_ignored() {
        assert!(find_operators("echo \">\" hi").is_empty());
        assert!(find_operators("echo 'a|b'").is_empty());
        assert!(find_operators("echo a\\|b").is_empty());
        assert!(find_operators("echo hi # | cat").is_empty());
        assert_eq!(
            find_operators("echo a|# b | c"),
            vec![(6, Operator::Pipe), (11, Operator::Pipe)]
        );
        assert_eq!(
            find_operators("echo \"a|b\" | wc"),
            vec![(11, Operator::Pipe)]
        );
        assert_eq!(
            find_operators("sort<in.txt"),
            vec![(4, Operator::RedirectIn)]
        );
    }

    #[test]
    fn pipeline_splits_into_stages() {
        let plan = plan_pipeline("echo hi | cat").unwrap();
        let argv: Vec<_> = plan.stages().iter().map(|s| s.argv().to_vec()).collect();
        assert_eq!(argv, vec![words(&["echo", "hi"]), words(&["cat"])]);
        assert!(plan.redirection().is_none());
        assert_eq!(plan.command_line(), "echo hi | cat");
    }

    #[test]
    fn quoting_in_one_segment_stays_there() {
        let plan = plan_pipeline("echo 'a | b' | tr a-z A-Z | wc -c").unwrap();
        assert_eq!(plan.stages().len(), 3);
        assert_eq!(plan.stages()[0].args(), &words(&["a | b"])[..]);
    }

    #[test]
    fn hash_after_operator_is_a_word() {
        let plan = plan_pipeline("echo hi |# cat").unwrap();
        assert_eq!(plan.stages()[1].argv(), &words(&["#", "cat"])[..]);

        let plan = plan_redirection("echo hi >#out").unwrap();
        assert_eq!(plan.redirection().unwrap().target, "#out");

        assert!(matches!(
            plan_pipeline("echo hi | # cat"),
            Err(ShellError::EmptyStage)
        ));
    }

    #[test]
    fn empty_pipe_segment_is_rejected() {
        assert!(matches!(
            plan_pipeline("echo hi | | cat"),
            Err(ShellError::EmptyStage)
        ));
        assert!(matches!(plan_pipeline("| cat"), Err(ShellError::EmptyStage)));
        assert!(matches!(plan_pipeline("echo hi |"), Err(ShellError::EmptyStage)));
    }

    #[test]
    fn redirection_inside_pipeline_is_rejected() {
        assert!(matches!(
            plan_pipeline("echo hi | cat > out.txt"),
            Err(ShellError::RedirectionSyntax(_))
        ));
    }

    #[test]
    fn output_redirection_plan() {
        let plan = plan_redirection("echo hi > out.txt").unwrap();
        assert_eq!(plan.stages().len(), 1);
        assert_eq!(plan.stages()[0].argv(), &words(&["echo", "hi"])[..]);
        assert_eq!(
            plan.redirection(),
            Some(&Redirection {
                kind: RedirectKind::Output,
                target: "out.txt".into()
            })
        );
    }

    #[test]
    fn input_redirection_accepts_quoted_target() {
        let plan = plan_redirection("wc -l < 'my file.txt'").unwrap();
        let redirect = plan.redirection().unwrap();
        assert_eq!(redirect.kind, RedirectKind::Input);
        assert_eq!(redirect.target, "my file.txt");
    }

    #[test]
    fn malformed_redirections() {
        for line in ["> out.txt", "echo hi >", "echo hi > a b", "echo hi >> out", "a < b > c"] {
            assert!(
                matches!(plan_redirection(line), Err(ShellError::RedirectionSyntax(_))),
                "{line} should be rejected"
            );
        }
    }

    #[test]
    fn stage_cannot_be_empty() {
        assert!(matches!(Stage::new(vec![]), Err(ShellError::EmptyStage)));
    }
}
