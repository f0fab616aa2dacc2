use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, warn};
use nu_ansi_term::Color;

use crate::{
    builtins::{self, Builtin, Command},
    error::{ShellError, ShellResult},
    history::History,
    parse::{Operator, Plan, Stage, find_operators, plan_pipeline, plan_redirection, tokenize},
    process_exec::{ExitOutcome, Orchestrator},
    utils::Platform,
};

/// What the caller should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// One interactive session: the only owner of the history, the current
/// directory and the writers builtins and diagnostics go to.
pub struct Shell<O: Write = io::Stdout, E: Write = io::Stderr> {
    history: History,
    cwd: PathBuf,
    platform: Platform,
    color: bool,
    out: O,
    err: E,
}

impl Shell {
    /// Session on the real stdout/stderr, starting in the process directory.
    pub fn new(history: History) -> io::Result<Self> {
        Ok(Self::with_io(
            history,
            env::current_dir()?,
            Platform::current(),
            io::stdout(),
            io::stderr(),
        ))
    }
}

impl<O: Write, E: Write> Shell<O, E> {
    pub fn with_io(history: History, cwd: PathBuf, platform: Platform, out: O, err: E) -> Self {
        Self {
            history,
            cwd,
            platform,
            color: false,
            out,
            err,
        }
    }

    /// Paint the diagnostic prefix.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn stdout(&self) -> &O {
        &self.out
    }

    pub fn stderr(&self) -> &E {
        &self.err
    }

    /// Handle one line typed by the user: record it, then execute it.
    pub fn route(&mut self, line: &str) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }
        if let Err(e) = self.history.record(line) {
            warn!("history not saved to {:?}: {e}", self.history.path());
            self.diagnose(&ShellError::Execution(format!("failed to save history: {e}")));
        }
        self.execute(line)
    }

    /// Execute a line without recording it. Errors become diagnostics.
    pub fn execute(&mut self, line: &str) -> Flow {
        match self.dispatch(line) {
            Ok(flow) => flow,
            Err(e) => {
                self.diagnose(&e);
                Flow::Continue
            }
        }
    }

    fn dispatch(&mut self, line: &str) -> ShellResult<Flow> {
        let tokens = tokenize(line)?;
        if tokens.is_empty() {
            return Ok(Flow::Continue);
        }

        let ops = find_operators(line);
        if ops.iter().any(|&(_, op)| op == Operator::Pipe) {
            debug!("pipe mode: {line}");
            self.run_plan(&plan_pipeline(line)?)?;
            return Ok(Flow::Continue);
        }
        if !ops.is_empty() {
            debug!("redirection mode: {line}");
            self.run_plan(&plan_redirection(line)?)?;
            return Ok(Flow::Continue);
        }

        match Command::parse(tokens) {
            Command::Builtin(builtin) => {
                debug!("builtin: {builtin:?}");
                self.run_builtin(builtin)
            }
            Command::External(argv) => {
                self.run_plan(&Plan::single(Stage::new(argv)?))?;
                Ok(Flow::Continue)
            }
        }
    }

    fn run_plan(&mut self, plan: &Plan) -> ShellResult<ExitOutcome> {
        // Children write straight to fd 1; keep our own output ahead of theirs.
        self.out.flush()?;
        Orchestrator::new(&self.cwd, self.platform).run(plan)
    }

    fn run_builtin(&mut self, builtin: Builtin) -> ShellResult<Flow> {
        match builtin {
            Builtin::Cd(target) => match builtins::cd(&self.cwd, target.as_deref()) {
                Ok(dir) => self.cwd = dir,
                Err(e) => writeln!(self.err, "cd: {e}")?,
            },
            Builtin::Pwd => writeln!(self.out, "{}", self.cwd.display())?,
            Builtin::Clear => self.clear()?,
            Builtin::History => {
                for (i, line) in self.history.entries().iter().enumerate() {
                    writeln!(self.out, "{}: {line}", i + 1)?;
                }
            }
            Builtin::Help => write!(self.out, "{}", builtins::help())?,
            Builtin::Touch(files) if files.is_empty() => {
                writeln!(self.err, "touch: missing file operand")?
            }
            Builtin::Touch(files) => {
                for name in &files {
                    if let Err(e) = builtins::touch(&self.cwd, name) {
                        writeln!(self.err, "touch: cannot touch {e}")?;
                    }
                }
            }
            Builtin::Rm(files) if files.is_empty() => writeln!(self.err, "rm: missing operand")?,
            Builtin::Rm(files) => {
                for name in &files {
                    if let Err(e) = builtins::rm(&self.cwd, name) {
                        writeln!(self.err, "rm: cannot remove {e}")?;
                    }
                }
            }
            Builtin::Cat(files) if files.is_empty() => {
                writeln!(self.err, "cat: missing file operand")?
            }
            Builtin::Cat(files) => self.cat(files)?,
            Builtin::Exit => {
                writeln!(self.out, "Exiting minish...")?;
                self.out.flush()?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    fn cat(&mut self, files: Vec<String>) -> ShellResult<()> {
        match self.platform {
            Platform::Unix => {
                let argv = std::iter::once("cat".to_string()).chain(files).collect();
                self.run_plan(&Plan::single(Stage::new(argv)?))?;
            }
            Platform::Windows => {
                for name in &files {
                    match builtins::read_file(&self.cwd, name) {
                        Ok(bytes) => self.out.write_all(&bytes)?,
                        Err(e) => writeln!(self.err, "cat: {e}")?,
                    }
                }
                self.out.flush()?;
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> ShellResult<()> {
        match self.platform {
            Platform::Unix => {
                write!(self.out, "\x1b[2J\x1b[H")?;
                self.out.flush()?;
            }
            Platform::Windows => {
                let argv = ["cmd", "/C", "cls"].map(String::from).to_vec();
                self.run_plan(&Plan::single(Stage::new(argv)?))?;
            }
        }
        Ok(())
    }

    fn diagnose(&mut self, err: &ShellError) {
        let prefix = if self.color {
            Color::Red.bold().paint("minish:").to_string()
        } else {
            "minish:".to_string()
        };
        // Nowhere left to report a failing diagnostic writer.
        let _ = writeln!(self.err, "{prefix} {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(dir: &Path) -> Shell<Vec<u8>, Vec<u8>> {
        Shell::with_io(
            History::in_memory(),
            dir.to_path_buf(),
            Platform::Unix,
            Vec::new(),
            Vec::new(),
        )
    }

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn blank_lines_do_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = session(dir.path());
        assert_eq!(sh.route(""), Flow::Continue);
        assert_eq!(sh.route("   \t"), Flow::Continue);
        assert!(sh.history().entries().is_empty());
        assert!(sh.stdout().is_empty() && sh.stderr().is_empty());
    }

    #[test]
    fn lines_are_recorded_verbatim_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = session(dir.path());
        sh.route("pwd  ");
        sh.route("pwd  ");
        sh.route("help");
        assert_eq!(sh.history().entries(), ["pwd  ", "help"]);
    }

    #[test]
    fn history_lists_with_one_based_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = session(dir.path());
        sh.route("pwd");
        sh.route("history");
        let out = text(sh.stdout());
        assert!(out.ends_with("1: pwd\n2: history\n"), "{out}");
    }

    #[test]
    fn syntax_error_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = session(dir.path());
        assert_eq!(sh.route("echo \"unterminated"), Flow::Continue);
        assert!(text(sh.stderr()).starts_with("minish: syntax error"));
        assert_eq!(sh.history().entries().len(), 1);
    }

    #[test]
    fn cd_failure_keeps_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = session(dir.path());
        sh.route("cd does-not-exist");
        assert_eq!(sh.cwd(), dir.path());
        assert_eq!(
            text(sh.stderr()),
            "cd: does-not-exist: no such file or directory\n"
        );
    }

    #[test]
    fn cd_then_pwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("inner")).unwrap();
        let mut sh = session(dir.path());
        sh.route("cd inner");
        sh.route("pwd");
        let expected = std::fs::canonicalize(dir.path().join("inner")).unwrap();
        assert_eq!(sh.cwd(), expected);
        assert_eq!(text(sh.stdout()), format!("{}\n", expected.display()));
    }

    #[test]
    fn missing_operands_print_usage() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = session(dir.path());
        sh.route("touch");
        sh.route("rm");
        sh.route("cat");
        assert_eq!(
            text(sh.stderr()),
            "touch: missing file operand\nrm: missing operand\ncat: missing file operand\n"
        );
    }

    #[test]
    fn exit_asks_caller_to_stop() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = session(dir.path());
        assert_eq!(sh.route("exit"), Flow::Exit);
        assert_eq!(text(sh.stdout()), "Exiting minish...\n");
    }

    #[test]
    fn windows_cat_reads_files_in_process() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha\n").unwrap();
        let mut sh = Shell::with_io(
            History::in_memory(),
            dir.path().to_path_buf(),
            Platform::Windows,
            Vec::new(),
            Vec::new(),
        );
        sh.route("cat a.txt missing.txt");
        assert_eq!(text(sh.stdout()), "alpha\n");
        assert_eq!(text(sh.stderr()), "cat: missing.txt: no such file or directory\n");
    }

    #[test]
    fn colored_prefix_is_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = session(dir.path()).with_color(true);
        sh.route("echo hi | | cat");
        let err = text(sh.stderr());
        assert!(err.contains("\x1b["), "{err:?}");
        assert!(err.ends_with("pipe error: empty command\n"));
    }
}
