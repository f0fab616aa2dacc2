use std::{
    fs::{File, OpenOptions},
    io::Read,
    path::Path,
    process::{Child, ChildStdout, Command, ExitStatus, Stdio},
};

use log::debug;

use crate::{
    error::{ShellError, ShellResult},
    parse::{Plan, RedirectKind, Redirection},
    utils::{Platform, resolve},
};

/// Exit codes of every stage of a finished plan, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitOutcome {
    codes: Vec<i32>,
}

impl ExitOutcome {
    pub fn codes(&self) -> &[i32] {
        &self.codes
    }

    /// Status of the plan as a whole: the last stage's code.
    pub fn code(&self) -> i32 {
        self.codes.last().copied().unwrap_or(0)
    }

    pub fn success(&self) -> bool {
        self.code() == 0
    }
}

/// Spawns and wires the processes of one [`Plan`].
pub struct Orchestrator<'a> {
    cwd: &'a Path,
    platform: Platform,
}

impl<'a> Orchestrator<'a> {
    pub fn new(cwd: &'a Path, platform: Platform) -> Self {
        Self { cwd, platform }
    }

    /// Run with the last stage writing to our own stdout.
    pub fn run(&self, plan: &Plan) -> ShellResult<ExitOutcome> {
        self.execute(plan, false).map(|(outcome, _)| outcome)
    }

    /// Run with the last stage's stdout collected and returned, unless an
    /// output redirection claims it.
    pub fn run_captured(&self, plan: &Plan) -> ShellResult<(ExitOutcome, Vec<u8>)> {
        self.execute(plan, true)
    }

    fn execute(&self, plan: &Plan, capture: bool) -> ShellResult<(ExitOutcome, Vec<u8>)> {
        let (mut input, mut output) = self.open_redirection(plan.redirection())?;
        let stages = plan.stages();
        let last = stages.len().saturating_sub(1);

        let mut children: Vec<Child> = Vec::with_capacity(stages.len());
        let mut upstream: Option<ChildStdout> = None;
        let mut failure: Option<ShellError> = None;

        for (i, stage) in stages.iter().enumerate() {
            let argv = self.platform.native_argv(stage.argv());
            let Some((program, args)) = argv.split_first() else {
                failure = Some(ShellError::EmptyStage);
                break;
            };

            let mut cmd = Command::new(program);
            cmd.args(args).current_dir(self.cwd);
            restore_default_signals(&mut cmd);

            if let Some(prev) = upstream.take() {
                cmd.stdin(Stdio::from(prev));
            } else if let Some(file) = input.take() {
                cmd.stdin(Stdio::from(file));
            }

            if i < last {
                cmd.stdout(Stdio::piped());
            } else if let Some((out, err)) = output.take() {
                cmd.stdout(Stdio::from(out)).stderr(Stdio::from(err));
            } else if capture {
                cmd.stdout(Stdio::piped());
            }

            // `cmd` drops at the end of this iteration, closing the parent's
            // copy of the upstream read end and of any redirection file.
            match cmd.spawn() {
                Ok(mut child) => {
                    debug!("stage {i} `{}` spawned as pid {}", stage.command_line(), child.id());
                    if i < last {
                        upstream = child.stdout.take();
                    }
                    children.push(child);
                }
                Err(e) => {
                    debug!("stage {i} `{}` failed to spawn: {e}", stage.command_line());
                    failure = Some(ShellError::from_spawn(stage.program(), e));
                    break;
                }
            }
        }

        let mut captured = Vec::new();
        if capture && failure.is_none() {
            if let Some(mut out) = children.last_mut().and_then(|c| c.stdout.take()) {
                if let Err(e) = out.read_to_end(&mut captured) {
                    failure = Some(ShellError::Execution(format!("reading output: {e}")));
                }
            }
        }

        // Every spawned child is reaped, even after a failure further down.
        let mut codes = Vec::with_capacity(children.len());
        for mut child in children {
            match child.wait() {
                Ok(status) => codes.push(exit_code(status)),
                Err(e) => {
                    failure.get_or_insert(ShellError::Execution(format!("wait failed: {e}")));
                }
            }
        }
        debug!("`{}` exited with {codes:?}", plan.command_line());

        if let Some(err) = failure {
            return Err(err);
        }
        let outcome = ExitOutcome { codes };
        if !outcome.success() {
            return Err(ShellError::ExitStatus {
                command: plan.command_line(),
                code: outcome.code(),
            });
        }
        Ok((outcome, captured))
    }

    fn open_redirection(
        &self,
        redirection: Option<&Redirection>,
    ) -> ShellResult<(Option<File>, Option<(File, File)>)> {
        let Some(Redirection { kind, target }) = redirection else {
            return Ok((None, None));
        };
        let path = resolve(self.cwd, target);
        let opened = match kind {
            RedirectKind::Input => File::open(&path).map(|f| (Some(f), None)),
            RedirectKind::Output => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path)
                .and_then(|f| Ok((None, Some((f.try_clone()?, f))))),
        };
        opened.map_err(|e| ShellError::from_io(target, e))
    }
}

/// The interpreter ignores SIGINT and SIGQUIT; its children must not.
#[cfg(unix)]
fn restore_default_signals(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // SAFETY: signal(2) is async-signal-safe and nothing else runs here.
    unsafe {
        cmd.pre_exec(|| {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
            libc::signal(libc::SIGQUIT, libc::SIG_DFL);
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn restore_default_signals(_cmd: &mut Command) {}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or_else(|| terminated_by_signal(status))
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> i32 {
    -1
}
