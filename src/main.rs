mod completions;
mod prompt;

use std::io::{self, IsTerminal};

use anyhow::Context;
use env_logger::Env;
use log::warn;
use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, DefaultHinter, Emacs, FileBackedHistory, History as _, HistoryItem, KeyCode,
    KeyModifiers, MenuBuilder, Reedline, ReedlineEvent, ReedlineMenu, Signal,
    default_emacs_keybindings,
};

use minish::{Flow, Shell, config, history::History};

use crate::{completions::BuiltinCompleter, prompt::ShellPrompt};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    // [1] Load configuration and the history log
    let cfg = config::init();
    let history = match cfg.history_path() {
        Some(path) => History::with_file(&path).unwrap_or_else(|e| {
            warn!("history {} not loaded: {e}", path.display());
            History::in_memory()
        }),
        None => History::in_memory(),
    };

    // [2] Recall list for the editor, seeded from the log
    let recall = recall_list(&history);

    let mut shell = Shell::new(history)
        .context("cannot determine the current directory")?
        .with_color(io::stderr().is_terminal());

    // [3] Auto-completion over the builtin names
    let menu = ReedlineMenu::EngineCompleter(Box::new(
        ColumnarMenu::default()
            .with_name("completion_menu")
            .with_column_width(Some(20)),
    ));

    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".into()),
            ReedlineEvent::MenuNext,
        ]),
    );

    // [4] Build the line editor
    let mut editor = Reedline::create()
        .with_history(Box::new(recall))
        .with_completer(Box::new(BuiltinCompleter))
        .with_menu(menu)
        .with_hinter(Box::new(
            DefaultHinter::default()
                .with_style(Style::new().italic().fg(Color::Rgb(120, 120, 120)))
                .with_min_chars(1),
        ))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    // The interpreter survives Ctrl-C during a pipeline; children get the
    // default handlers back before exec.
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_IGN);
        libc::signal(libc::SIGQUIT, libc::SIG_IGN);
    }

    // [5] Startup commands, not recorded in history
    for line in &cfg.startup {
        if shell.execute(line) == Flow::Exit {
            return Ok(());
        }
    }

    println!("Welcome to minish. Type 'help' for assistance.");

    // [6] Main REPL loop
    loop {
        let prompt = ShellPrompt::new(cfg.prompt.as_deref(), shell.cwd());
        match editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                if shell.route(&line) == Flow::Exit {
                    break;
                }
            }
            Ok(Signal::CtrlC) => println!("Use 'exit' to quit."),
            Ok(Signal::CtrlD) => {
                println!("Exiting minish...");
                break;
            }
            Ok(_) => continue,
            Err(e) => return Err(e).context("line editor failed"),
        }
    }
    Ok(())
}

fn recall_list(history: &History) -> FileBackedHistory {
    let mut recall = FileBackedHistory::default();
    for line in history.entries() {
        if let Err(e) = recall.save(HistoryItem::from_command_line(line)) {
            warn!("history entry `{line}` not restored: {e}");
        }
    }
    recall
}
