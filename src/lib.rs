//! Command execution engine of the `minish` interactive shell.
//!
//! A line goes through [`parse::tokenize`] and operator detection, and is
//! then either dispatched to a builtin or planned into stages that
//! [`process_exec::Orchestrator`] spawns and wires together. [`Shell`] ties
//! these together and owns the session state.

pub mod builtins;
pub mod config;
pub mod error;
pub mod history;
pub mod parse;
pub mod process_exec;
pub mod shell;
pub mod utils;

pub use error::{ShellError, ShellResult};
pub use shell::{Flow, Shell};
