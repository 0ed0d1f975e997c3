//! Terminal front end: colored console output, line input and the REPL

pub mod console;
pub mod input;
pub mod repl;

pub use console::Console;
pub use input::{InputSource, ScriptedInput, StdinInput};
pub use repl::{ExitReason, Repl, ReplOptions, SessionCommand, TurnPlanner, EXIT_WORDS, RETRY_HINT};
