//! Read-eval-print loop shared by every profile

use std::sync::Arc;

use anyhow::Result;

use super::console::Console;
use super::input::InputSource;
use crate::agent::{ChatBackend, RunResult};
use crate::conversation::History;

/// Words that end the session
pub const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

/// Printed after a failed turn
pub const RETRY_HINT: &str = "You can try again or type 'exit' to quit.";

/// What a line of user input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Exit,
    /// One of the profile's extra sentinels (e.g. `logout`)
    Logout,
    Empty,
    Message(String),
}

impl SessionCommand {
    /// Classify a line; sentinels are matched case-insensitively after trimming
    pub fn parse(line: &str, logout_words: &[String]) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return SessionCommand::Empty;
        }

        let lowered = trimmed.to_lowercase();
        if EXIT_WORDS.contains(&lowered.as_str()) {
            SessionCommand::Exit
        } else if logout_words.iter().any(|w| w.eq_ignore_ascii_case(&lowered)) {
            SessionCommand::Logout
        } else {
            SessionCommand::Message(trimmed.to_string())
        }
    }
}

/// Rewrites a user line into the prompt actually sent to the agent
pub trait TurnPlanner: Send + Sync {
    fn plan(&self, input: &str) -> String;
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user typed an exit word
    Requested,
    /// The user typed a logout word
    Logout,
    /// Stdin closed
    EndOfInput,
    /// Ctrl-C
    Interrupted,
}

/// Per-profile REPL behavior
#[derive(Debug, Clone)]
pub struct ReplOptions {
    pub title: String,
    /// Lines printed under the banner
    pub intro: Vec<String>,
    /// Sent before the first read; its reply is printed like any other
    pub initial_prompt: Option<String>,
    /// Extra sentinels that end the loop with `ExitReason::Logout`
    pub logout_words: Vec<String>,
    /// Sent (reply discarded) after a failed turn
    pub error_followup: Option<String>,
    pub farewell: String,
    /// Print a line per tool call
    pub show_tool_calls: bool,
}

impl ReplOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            intro: Vec::new(),
            initial_prompt: None,
            logout_words: Vec::new(),
            error_followup: None,
            farewell: "Goodbye!".to_string(),
            show_tool_calls: true,
        }
    }

    pub fn with_intro<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intro = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_initial_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.initial_prompt = Some(prompt.into());
        self
    }

    pub fn with_logout_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.logout_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_error_followup(mut self, prompt: impl Into<String>) -> Self {
        self.error_followup = Some(prompt.into());
        self
    }

    pub fn with_farewell(mut self, farewell: impl Into<String>) -> Self {
        self.farewell = farewell.into();
        self
    }

    pub fn with_tool_calls_shown(mut self, show: bool) -> Self {
        self.show_tool_calls = show;
        self
    }
}

/// The loop: read a line, send it with the history, print the reply
pub struct Repl {
    backend: Arc<dyn ChatBackend>,
    options: ReplOptions,
    planner: Option<Arc<dyn TurnPlanner>>,
    console: Console,
    history: History,
}

impl Repl {
    pub fn new(backend: Arc<dyn ChatBackend>, options: ReplOptions) -> Self {
        Self {
            backend,
            options,
            planner: None,
            console: Console::new(),
            history: History::new(),
        }
    }

    pub fn with_planner(mut self, planner: Arc<dyn TurnPlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Run until an exit word, a logout word, end of input or Ctrl-C
    pub async fn run<I: InputSource>(&mut self, input: &mut I) -> Result<ExitReason> {
        tracing::info!("[Repl] Starting session {}", self.history.id());
        self.console.print_banner(&self.options.title, &self.options.intro);

        if let Some(prompt) = self.options.initial_prompt.clone() {
            if let Some(reason) = self.interruptible_turn(&prompt).await {
                return Ok(reason);
            }
        }

        loop {
            self.console.print_prompt();

            let line = tokio::select! {
                line = input.read_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    self.console.println();
                    self.console.print_system("Program interrupted. Exiting...");
                    tracing::info!("[Repl] Interrupted");
                    return Ok(ExitReason::Interrupted);
                }
            };

            let Some(line) = line else {
                tracing::info!("[Repl] End of input");
                self.console.println();
                self.console.print_system(&self.options.farewell);
                return Ok(ExitReason::EndOfInput);
            };

            match SessionCommand::parse(&line, &self.options.logout_words) {
                SessionCommand::Exit => {
                    tracing::info!("[Repl] User requested exit");
                    self.console.print_system(&self.options.farewell);
                    return Ok(ExitReason::Requested);
                }
                SessionCommand::Logout => {
                    tracing::info!("[Repl] User requested logout");
                    return Ok(ExitReason::Logout);
                }
                SessionCommand::Empty => continue,
                SessionCommand::Message(text) => {
                    if let Some(reason) = self.interruptible_turn(&text).await {
                        return Ok(reason);
                    }
                }
            }
        }
    }

    /// One turn that Ctrl-C can abort; `Some` means stop the loop
    async fn interruptible_turn(&mut self, text: &str) -> Option<ExitReason> {
        tokio::select! {
            _ = self.turn(text) => None,
            _ = tokio::signal::ctrl_c() => {
                self.console.clear_thinking();
                self.console.print_system("Program interrupted. Exiting...");
                tracing::info!("[Repl] Interrupted during a turn");
                Some(ExitReason::Interrupted)
            }
        }
    }

    /// Send one message. Failures are printed and leave the history as it was.
    pub async fn turn(&mut self, text: &str) -> Option<RunResult> {
        tracing::info!("[Repl] User input: {}", text);

        let outgoing = match &self.planner {
            Some(planner) => planner.plan(text),
            None => text.to_string(),
        };
        if outgoing != text {
            tracing::debug!("[Repl] Planned prompt: {}", outgoing);
        }

        self.console.print_thinking();
        let result = self.backend.respond(&outgoing, &self.history).await;
        self.console.clear_thinking();

        match result {
            Ok(result) => {
                tracing::info!("[Repl] Agent response: {}", result.output);
                if self.options.show_tool_calls {
                    for call in &result.tool_calls {
                        self.console.print_tool_action(&call.name, &call.action);
                    }
                }
                self.console.print_assistant(&result.output);
                self.history.extend_turn(result.new_messages.clone());
                Some(result)
            }
            Err(e) => {
                tracing::error!("[Repl] Error during agent run: {:#}", e);
                self.console.println();
                self.console
                    .print_error(&format!("An error occurred: Error during agent run: {:#}", e));
                self.console.print_plain(RETRY_HINT);

                if let Some(followup) = &self.options.error_followup {
                    if let Err(e) = self.backend.respond(followup, &self.history).await {
                        tracing::warn!("[Repl] Error follow-up failed: {:#}", e);
                    }
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::input::ScriptedInput;
    use crate::llm::Message;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes prompts back and records the history it was given
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<(String, Vec<Message>)>>,
        fail_on: Option<String>,
    }

    impl RecordingBackend {
        fn failing_on(prompt: &str) -> Self {
            Self {
                fail_on: Some(prompt.to_string()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, Vec<Message>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for RecordingBackend {
        async fn respond(&self, prompt: &str, history: &History) -> Result<RunResult> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), history.messages().to_vec()));

            if self.fail_on.as_deref() == Some(prompt) {
                return Err(anyhow::anyhow!("upstream exploded"));
            }

            let reply = format!("echo: {}", prompt);
            Ok(RunResult {
                output: reply.clone(),
                new_messages: vec![Message::user(prompt), Message::assistant(reply)],
                tool_calls: Vec::new(),
            })
        }
    }

    struct Shout;

    impl TurnPlanner for Shout {
        fn plan(&self, input: &str) -> String {
            input.to_uppercase()
        }
    }

    fn repl(backend: Arc<RecordingBackend>, options: ReplOptions) -> Repl {
        Repl::new(backend, options)
    }

    #[test]
    fn test_parse_sentinels() {
        let logout = vec!["logout".to_string(), "disconnect".to_string()];
        assert_eq!(SessionCommand::parse("exit", &[]), SessionCommand::Exit);
        assert_eq!(SessionCommand::parse("  QUIT \n", &[]), SessionCommand::Exit);
        assert_eq!(SessionCommand::parse("Bye", &[]), SessionCommand::Exit);
        assert_eq!(SessionCommand::parse("Logout", &logout), SessionCommand::Logout);
        assert_eq!(
            SessionCommand::parse("logout", &[]),
            SessionCommand::Message("logout".into())
        );
        assert_eq!(SessionCommand::parse("   ", &[]), SessionCommand::Empty);
        assert_eq!(
            SessionCommand::parse("exit the building", &[]),
            SessionCommand::Message("exit the building".into())
        );
    }

    #[tokio::test]
    async fn test_stops_exactly_at_exit_word() {
        let backend = Arc::new(RecordingBackend::default());
        let mut repl = repl(backend.clone(), ReplOptions::new("Test"));
        let mut input = ScriptedInput::new(["one", "", "EXIT", "never sent"]);

        let reason = repl.run(&mut input).await.unwrap();

        assert_eq!(reason, ExitReason::Requested);
        assert_eq!(input.remaining(), 1);
        let prompts: Vec<String> = backend.calls().into_iter().map(|(p, _)| p).collect();
        assert_eq!(prompts, vec!["one"]);
    }

    #[tokio::test]
    async fn test_end_of_input_terminates() {
        let backend = Arc::new(RecordingBackend::default());
        let mut repl = repl(backend.clone(), ReplOptions::new("Test"));
        let mut input = ScriptedInput::new(["hello"]);

        assert_eq!(repl.run(&mut input).await.unwrap(), ExitReason::EndOfInput);
        assert_eq!(repl.history().len(), 2);
    }

    #[tokio::test]
    async fn test_history_grows_by_each_turn() {
        let backend = Arc::new(RecordingBackend::default());
        let options = ReplOptions::new("Test").with_initial_prompt("hello!");
        let mut repl = repl(backend.clone(), options);
        let mut input = ScriptedInput::new(["first", "second", "bye"]);

        repl.run(&mut input).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        for window in calls.windows(2) {
            let (prev_prompt, prev_history) = &window[0];
            let (_, next_history) = &window[1];
            let mut expected = prev_history.clone();
            expected.push(Message::user(prev_prompt.as_str()));
            expected.push(Message::assistant(format!("echo: {}", prev_prompt)));
            assert_eq!(next_history, &expected);
        }
        assert_eq!(repl.history().turn_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_unchanged() {
        let backend = Arc::new(RecordingBackend::failing_on("boom"));
        let options = ReplOptions::new("Test").with_error_followup("Please close the browser using browser_close");
        let mut repl = repl(backend.clone(), options);
        let mut input = ScriptedInput::new(["ok", "boom", "after", "quit"]);

        assert_eq!(repl.run(&mut input).await.unwrap(), ExitReason::Requested);

        let calls = backend.calls();
        let prompts: Vec<&str> = calls.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            prompts,
            vec!["ok", "boom", "Please close the browser using browser_close", "after"]
        );
        // "after" sees only the successful first turn
        assert_eq!(calls[3].1.len(), 2);
        assert_eq!(repl.history().len(), 4);
    }

    #[tokio::test]
    async fn test_logout_word_ends_loop() {
        let backend = Arc::new(RecordingBackend::default());
        let options = ReplOptions::new("Gmail").with_logout_words(["logout", "disconnect"]);
        let mut repl = repl(backend.clone(), options);
        let mut input = ScriptedInput::new(["Disconnect"]);

        assert_eq!(repl.run(&mut input).await.unwrap(), ExitReason::Logout);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_planner_rewrites_outgoing_prompt() {
        let backend = Arc::new(RecordingBackend::default());
        let mut repl = repl(backend.clone(), ReplOptions::new("Test")).with_planner(Arc::new(Shout));
        let mut input = ScriptedInput::new(["quiet please", "exit"]);

        repl.run(&mut input).await.unwrap();

        assert_eq!(backend.calls()[0].0, "QUIET PLEASE");
        assert_eq!(repl.history().messages()[0].text(), "QUIET PLEASE");
    }
}
