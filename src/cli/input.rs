//! Line input for the REPL

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Source of user lines
#[async_trait]
pub trait InputSource: Send {
    /// Next line without its trailing newline, or `None` at end of input
    async fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Reads stdin on a dedicated thread and hands lines over a channel
///
/// The reader is a plain OS thread rather than a blocking-pool task, so a
/// read still parked on the terminal never holds up runtime shutdown.
#[derive(Debug)]
pub struct StdinInput {
    lines: mpsc::Receiver<io::Result<String>>,
}

impl StdinInput {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }

    fn from_reader<R: BufRead + Send + 'static>(mut reader: R) -> Self {
        let (tx, lines) = mpsc::channel(1);
        let spawned = std::thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.blocking_send(Ok(line)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.blocking_send(Err(e));
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            tracing::error!("[Input] Could not start stdin reader: {}", e);
        }
        Self { lines }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputSource for StdinInput {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        match self.lines.recv().await {
            Some(line) => Ok(Some(line?.trim_end_matches(['\r', '\n']).to_string())),
            None => Ok(None),
        }
    }
}

/// Fixed list of lines, for tests and scripted sessions
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Lines not consumed yet
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}
