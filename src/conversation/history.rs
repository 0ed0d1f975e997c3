use uuid::Uuid;

use crate::llm::{Message, Role};

/// In-memory conversation history for one REPL session
///
/// Messages are kept in the order they were produced and live only as long
/// as the process. Nothing is written to disk.
#[derive(Debug, Clone)]
pub struct History {
    id: String,
    messages: Vec<Message>,
}

impl History {
    /// Start an empty history
    pub fn new() -> Self {
        let id = Uuid::new_v4().to_string();
        tracing::debug!("Starting conversation {}", id);
        Self {
            id,
            messages: Vec::new(),
        }
    }

    /// Conversation ID (used to correlate log lines)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append one message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append every message produced by a turn, keeping their order
    pub fn extend_turn(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// Full history
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of turns (user prompts that are not tool results)
    pub fn turn_count(&self) -> usize {
        self.messages.iter().filter(|m| is_turn_start(m)).count()
    }

    /// The last `turns` conversation turns
    ///
    /// A turn starts at a user prompt (tool-result messages belong to the
    /// turn that requested them), so the window never begins in the middle
    /// of a tool exchange.
    pub fn window(&self, turns: usize) -> Vec<Message> {
        if turns == 0 {
            return Vec::new();
        }

        let starts: Vec<usize> = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| is_turn_start(m))
            .map(|(i, _)| i)
            .collect();

        let from = if starts.len() > turns {
            starts[starts.len() - turns]
        } else {
            starts.first().copied().unwrap_or(0)
        };

        self.messages[from..].to_vec()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

fn is_turn_start(message: &Message) -> bool {
    message.role == Role::User && !message.is_tool_result()
}
