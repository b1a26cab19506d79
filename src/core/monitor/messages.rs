//! Status messages raised by the sampler and drained by the screen.

use serde::{Deserialize, Serialize};

/// Longest message text kept, in characters.
pub const MESSAGE_WIDTH: usize = 63;

const INITIAL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Min = 1,
    Med = 2,
    Max = 3,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub priority: Priority,
    pub text: String,
}

/// Append-only queue, emptied once per render cycle.
#[derive(Debug, Clone)]
pub struct MessageQueue {
    entries: Vec<Message>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Queue a message. The text is cut to [`MESSAGE_WIDTH`] characters and
    /// mirrored to the log.
    pub fn push<S: AsRef<str>>(&mut self, priority: Priority, text: S) {
        let text = truncate_chars(text.as_ref(), MESSAGE_WIDTH);
        match priority {
            Priority::Max => log::warn!("{}", text),
            Priority::Med => log::info!("{}", text),
            Priority::Min => log::debug!("{}", text),
        }
        self.entries.push(Message { priority, text });
    }

    /// First message of the highest priority currently queued.
    pub fn most_important(&self) -> Option<&Message> {
        let mut best: Option<&Message> = None;
        for message in &self.entries {
            match best {
                Some(current) if message.priority <= current.priority => {}
                _ => best = Some(message),
            }
        }
        best
    }

    pub fn drain(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep at most `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
