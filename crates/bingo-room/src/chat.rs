//! Chat moderation: per-sender cooldown, length cap, term masking, and a
//! bounded transcript that can be purged by sender.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use bingo_protocol::{ChatMessage, ClientId};
use tokio::time::Instant;

use crate::{RoomConfig, RoomError};

/// Moderation state for one room's chat.
#[derive(Debug)]
pub struct ChatModerator {
    cooldown: Duration,
    max_len: usize,
    capacity: usize,
    /// Blocked terms, lowercased, as chars.
    terms: Vec<Vec<char>>,
    last_sent: HashMap<ClientId, Instant>,
    history: VecDeque<ChatMessage>,
}

impl ChatModerator {
    pub fn new(config: &RoomConfig) -> Self {
        let terms = config
            .blocked_terms
            .iter()
            .map(|t| fold(t.trim()))
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            cooldown: config.chat_cooldown,
            max_len: config.chat_max_len,
            capacity: config.chat_history_cap,
            terms,
            last_sent: HashMap::new(),
            history: VecDeque::with_capacity(config.chat_history_cap),
        }
    }

    /// Fails if `sender` posted less than one cooldown ago.
    ///
    /// A rejected attempt does not restart the cooldown.
    pub fn check_rate(&self, sender: &ClientId, now: Instant) -> Result<(), RoomError> {
        if let Some(last) = self.last_sent.get(sender) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < self.cooldown {
                return Err(RoomError::RateLimited {
                    retry_in: self.cooldown - elapsed,
                });
            }
        }
        Ok(())
    }

    /// Trims, caps, and masks raw chat text.
    pub fn clean(&self, raw: &str) -> Result<String, RoomError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RoomError::InvalidState("message is empty".into()));
        }
        let capped: String = trimmed.chars().take(self.max_len).collect();
        Ok(self.mask(&capped))
    }

    /// Replaces every blocked term with `*`, one per character, ignoring case.
    pub fn mask(&self, text: &str) -> String {
        let original: Vec<char> = text.chars().collect();
        let folded = fold(text);
        let mut hidden = vec![false; original.len()];

        for term in &self.terms {
            if term.len() > folded.len() {
                continue;
            }
            for start in 0..=folded.len() - term.len() {
                if folded[start..start + term.len()] == term[..] {
                    hidden[start..start + term.len()].fill(true);
                }
            }
        }

        original
            .into_iter()
            .zip(hidden)
            .map(|(c, h)| if h { '*' } else { c })
            .collect()
    }

    /// Appends a message, evicting the oldest past capacity.
    ///
    /// Starts the sender's cooldown when the message has one.
    pub fn post(&mut self, message: ChatMessage, now: Instant) {
        if let Some(sender) = &message.client_id {
            self.last_sent.insert(sender.clone(), now);
        }
        self.history.push_back(message);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }

    /// Removes every line sent by `sender`. Returns how many were removed.
    pub fn purge(&mut self, sender: &ClientId) -> usize {
        let before = self.history.len();
        self.history
            .retain(|m| m.client_id.as_ref() != Some(sender));
        self.last_sent.remove(sender);
        before - self.history.len()
    }

    /// The transcript, oldest first.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Lowercases one char to one char so indices line up with the input.
fn fold(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}
