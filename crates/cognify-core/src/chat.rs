//! Conversation state for the study chat
//!
//! One exchange at a time: `Idle -> Sending -> Streaming -> Idle`. The
//! assistant entry is created empty when the user sends and grows in place
//! as fragments arrive.

use serde::Serialize;
use tracing::{info, warn};

use crate::registry::ContentId;
use crate::state::{ChatMessage, ChatRole};

pub const CHAT_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Sending,
    Streaming,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub content_ids: Vec<ContentId>,
    pub message: String,
    pub history: Vec<ChatMessage>,
}

/// A started exchange: the sequence number to tag events with, and what to send
#[derive(Debug, Clone)]
pub struct Exchange {
    pub seq: u64,
    pub request: ChatRequest,
}

#[derive(Debug)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    state: ExchangeState,
    seq: u64,
    // index of the assistant entry being streamed into
    pending: Option<usize>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            state: ExchangeState::Idle,
            seq: 0,
            pending: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state != ExchangeState::Idle
    }

    /// Index of the assistant entry still being written, if any
    pub fn pending_index(&self) -> Option<usize> {
        self.pending
    }

    /// Current exchange's sequence number
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Start an exchange. `None` for blank input or while another is in flight.
    pub fn begin(&mut self, input: &str, content_ids: &[ContentId]) -> Option<Exchange> {
        if input.trim().is_empty() || self.is_busy() {
            return None;
        }

        let history: Vec<ChatMessage> = self
            .messages
            .iter()
            .filter(|m| !(m.role == ChatRole::Assistant && m.content.is_empty()))
            .cloned()
            .collect();

        self.messages.push(ChatMessage::user(input));
        self.messages.push(ChatMessage::assistant(""));
        self.pending = Some(self.messages.len() - 1);
        self.state = ExchangeState::Sending;
        self.seq += 1;

        info!(seq = self.seq, history = history.len(), "Chat exchange started");

        Some(Exchange {
            seq: self.seq,
            request: ChatRequest {
                content_ids: content_ids.to_vec(),
                message: input.to_string(),
                history,
            },
        })
    }

    /// The response opened successfully and its body is being read
    pub fn stream_opened(&mut self, seq: u64) {
        if self.is_current(seq) && self.state == ExchangeState::Sending {
            self.state = ExchangeState::Streaming;
        }
    }

    /// Append a decoded fragment to the in-flight assistant entry
    pub fn append_fragment(&mut self, seq: u64, fragment: &str) -> bool {
        if !self.is_current(seq) {
            return false;
        }
        match self.pending.and_then(|i| self.messages.get_mut(i)) {
            Some(entry) => {
                entry.content.push_str(fragment);
                self.state = ExchangeState::Streaming;
                true
            }
            None => false,
        }
    }

    /// Stream ended normally; the assistant entry is now final
    pub fn finish(&mut self, seq: u64) {
        if !self.is_current(seq) {
            return;
        }
        self.pending = None;
        self.state = ExchangeState::Idle;
        info!(seq, "Chat exchange finished");
    }

    /// Opening or reading failed. Partial text is kept; an empty placeholder
    /// is replaced by the apology, a partial one gets the apology after it.
    pub fn fail(&mut self, seq: u64) {
        if !self.is_current(seq) {
            return;
        }
        warn!(seq, "Chat exchange failed");

        let empty_slot = self
            .pending
            .take()
            .filter(|&i| self.messages.get(i).is_some_and(|m| m.content.is_empty()));
        match empty_slot {
            Some(i) => self.messages[i].content = CHAT_ERROR_MESSAGE.to_string(),
            None => self.messages.push(ChatMessage::assistant(CHAT_ERROR_MESSAGE)),
        }
        self.state = ExchangeState::Idle;
    }

    fn is_current(&self, seq: u64) -> bool {
        seq == self.seq && self.is_busy()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
