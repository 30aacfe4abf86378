#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::api::types::ChatMessage;

/// Sender value the backend uses for the signed-in doctor.
pub const DOCTOR_SENDER: &str = "doctor";

/// Chat history for one appointment, oldest first.
#[derive(Clone, Debug, Default)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
}

impl ChatState {
    /// Order by timestamp. Messages whose timestamp is missing or not
    /// RFC 3339 go last, keeping their relative order.
    #[must_use]
    pub fn from_history(mut messages: Vec<ChatMessage>) -> Self {
        messages.sort_by_key(|m| match parse_timestamp(m) {
            Some(at) => (false, Some(at)),
            None => (true, None),
        });
        Self { messages }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }
}

#[must_use]
pub fn is_from_doctor(message: &ChatMessage) -> bool {
    message.sender == DOCTOR_SENDER
}

fn parse_timestamp(message: &ChatMessage) -> Option<OffsetDateTime> {
    message.timestamp.as_deref().and_then(|ts| OffsetDateTime::parse(ts, &Rfc3339).ok())
}
