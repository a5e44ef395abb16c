//! Append-only, insertion-ordered transcript.

use crate::core::message::{Message, MessageId, TranscriptRole};

#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with an assistant greeting, unless it is blank.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut conversation = Self::new();
        if !greeting.trim().is_empty() {
            conversation.push(TranscriptRole::Assistant, greeting);
        }
        conversation
    }

    pub fn push(&mut self, role: TranscriptRole, content: impl Into<String>) -> MessageId {
        let id = MessageId::from_raw(self.next_id);
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            content: content.into(),
        });
        id
    }

    /// Append text to the message with `id`. Returns false when no such
    /// message exists or it is not an assistant message.
    pub fn append_to(&mut self, id: MessageId, text: &str) -> bool {
        match self.messages.iter_mut().find(|msg| msg.id == id) {
            Some(msg) if msg.is_assistant() => {
                msg.content.push_str(text);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|msg| msg.id == id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}
