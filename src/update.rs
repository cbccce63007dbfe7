//! Platform-neutral inbound updates.
//!
//! The transport converts Telegram updates into these types, so routing and
//! handlers never depend on the wire representation.

/// Conversation (chat) identifier
pub type ChatId = i64;
/// Sending user identifier
pub type UserId = i64;

/// One inbound event: a message or a callback query, never both
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Message(Message),
    CallbackQuery(CallbackQuery),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chat {
    pub id: ChatId,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    pub id: UserId,
    pub first_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    BotCommand,
    Other,
}

/// A span of the message text, measured in UTF-16 code units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i32,
    pub chat: Chat,
    pub from: Option<Sender>,
    pub text: String,
    pub entities: Vec<MessageEntity>,
}

/// A user's interaction with an inline keyboard attached to a bot message
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Sender,
    pub message: Message,
    pub data: String,
}

impl Message {
    /// Build a plain text message
    pub fn plain(id: i32, chat: Chat, from: Option<Sender>, text: impl Into<String>) -> Self {
        Self {
            id,
            chat,
            from,
            text: text.into(),
            entities: Vec::new(),
        }
    }

    /// Build a message starting with a bot command entity, e.g. `/add milk`
    pub fn with_command(id: i32, chat: Chat, from: Option<Sender>, text: impl Into<String>) -> Self {
        let text = text.into();
        let length = text
            .split_whitespace()
            .next()
            .map(|token| token.encode_utf16().count())
            .unwrap_or(0);
        Self {
            id,
            chat,
            from,
            text,
            entities: vec![MessageEntity {
                kind: EntityKind::BotCommand,
                offset: 0,
                length,
            }],
        }
    }

    /// Byte index in `text` where the leading command entity ends
    fn command_end(&self) -> Option<usize> {
        let entity = self.entities.first()?;
        if entity.kind != EntityKind::BotCommand || entity.offset != 0 {
            return None;
        }
        utf16_to_byte_index(&self.text, entity.length)
    }

    /// The command token without the leading `/` and any `@botname` suffix
    pub fn bot_command(&self) -> Option<&str> {
        let end = self.command_end()?;
        let token = self.text.get(..end)?.strip_prefix('/')?;
        token.split('@').next()
    }

    /// Text following the command token, trimmed
    pub fn command_arguments(&self) -> &str {
        match self.command_end() {
            Some(end) => self.text.get(end..).unwrap_or("").trim(),
            None => "",
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.from.as_ref().map(|sender| sender.id)
    }
}

fn utf16_to_byte_index(text: &str, utf16_len: usize) -> Option<usize> {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        if units == utf16_len {
            return Some(index);
        }
        units += ch.len_utf16();
        if units > utf16_len {
            return None;
        }
    }
    (units == utf16_len).then_some(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat() -> Chat {
        Chat {
            id: 100,
            is_private: true,
        }
    }

    #[test]
    fn test_bot_command_extraction() {
        let msg = Message::with_command(1, chat(), None, "/add milk and eggs");
        assert_eq!(msg.bot_command(), Some("add"));
        assert_eq!(msg.command_arguments(), "milk and eggs");
    }

    #[test]
    fn test_bot_command_without_arguments() {
        let msg = Message::with_command(1, chat(), None, "/list");
        assert_eq!(msg.bot_command(), Some("list"));
        assert_eq!(msg.command_arguments(), "");
    }

    #[test]
    fn test_bot_command_strips_bot_name() {
        let msg = Message::with_command(1, chat(), None, "/add@shipster_bot bread");
        assert_eq!(msg.bot_command(), Some("add"));
        assert_eq!(msg.command_arguments(), "bread");
    }

    #[test]
    fn test_plain_text_has_no_command() {
        let msg = Message::plain(1, chat(), None, "/add milk");
        assert_eq!(msg.bot_command(), None);
        assert_eq!(msg.command_arguments(), "");
    }

    #[test]
    fn test_non_command_entity_is_ignored() {
        let mut msg = Message::plain(1, chat(), None, "@someone milk");
        msg.entities.push(MessageEntity {
            kind: EntityKind::Other,
            offset: 0,
            length: 8,
        });
        assert_eq!(msg.bot_command(), None);
    }

    #[test]
    fn test_command_arguments_after_utf16_entity() {
        let mut msg = Message::plain(1, chat(), None, "/add🥛 milk");
        msg.entities.push(MessageEntity {
            kind: EntityKind::BotCommand,
            offset: 0,
            length: 4,
        });
        assert_eq!(msg.bot_command(), Some("add"));
        assert_eq!(msg.command_arguments(), "🥛 milk");
    }

    #[test]
    fn test_entity_splitting_a_surrogate_pair_is_rejected() {
        let mut msg = Message::plain(1, chat(), None, "/🥛");
        msg.entities.push(MessageEntity {
            kind: EntityKind::BotCommand,
            offset: 0,
            length: 2,
        });
        assert_eq!(msg.bot_command(), None);
    }
}
