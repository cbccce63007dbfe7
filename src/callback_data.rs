//! Compact `command:payload` strings carried by inline keyboard buttons.
//!
//! The payload is not escaped, so it must not contain the separator.
//! Anything other than exactly one separator between two non-empty parts
//! is rejected instead of guessing which colon was meant.

use crate::errors::MalformedCallbackData;

pub const CALLBACK_DATA_SEPARATOR: char = ':';

/// Decoded callback query data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackQueryData<'a> {
    pub command: &'a str,
    pub payload: &'a str,
}

/// Join a command and its payload into button callback data.
///
/// Fails on anything [`decode`] would reject, so a button the bot sends
/// always routes back to its command.
pub fn encode(
    command: &str,
    payload: impl std::fmt::Display,
) -> Result<String, MalformedCallbackData> {
    let payload = payload.to_string();
    let data = format!("{command}{CALLBACK_DATA_SEPARATOR}{payload}");
    if command.is_empty()
        || payload.is_empty()
        || command.contains(CALLBACK_DATA_SEPARATOR)
        || payload.contains(CALLBACK_DATA_SEPARATOR)
    {
        return Err(MalformedCallbackData { data });
    }
    Ok(data)
}

/// Split callback data into its command and payload
pub fn decode(raw: &str) -> Result<CallbackQueryData<'_>, MalformedCallbackData> {
    let mut pieces = raw.split(CALLBACK_DATA_SEPARATOR);
    match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(command), Some(payload), None) if !command.is_empty() && !payload.is_empty() => {
            Ok(CallbackQueryData { command, payload })
        }
        _ => Err(MalformedCallbackData {
            data: raw.to_string(),
        }),
    }
}
