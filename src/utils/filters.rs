use crate::core::models::HistoryMessage;

/// True for ordinary conversation messages. Anything carrying a subtype
/// (joins, leaves, edits, bot notices) is platform noise.
#[must_use]
pub fn is_conversation_message(msg: &HistoryMessage) -> bool {
    msg.subtype.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// Filters a list of history messages down to conversation messages.
#[must_use]
pub fn filter_conversation_messages(messages: Vec<HistoryMessage>) -> Vec<HistoryMessage> {
    messages
        .into_iter()
        .filter(is_conversation_message)
        .collect()
}

/// Drops messages posted before `oldest` (unix seconds). Unparseable
/// timestamps are kept.
#[must_use]
pub fn within_window(messages: Vec<HistoryMessage>, oldest: i64) -> Vec<HistoryMessage> {
    messages
        .into_iter()
        .filter(|m| {
            m.ts.split('.')
                .next()
                .and_then(|secs| secs.parse::<i64>().ok())
                .is_none_or(|secs| secs >= oldest)
        })
        .collect()
}
