/// Instruction placed in front of the conversation text. The model is the
/// only reader of this string; keep it byte-stable.
pub const SUMMARY_INSTRUCTION: &str = "Summarize the Slack discussion below in 120 words or fewer, \
then list **Action Items** as bullets.\n\n";

/// Maximum number of conversation characters sent to the provider.
pub const MAX_INPUT_CHARS: usize = 4_000;

/// Maximum number of characters of a summary shown to users.
pub const MAX_SUMMARY_CHARS: usize = 3_000;

/// Shown when the provider answers with no content.
pub const EMPTY_COMPLETION: &str = "(empty)";

/// Keeps the most recent `MAX_INPUT_CHARS` characters of a chronological transcript.
#[must_use]
pub fn truncate_input(text: &str) -> &str {
    let total = text.chars().count();
    if total <= MAX_INPUT_CHARS {
        return text;
    }
    let skip = total - MAX_INPUT_CHARS;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

/// The full prompt for one conversation.
#[must_use]
pub fn build_prompt(text: &str) -> String {
    format!("{SUMMARY_INSTRUCTION}{}", truncate_input(text))
}

/// Trims a completion and caps it at `MAX_SUMMARY_CHARS`.
#[must_use]
pub fn finalize_summary(raw: Option<&str>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return EMPTY_COMPLETION.to_string();
    }
    if trimmed.chars().count() <= MAX_SUMMARY_CHARS {
        return trimmed.to_string();
    }
    let mut capped: String = trimmed.chars().take(MAX_SUMMARY_CHARS - 1).collect();
    capped.push('…');
    capped
}
