use once_cell::sync::Lazy;
use regex::Regex;

/// Longest diagnostic shown to users.
pub const MAX_DIAGNOSTIC_CHARS: usize = 200;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(sk-[A-Za-z0-9_\-]{8,}|gsk_[A-Za-z0-9]{8,}|xox[abposr]-[A-Za-z0-9\-]{8,}|Bearer\s+\S+)")
        .expect("static regex compile")
});

/// Strips known secrets and token-shaped strings from `message` and caps its length.
#[must_use]
pub fn redact_diagnostic(message: &str, secrets: &[&str]) -> String {
    let mut cleaned = message.to_string();
    for secret in secrets.iter().filter(|s| s.len() >= 4) {
        cleaned = cleaned.replace(secret, "[redacted]");
    }
    let cleaned = TOKEN_RE.replace_all(&cleaned, "[redacted]");
    let single_line = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if single_line.chars().count() <= MAX_DIAGNOSTIC_CHARS {
        single_line
    } else {
        let mut capped: String = single_line.chars().take(MAX_DIAGNOSTIC_CHARS - 1).collect();
        capped.push('…');
        capped
    }
}
