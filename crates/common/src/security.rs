//! Secret redaction for text leaving the process.
//!
//! Ticket descriptions are derived from free-form user input and stored in an
//! external system, so anything that looks like a credential is masked first.

use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement character for every non-whitespace character of a secret.
pub const MASK_CHAR: char = '•';

static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(password|pass|secret|api[_\- ]?key|token)\s*[:=]\s*[^\s,;]+",
        r"(?i)bearer\s+[a-z0-9._-]+",
        r"(?i)ssh-rsa\s+[a-z0-9+/=]+",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Mask credentials, bearer tokens and SSH keys in `text`.
///
/// Whitespace inside a match is preserved so the shape of the sentence
/// survives; every other character becomes [`MASK_CHAR`].
pub fn redact_secrets(text: &str) -> String {
    let mut redacted = text.to_string();
    for pattern in SECRET_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &regex::Captures<'_>| mask(&caps[0]))
            .into_owned();
    }
    redacted
}

fn mask(secret: &str) -> String {
    secret
        .chars()
        .map(|c| if c.is_whitespace() { c } else { MASK_CHAR })
        .collect()
}
