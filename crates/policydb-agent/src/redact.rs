use regex::Regex;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[\w.-]+@[\w.-]+\.\w+\b").expect("valid email pattern"));
static LONG_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{10,12}\b").expect("valid number pattern"));

/// Mask e-mail addresses and 10-12 digit numbers (phone, record ids).
pub fn redact_pii(text: &str) -> String {
    let masked = EMAIL.replace_all(text, "[REDACTED_EMAIL]");
    LONG_NUMBER.replace_all(&masked, "[REDACTED_NUMBER]").into_owned()
}
