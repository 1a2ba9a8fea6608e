//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

/// Query parameter names that must never reach logs
const SECRET_PARAMS: &[&str] = &["key", "access_token"];

/// Render query parameters for logging with credentials masked
pub fn redact_params(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(name, value)| {
            if SECRET_PARAMS.contains(name) {
                format!("{name}=REDACTED")
            } else {
                format!("{name}={value}")
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Format an integer with thousands separators (e.g. `1234567` -> `1,234,567`)
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
