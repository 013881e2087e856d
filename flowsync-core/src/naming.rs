//! Workflow name → file identity normalization.

use crate::types::Identity;

/// Map a display name to its kebab-case identity.
///
/// Parentheses are dropped, runs of whitespace, underscores and hyphens
/// become a single `-`, letters are lowercased and anything outside
/// `[a-z0-9-]` is removed. The result never starts, ends or doubles a hyphen,
/// so the function is idempotent. It is not injective.
///
/// ```
/// use flowsync_core::naming::normalize;
///
/// assert_eq!(normalize("(ai) gmail - triage of labels").as_str(), "ai-gmail-triage-of-labels");
/// ```
pub fn normalize(name: &str) -> Identity {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.chars() {
        if ch == '(' || ch == ')' {
            continue;
        }
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_separator = true;
            continue;
        }
        for lower in ch.to_lowercase() {
            if !(lower.is_ascii_lowercase() || lower.is_ascii_digit()) {
                continue;
            }
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(lower);
        }
    }

    Identity(out)
}
