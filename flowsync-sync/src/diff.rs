//! Unified diff rendering for `flowsync diff`.

use similar::TextDiff;

/// Line diff of `old` against `new` with three lines of context.
///
/// Returns an empty string when the inputs are identical. Line endings are
/// normalized first so a CRLF checkout does not diff against the server.
pub fn unified(old: &str, new: &str, old_header: &str, new_header: &str) -> String {
    let old = normalize_line_endings(old);
    let new = normalize_line_endings(new);
    if old == new {
        return String::new();
    }

    TextDiff::from_lines(&old, &new)
        .unified_diff()
        .header(old_header, new_header)
        .context_radius(3)
        .to_string()
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
