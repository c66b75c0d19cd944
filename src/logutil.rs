//! Log sanitization for user-supplied strings.
//!
//! Guild names and other user text can contain newlines or control
//! characters that would split or garble a log line. Everything logged from
//! untrusted input goes through [`escape_log`] first.

/// Longest preview of a user string that a log line carries. Guild names
/// are short; anything longer is truncated with an ellipsis.
const MAX_PREVIEW: usize = 120;

/// Render a user-supplied string as a single printable log token.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    let mut shown = 0usize;
    for ch in s.chars() {
        if shown == MAX_PREVIEW {
            out.push('…');
            break;
        }
        push_escaped(&mut out, ch);
        shown += 1;
    }
    out
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c.is_control() => {
            use std::fmt::Write;
            let _ = write!(out, "\\x{:02X}", c as u32);
        }
        c => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::escape_log;

    #[test]
    fn escapes_newlines_and_tabs() {
        assert_eq!(escape_log("The\nVolts\tGuild"), "The\\nVolts\\tGuild");
    }

    #[test]
    fn escapes_other_control_chars_as_hex() {
        assert_eq!(escape_log("a\u{1}b"), "a\\x01b");
    }

    #[test]
    fn truncates_long_names() {
        let long = "g".repeat(500);
        let esc = escape_log(&long);
        assert!(esc.ends_with('…'));
        assert!(esc.chars().count() <= 121);
    }
}
