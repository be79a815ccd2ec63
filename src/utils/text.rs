//! Text helpers for `name = value` configuration lines
//! Author: kartik4091
//!
//! Everything here is pure string munging: trimming, quote handling,
//! quoting-aware comment stripping and splitting a line into a setting.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SETTING_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").unwrap();
}

/// A line that looks like a setting assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingLine {
    /// Lowercased setting name.
    pub name: String,
    /// Raw value with trailing comment and surrounding whitespace removed.
    pub value: String,
    /// Whether the line started with a `#`.
    pub commented: bool,
}

/// Strips surrounding whitespace and one layer of matching quotes.
pub fn trim_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim();
        }
    }
    trimmed
}

/// Normalized form of a value used for equality checks.
///
/// Surrounding quotes are removed and the escapes a quoted string may carry
/// (`''` and `\'` inside single quotes) are resolved.
pub fn normalize_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        let inner = &trimmed[1..trimmed.len() - 1];
        return inner.replace("''", "'").replace("\\'", "'").trim().to_string();
    }
    trim_quotes(trimmed).to_string()
}

/// Whether two values are the same once whitespace and quoting are ignored.
pub fn values_match(left: &str, right: &str) -> bool {
    normalize_value(left) == normalize_value(right)
}

/// Checks that `name` is usable as a configuration parameter name.
pub fn is_valid_setting_name(name: &str) -> bool {
    SETTING_NAME.is_match(name)
}

/// Removes a trailing `#` comment, ignoring `#` inside quoted strings.
///
/// A backslash escapes the next character inside a quoted string and a
/// doubled quote (`''`) simply closes and reopens it. When a quote is never
/// terminated the remainder of the line is kept as-is.
pub fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in line.char_indices() {
        match quote {
            Some(open) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == open {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '#' => return line[..idx].trim_end(),
                _ => {}
            },
        }
    }

    line.trim_end()
}

/// Parses a raw line into a setting assignment.
///
/// Returns `None` for blank lines, lines without `=`, and lines whose left
/// hand side is not a plausible parameter name (commented prose).
pub fn parse_setting_line(raw: &str) -> Option<SettingLine> {
    let line = raw.trim_end_matches(['\r', '\n']).trim_start();

    let (body, commented) = match line.strip_prefix('#') {
        Some(rest) => (rest.trim_start_matches('#').trim_start(), true),
        None => (line, false),
    };

    let body = strip_comment(body);
    let (name, value) = body.split_once('=')?;
    let name = name.trim();

    if !is_valid_setting_name(name) {
        return None;
    }

    Some(SettingLine {
        name: name.to_lowercase(),
        value: value.trim().to_string(),
        commented,
    })
}

/// Whether the first non-space character of the line is a comment marker.
pub fn is_comment_line(raw: &str) -> bool {
    raw.trim_start().starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_quotes() {
        assert_eq!(trim_quotes("  'abc'  "), "abc");
        assert_eq!(trim_quotes("\"x y\""), "x y");
        assert_eq!(trim_quotes("'unbalanced"), "'unbalanced");
        assert_eq!(trim_quotes(" 128MB "), "128MB");
        assert_eq!(trim_quotes("'"), "'");
    }

    #[test]
    fn test_normalize_value_unescapes() {
        assert_eq!(normalize_value("'it''s'"), "it's");
        assert_eq!(normalize_value(r"'it\'s'"), "it's");
        assert_eq!(normalize_value(" \"$user\", public "), "\"$user\", public");
        assert_eq!(normalize_value("\"x\""), "x");
    }

    #[test]
    fn test_values_match_ignores_quotes() {
        assert!(values_match("'4MB'", "4MB"));
        assert!(values_match(" on", "on "));
        assert!(!values_match("4MB", "8MB"));
    }

    #[test]
    fn test_strip_comment_plain() {
        assert_eq!(strip_comment("work_mem = 4MB   # min 64kB"), "work_mem = 4MB");
        assert_eq!(strip_comment("work_mem = 4MB"), "work_mem = 4MB");
    }

    #[test]
    fn test_strip_comment_hash_inside_quotes() {
        assert_eq!(
            strip_comment("log_line_prefix = '%m # %p '  # prefix"),
            "log_line_prefix = '%m # %p '"
        );
        assert_eq!(
            strip_comment("application_name = \"a#b\" # app"),
            "application_name = \"a#b\""
        );
    }

    #[test]
    fn test_strip_comment_unterminated_quote() {
        assert_eq!(
            strip_comment("search_path = '\"$user # public"),
            "search_path = '\"$user # public"
        );
    }

    #[test]
    fn test_strip_comment_escaped_quotes() {
        assert_eq!(
            strip_comment(r"archive_command = 'echo \'#\' %p' # cmd"),
            r"archive_command = 'echo \'#\' %p'"
        );
        assert_eq!(
            strip_comment("archive_command = 'it''s # fine' # cmd"),
            "archive_command = 'it''s # fine'"
        );
    }

    #[test]
    fn test_parse_active_line() {
        let parsed = parse_setting_line("Shared_Buffers = 256MB # comment\r\n").unwrap();
        assert_eq!(parsed.name, "shared_buffers");
        assert_eq!(parsed.value, "256MB");
        assert!(!parsed.commented);
    }

    #[test]
    fn test_parse_commented_line() {
        let parsed = parse_setting_line("#shared_buffers = 128MB\t\t# min 128kB").unwrap();
        assert_eq!(parsed.name, "shared_buffers");
        assert_eq!(parsed.value, "128MB");
        assert!(parsed.commented);
    }

    #[test]
    fn test_parse_rejects_non_settings() {
        assert!(parse_setting_line("# - Memory -").is_none());
        assert!(parse_setting_line("").is_none());
        assert!(parse_setting_line("# e.g. see the docs = somewhere").is_none());
        assert!(parse_setting_line("#------------------").is_none());
    }

    #[test]
    fn test_parse_value_with_equals() {
        let parsed = parse_setting_line("primary_conninfo = 'host=db port=5432'").unwrap();
        assert_eq!(parsed.value, "'host=db port=5432'");
    }

    #[test]
    fn test_is_comment_line() {
        assert!(is_comment_line("   # hi"));
        assert!(!is_comment_line("port = 5432"));
    }
}
