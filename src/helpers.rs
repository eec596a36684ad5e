//! Shared helpers for mapping locations to search-history file names.
//!
//! History files are named after the searched location with spaces turned
//! into underscores (`"Tel Aviv"` → `Tel_Aviv.json`). Path separators and `..`
//! become `-` so a location can never address a file outside the history directory.
//! Quotes and control characters are dropped so the name is safe to quote in a
//! `Content-Disposition` header.

/// Extension of every search-history file.
pub(crate) const HISTORY_EXTENSION: &str = ".json";

/// File name of the history record for a searched location.
pub(crate) fn history_file_name(location: &str) -> String {
    let stem: String = location
        .trim()
        .chars()
        .filter(|c| !is_header_unsafe(*c))
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' => '-',
            c => c,
        })
        .collect();
    let stem = stem.replace("..", "-");
    // "x." + ".json" would reintroduce ".."
    let stem = stem.trim_end_matches('.');
    format!("{}{}", stem, HISTORY_EXTENSION)
}

fn is_header_unsafe(c: char) -> bool {
    c == '"' || c.is_control()
}

/// Location label recovered from a history file name.
pub(crate) fn location_from_file_name(file_name: &str) -> String {
    file_name
        .strip_suffix(HISTORY_EXTENSION)
        .unwrap_or(file_name)
        .replace('_', " ")
}

/// Whether a client-supplied name may be served from the history directory.
pub(crate) fn is_safe_history_file_name(file_name: &str) -> bool {
    file_name.ends_with(HISTORY_EXTENSION)
        && file_name.len() > HISTORY_EXTENSION.len()
        && !file_name.contains(['/', '\\'])
        && !file_name.contains("..")
        && !file_name.chars().any(is_header_unsafe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_file_name_replaces_spaces() {
        assert_eq!(history_file_name("Tel Aviv"), "Tel_Aviv.json");
        assert_eq!(history_file_name("  New York City "), "New_York_City.json");
    }

    #[test]
    fn test_history_file_name_strips_separators() {
        assert_eq!(history_file_name("../etc/passwd"), "--etc-passwd.json");
        assert_eq!(history_file_name(".."), "-.json");
        assert!(is_safe_history_file_name(&history_file_name("../etc/passwd")));
        assert!(is_safe_history_file_name(&history_file_name("a\\b")));
        assert_eq!(history_file_name("St. Louis Mo."), "St._Louis_Mo.json");
    }

    #[test]
    fn test_history_file_name_drops_quotes_and_control_chars() {
        assert_eq!(history_file_name("a\"b"), "ab.json");
        assert_eq!(history_file_name("Bad\r\nName\t"), "BadName.json");
        assert!(is_safe_history_file_name(&history_file_name("\"x\"\u{7f}")));
    }

    #[test]
    fn test_location_from_file_name() {
        assert_eq!(location_from_file_name("Tel_Aviv.json"), "Tel Aviv");
        assert_eq!(location_from_file_name("Zurich.json"), "Zurich");
    }

    #[test]
    fn test_is_safe_history_file_name() {
        assert!(is_safe_history_file_name("Tel_Aviv.json"));
        assert!(!is_safe_history_file_name("../secret.json"));
        assert!(!is_safe_history_file_name("dir/file.json"));
        assert!(!is_safe_history_file_name("notes.txt"));
        assert!(!is_safe_history_file_name(".json"));
        assert!(!is_safe_history_file_name("a\"b.json"));
        assert!(!is_safe_history_file_name("a\nb.json"));
    }
}
