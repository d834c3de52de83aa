//! Text normalization and keyword matching
//!
//! Config fields that hold comma-separated keyword lists are frequently
//! pasted from Japanese IMEs, so full-width commas and ideographic commas
//! are accepted and normalized before the value is stored.

use tracing::warn;

/// Normalize a comma-separated keyword list: full-width commas become `,`,
/// items are trimmed, empty items are dropped, and the result is re-joined
/// with `", "`.
pub fn normalize_comma_list(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    let unified = input.replace(['，', '、'], ",");
    unified
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trim surrounding whitespace, including ideographic space.
pub fn normalize_text(input: &str) -> String {
    input.trim().to_string()
}

/// Whether a module name matches a keyword list.
///
/// `contains` is a comma-separated OR list; `exclude` rejects on any hit.
/// An empty include list never matches. U+FFFD items (mojibake from a wrongly
/// decoded config) are dropped rather than matched.
pub fn is_match(name: &str, contains: &str, exclude: &str) -> bool {
    let includes: Vec<&str> = contains
        .split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .collect();
    if includes.is_empty() {
        return false;
    }

    let includes: Vec<&str> = includes
        .into_iter()
        .filter(|word| {
            if word.contains('\u{fffd}') {
                warn!(keyword = %word, "Ignoring keyword with replacement characters");
                false
            } else {
                true
            }
        })
        .collect();

    let excludes = exclude
        .split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty());
    for word in excludes {
        if name.contains(word) {
            return false;
        }
    }

    includes.iter().any(|word| name.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_comma_list_fullwidth() {
        assert_eq!(normalize_comma_list("ミク，Miku、初音"), "ミク, Miku, 初音");
    }

    #[test]
    fn test_normalize_comma_list_drops_empties() {
        assert_eq!(normalize_comma_list(" a ,, b ,  "), "a, b");
        assert_eq!(normalize_comma_list(""), "");
        assert_eq!(normalize_comma_list(" , ,"), "");
    }

    #[test]
    fn test_normalize_text_trims_ideographic_space() {
        assert_eq!(normalize_text("\u{3000}ミク \u{3000}"), "ミク");
    }

    #[test]
    fn test_is_match_or_semantics() {
        assert!(is_match("Hatsune Miku Classic", "Miku, Rin", ""));
        assert!(is_match("Kagamine Rin", "Miku, Rin", ""));
        assert!(!is_match("KAITO", "Miku, Rin", ""));
    }

    #[test]
    fn test_is_match_exclude_wins() {
        assert!(!is_match("Miku Swimwear", "Miku", "Swimwear"));
        assert!(is_match("Miku Classic", "Miku", "Swimwear"));
    }

    #[test]
    fn test_is_match_empty_includes_never_match() {
        assert!(!is_match("anything", "", ""));
        assert!(!is_match("anything", " , ", "x"));
    }

    #[test]
    fn test_is_match_replacement_chars_ignored() {
        assert!(!is_match("bad\u{fffd}name", "\u{fffd}", ""));
        assert!(is_match("Miku", "\u{fffd}, Miku", ""));
    }
}
