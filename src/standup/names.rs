//! Name normalization and identity keys for roster deduplication.
//!
//! A participant is stored under its display form (`@alice`, `Alice Smith`)
//! but compared by identity key, so `@Bob`, `bob` and `Bob` are the same
//! roster entry.

use teloxide::types::User;

/// Canonical display form of a raw name: trimmed, leading `@` kept, casing kept.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_string()
}

/// Comparison key for a name: leading `@` stripped, trimmed, lowercased.
///
/// Two names denote the same participant iff their keys are equal.
pub fn identity_key(raw: &str) -> String {
    normalize(raw)
        .trim_start_matches('@')
        .trim()
        .to_lowercase()
}

/// Parse a free-form name list into normalized, identity-deduplicated names.
///
/// Commas, semicolons and newlines separate segments; whitespace separates
/// tokens within a segment. A segment that is non-empty but yields no
/// whitespace tokens is kept verbatim. Order of first appearance is preserved.
pub fn parse_names(text: &str) -> Vec<String> {
    let folded = text.replace(['\n', ';'], ",");

    let mut parts: Vec<String> = Vec::new();
    for chunk in folded.split(',') {
        let tokens: Vec<&str> = chunk.split_whitespace().collect();
        if tokens.is_empty() {
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        } else {
            parts.extend(tokens.iter().map(|t| t.to_string()));
        }
    }

    let mut names = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for part in parts {
        let name = normalize(&part);
        if name.is_empty() {
            continue;
        }
        if seen.insert(identity_key(&name)) {
            names.push(name);
        }
    }
    names
}

/// Display name for an observed Telegram user: `@username` when available,
/// otherwise the profile name.
pub fn display_name(user: &User) -> String {
    if let Some(ref username) = user.username {
        return format!("@{username}");
    }
    let full = user.full_name();
    if full.is_empty() {
        "unknown".to_string()
    } else {
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_keeps_marker() {
        assert_eq!(normalize("  @alice  "), "@alice");
        assert_eq!(normalize("Alice Smith"), "Alice Smith");
    }

    #[test]
    fn test_identity_key_strips_marker_and_case() {
        assert_eq!(identity_key("@Alice"), "alice");
        assert_eq!(identity_key("alice"), "alice");
        assert_eq!(identity_key(" ALICE "), "alice");
        assert_eq!(identity_key("@Alice"), identity_key("ALICE"));
    }

    #[test]
    fn test_parse_mixed_separators() {
        assert_eq!(
            parse_names("a, b\nc;d   e"),
            vec!["a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn test_parse_dedups_by_identity() {
        // First spelling wins.
        assert_eq!(parse_names("@Bob, bob"), vec!["@Bob"]);
        assert_eq!(parse_names("Alice alice ALICE"), vec!["Alice"]);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_names("").is_empty());
        assert!(parse_names("  ,\n ; ").is_empty());
    }

    #[test]
    fn test_parse_keeps_lone_segment_verbatim() {
        // A segment with no internal whitespace survives stray delimiters.
        assert_eq!(parse_names(",@carol,"), vec!["@carol"]);
    }
}
