//! Version token extraction and incremental sequencing
//!
//! Archive filenames follow one of three naming conventions, each mapping to
//! a 3-character version token. The rules are kept as an ordered list of
//! (predicate, extractor) pairs so future archive-naming conventions can be
//! added without touching control flow elsewhere.

use crate::error::{Error, Result};
use crate::types::VersionToken;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Matches filenames that start with a digit (second naming convention)
#[allow(clippy::expect_used)]
static STARTS_WITH_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]").expect("static regex is valid"));

/// One filename-pattern rule: a predicate over the filename and a
/// byte-range extractor for the token it carries.
struct TokenRule {
    name: &'static str,
    matches: fn(&str) -> bool,
    extract: fn(&str) -> Option<&str>,
}

/// Ordered rule list, evaluated first-match-wins
///
/// 1. `game_1.4.0_<tok>...` - token at fixed offset 11 (after `game_1.4.0_`)
/// 2. `1.0.1_<tok>...`      - token at fixed offset 6 (after `1.0.1_`)
/// 3. `...<tok>.N.zip`      - suffix-trim: the 3 chars at `len-9..len-6`
const TOKEN_RULES: &[TokenRule] = &[
    TokenRule {
        name: "game-prefixed",
        matches: |name| name.starts_with("game_"),
        extract: |name| name.get(11..14),
    },
    TokenRule {
        name: "number-prefixed",
        matches: |name| STARTS_WITH_NUMBER.is_match(name),
        extract: |name| name.get(6..9),
    },
    TokenRule {
        name: "suffix-trimmed",
        matches: |_| true,
        extract: |name| name.len().checked_sub(9).and_then(|s| name.get(s..s + 3)),
    },
];

/// Extract the version token from an archive filename
///
/// Tokens are compared as opaque strings downstream, so this performs no
/// semantic version parsing: each rule cuts a fixed 3-character substring.
///
/// # Errors
///
/// Returns [`Error::InvalidArchiveName`] when the filename is too short for
/// the rule that matched it.
pub fn version_token(filename: &str) -> Result<VersionToken> {
    for rule in TOKEN_RULES {
        if (rule.matches)(filename) {
            return (rule.extract)(filename)
                .map(VersionToken::from)
                .ok_or_else(|| {
                    Error::InvalidArchiveName(format!(
                        "'{filename}' matched rule '{}' but is too short",
                        rule.name
                    ))
                });
        }
    }
    // The last rule matches unconditionally
    unreachable!("token rule list always has a catch-all")
}

/// Compute the pending versions relative to the persisted checkpoint
///
/// Returns the discovered tokens in ascending lexicographic order, restricted
/// to the subsequence strictly after the last processed token. An empty
/// result is normal and means there is no further work for this source.
///
/// If the last processed token is no longer among the discovered tokens
/// (stale checkpoint, deleted directory), the resume point is treated as
/// "before all" and everything is reprocessed. This fail-open behavior is
/// intentional; an audit entry is logged so the operator can see it happened.
pub fn pending_versions(
    discovered: &[VersionToken],
    processed: &[VersionToken],
) -> Vec<VersionToken> {
    let mut versions = discovered.to_vec();
    versions.sort();

    let Some(last) = processed.last() else {
        return versions;
    };

    match versions.iter().position(|v| v == last) {
        Some(index) => versions.split_off(index + 1),
        None => {
            warn!(
                last_processed = %last,
                discovered = versions.len(),
                "last processed version not found among discovered versions; \
                 reprocessing everything"
            );
            versions
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<VersionToken> {
        items.iter().map(|s| VersionToken::from(*s)).collect()
    }

    // --- token extraction rules ---

    #[test]
    fn game_prefixed_archive_uses_fixed_offset() {
        let token = version_token("game_1.4.0_1.5.0_hdiff_abcdef.zip").unwrap();
        assert_eq!(token.as_str(), "1.5");
    }

    #[test]
    fn number_prefixed_archive_uses_fixed_offset() {
        let token = version_token("1.4.0_1.5.0_hdiff_abcdef.zip").unwrap();
        assert_eq!(token.as_str(), "1.5");
    }

    #[test]
    fn other_archive_uses_suffix_trim() {
        // Token is the 3 chars at [len-9, len-6): "2.0" from "...2.0.1.zip"
        let token = version_token("StarRail_2.0.1.zip").unwrap();
        assert_eq!(token.as_str(), "2.0");
    }

    #[test]
    fn rules_are_evaluated_in_order() {
        // Starts with "game_", so the first rule wins even though the name
        // also ends in a suffix-trimmable pattern
        let token = version_token("game_1.4.0_2.3.0_full_1.0.1.zip").unwrap();
        assert_eq!(token.as_str(), "2.3");
    }

    #[test]
    fn too_short_game_prefixed_name_is_an_error() {
        let err = version_token("game_1.4").unwrap_err();
        assert!(matches!(err, Error::InvalidArchiveName(_)));
    }

    #[test]
    fn too_short_fallback_name_is_an_error() {
        let err = version_token("a.zip").unwrap_err();
        assert!(matches!(err, Error::InvalidArchiveName(_)));
    }

    // --- pending version sequencing ---

    #[test]
    fn no_checkpoint_means_everything_is_pending() {
        let discovered = tokens(&["1.1", "1.0", "1.2"]);
        let pending = pending_versions(&discovered, &[]);
        assert_eq!(pending, tokens(&["1.0", "1.1", "1.2"]));
    }

    #[test]
    fn pending_is_strict_suffix_after_last_processed() {
        let discovered = tokens(&["1.2", "1.0", "1.3", "1.1"]);
        let processed = tokens(&["1.0", "1.1"]);
        let pending = pending_versions(&discovered, &processed);
        assert_eq!(pending, tokens(&["1.2", "1.3"]));
    }

    #[test]
    fn fully_processed_source_has_empty_pending_set() {
        let discovered = tokens(&["1.0", "1.1"]);
        let processed = tokens(&["1.0", "1.1"]);
        assert!(pending_versions(&discovered, &processed).is_empty());
    }

    #[test]
    fn missing_checkpoint_token_reprocesses_everything() {
        // "1.1" was processed but its directory no longer exists
        let discovered = tokens(&["1.0", "1.2", "1.3"]);
        let processed = tokens(&["1.0", "1.1"]);
        let pending = pending_versions(&discovered, &processed);
        assert_eq!(pending, tokens(&["1.0", "1.2", "1.3"]));
    }

    #[test]
    fn ordering_is_lexicographic_not_numeric() {
        // Zero-padded fixed-width tokens make the two coincide for valid
        // input; this documents that the sort itself is plain string order
        let discovered = tokens(&["2.0", "10.", "1.9"]);
        let pending = pending_versions(&discovered, &[]);
        assert_eq!(pending, tokens(&["1.9", "10.", "2.0"]));
    }

    #[test]
    fn discovered_input_order_is_irrelevant() {
        let a = pending_versions(&tokens(&["1.2", "1.0", "1.1"]), &tokens(&["1.0"]));
        let b = pending_versions(&tokens(&["1.0", "1.1", "1.2"]), &tokens(&["1.0"]));
        assert_eq!(a, b);
        assert_eq!(a, tokens(&["1.1", "1.2"]));
    }
}
