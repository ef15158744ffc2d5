// media-logic/src/lib.rs
// ============================================================================
// Module: Media Logic
// Description: Boolean term-tree algebra for the query engine.
// Purpose: Compile and evaluate include/any/exclude term definitions.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A small And/Or/Not tree over literal and phrase terms, evaluated against
//! a single lower-cased haystack string. This is a purpose-built reduction
//! of a general boolean-requirement tree down to the shape the query engine
//! needs: short-circuit evaluation, no tri-state/unknown outcomes, no
//! execution planning.

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Terms
// ============================================================================

/// A single matchable term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Term {
    /// Matches case-insensitively, whole-word.
    Literal {
        /// The word to match.
        value: String,
    },
    /// Matches as a case-insensitive substring.
    Phrase {
        /// The phrase to match.
        value: String,
    },
}

impl Term {
    /// Returns the underlying text of the term.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Literal { value } | Self::Phrase { value } => value,
        }
    }

    /// Returns true when `haystack` (already lower-cased) contains this term.
    #[must_use]
    pub fn matches(&self, haystack: &str) -> bool {
        let needle = self.text().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        match self {
            Self::Phrase { .. } => haystack.contains(&needle),
            Self::Literal { .. } => contains_whole_word(haystack, &needle),
        }
    }
}

/// Whether `needle` occurs in `haystack` bounded by non-word characters on both sides.
fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';
    let mut search_from = 0usize;
    while let Some(offset) = haystack[search_from..].find(needle) {
        let start = search_from + offset;
        let end = start + needle.len();
        let before_ok = haystack[..start].chars().next_back().is_none_or(|c| !is_word_char(c));
        let after_ok = haystack[end..].chars().next().is_none_or(|c| !is_word_char(c));
        if before_ok && after_ok {
            return true;
        }
        search_from = start + 1;
        if search_from > haystack.len() {
            break;
        }
    }
    false
}

// ============================================================================
// SECTION: Term Tree
// ============================================================================

/// A boolean tree of terms, short-circuit evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TermExpr {
    /// A single term leaf.
    Leaf(Term),
    /// All of the sub-expressions must match.
    And(Vec<TermExpr>),
    /// At least one sub-expression must match; an empty list is vacuously true.
    Or(Vec<TermExpr>),
    /// The sub-expression must not match.
    Not(Box<TermExpr>),
}

impl TermExpr {
    /// Evaluates the tree against an already lower-cased haystack.
    #[must_use]
    pub fn evaluate(&self, haystack: &str) -> bool {
        match self {
            Self::Leaf(term) => term.matches(haystack),
            Self::And(parts) => parts.iter().all(|part| part.evaluate(haystack)),
            Self::Or(parts) => parts.is_empty() || parts.iter().any(|part| part.evaluate(haystack)),
            Self::Not(inner) => !inner.evaluate(haystack),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]
mod tests {
    use super::Term;
    use super::TermExpr;

    #[test]
    fn literal_matches_whole_word_only() {
        let term = Term::Literal { value: "gas".to_string() };
        assert!(term.matches("natural gas prices rise"));
        assert!(!term.matches("gasoline prices rise"));
    }

    #[test]
    fn phrase_matches_substring() {
        let term = Term::Phrase { value: "service outage".to_string() };
        assert!(term.matches("reports of a regional service outage today"));
    }

    #[test]
    fn and_or_not_short_circuit_as_expected() {
        let tree = TermExpr::And(vec![
            TermExpr::Leaf(Term::Literal { value: "red".to_string() }),
            TermExpr::Or(vec![
                TermExpr::Leaf(Term::Literal { value: "alert".to_string() }),
                TermExpr::Leaf(Term::Literal { value: "warning".to_string() }),
            ]),
            TermExpr::Not(Box::new(TermExpr::Leaf(Term::Literal { value: "drill".to_string() }))),
        ]);
        assert!(tree.evaluate("red alert issued across the network"));
        assert!(!tree.evaluate("red alert drill scheduled for friday"));
        assert!(!tree.evaluate("red notice issued, no alert or warning"));
    }

    #[test]
    fn empty_any_group_is_vacuously_true() {
        let tree = TermExpr::Or(vec![]);
        assert!(tree.evaluate("anything at all"));
    }
}
