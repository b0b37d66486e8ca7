//! Transaction type classification
//!
//! An ordered pattern table maps descriptions to short type codes (DD, SO,
//! FP, CARD, ...). Per-entity aggregation classifies every member row and
//! takes the plurality vote, so one noisy row doesn't set the type for a
//! whole entity.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lexicon::{case_insensitive, TYPE_PATTERNS};
use crate::models::EntityGroup;

struct TypeEntry {
    code: &'static str,
    patterns: Vec<Regex>,
}

/// Maps a description to a short type code via the fixed, ordered table.
pub struct TypeClassifier {
    table: Vec<TypeEntry>,
}

/// Proposed type code for an entity that has none set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSuggestion {
    pub name: String,
    pub code: String,
}

impl TypeClassifier {
    pub fn new() -> Result<Self> {
        let table = TYPE_PATTERNS
            .iter()
            .map(|&(code, patterns)| {
                let patterns = patterns
                    .iter()
                    .map(|p| case_insensitive(p))
                    .collect::<Result<Vec<_>>>()?;
                Ok(TypeEntry { code, patterns })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { table })
    }

    /// First code in table order with any matching pattern, `""` if none.
    pub fn classify(&self, description: &str) -> &'static str {
        for entry in &self.table {
            if entry.patterns.iter().any(|p| p.is_match(description)) {
                return entry.code;
            }
        }
        ""
    }

    /// Propose a type for every entity that has no explicit type set.
    ///
    /// Each member row is classified; the plurality code among non-empty
    /// results wins, ties preferring the longer code. Entities whose rows
    /// match nothing get no suggestion.
    pub fn suggest_group_types(&self, groups: &[EntityGroup]) -> Vec<TypeSuggestion> {
        let mut suggestions = Vec::new();
        for group in groups {
            if !group.type_code.trim().is_empty() {
                continue;
            }
            // votes in first-seen order so equal-count, equal-length ties
            // stay deterministic
            let mut votes: Vec<(&'static str, usize)> = Vec::new();
            for member in &group.members {
                let code = self.classify(&member.description);
                if code.is_empty() {
                    continue;
                }
                match votes.iter_mut().find(|(c, _)| *c == code) {
                    Some((_, count)) => *count += 1,
                    None => votes.push((code, 1)),
                }
            }
            let mut winner: Option<(&'static str, usize)> = None;
            for (code, count) in votes {
                match winner {
                    None => winner = Some((code, count)),
                    Some((best_code, best_count)) => {
                        if count > best_count
                            || (count == best_count && code.len() > best_code.len())
                        {
                            winner = Some((code, count));
                        }
                    }
                }
            }
            if let Some((code, _)) = winner {
                suggestions.push(TypeSuggestion {
                    name: group.name.clone(),
                    code: code.to_string(),
                });
            }
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawTransaction;

    fn group(name: &str, type_code: &str, descriptions: &[&str]) -> EntityGroup {
        let members: Vec<RawTransaction> = descriptions
            .iter()
            .enumerate()
            .map(|(i, desc)| RawTransaction {
                row_index: i,
                date: String::new(),
                description: desc.to_string(),
                amount_in: 0.0,
                amount_out: 10.0,
                type_code: String::new(),
            })
            .collect();
        EntityGroup {
            name: name.to_string(),
            category: String::new(),
            type_code: type_code.to_string(),
            comment: String::new(),
            count: members.len(),
            total_in: 0.0,
            total_out: 10.0 * members.len() as f64,
            members,
        }
    }

    #[test]
    fn test_classify_first_entry_wins() {
        let classifier = TypeClassifier::new().unwrap();
        assert_eq!(classifier.classify("DIRECT DEBIT BRITISH GAS"), "DD");
        assert_eq!(classifier.classify("STANDING ORDER RENT"), "SO");
        assert_eq!(classifier.classify("VISA TESCO STORES"), "CARD");
        assert_eq!(classifier.classify("ATM WITHDRAWAL HIGH ST"), "CASH");
        assert_eq!(classifier.classify("SALARY ACME LTD"), "SAL");
    }

    #[test]
    fn test_classify_no_match_is_empty() {
        let classifier = TypeClassifier::new().unwrap();
        assert_eq!(classifier.classify("JOHN SMITH"), "");
        assert_eq!(classifier.classify(""), "");
    }

    #[test]
    fn test_table_order_beats_later_entries() {
        let classifier = TypeClassifier::new().unwrap();
        // matches both DD ("\bDD\b") and DEP ("CREDIT"); DD is earlier
        assert_eq!(classifier.classify("DD CREDIT ACME"), "DD");
    }

    #[test]
    fn test_group_plurality() {
        let classifier = TypeClassifier::new().unwrap();
        let groups = vec![group(
            "BRITISH GAS",
            "",
            &[
                "DIRECT DEBIT BRITISH GAS",
                "DIRECT DEBIT BRITISH GAS",
                "VISA BRITISH GAS",
            ],
        )];
        let suggestions = classifier.suggest_group_types(&groups);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].code, "DD");
    }

    #[test]
    fn test_group_tie_prefers_longer_code() {
        let classifier = TypeClassifier::new().unwrap();
        let groups = vec![group(
            "ACME",
            "",
            &["DIRECT DEBIT ACME", "VISA ACME"],
        )];
        let suggestions = classifier.suggest_group_types(&groups);
        assert_eq!(suggestions.len(), 1);
        // DD and CARD tie at one vote each; CARD is longer
        assert_eq!(suggestions[0].code, "CARD");
    }

    #[test]
    fn test_group_with_explicit_type_is_skipped() {
        let classifier = TypeClassifier::new().unwrap();
        let groups = vec![group("ACME", "TFR", &["DIRECT DEBIT ACME"])];
        assert!(classifier.suggest_group_types(&groups).is_empty());
    }

    #[test]
    fn test_group_with_no_matches_gets_no_suggestion() {
        let classifier = TypeClassifier::new().unwrap();
        let groups = vec![group("ACME", "", &["JOHN SMITH", "JANE DOE"])];
        assert!(classifier.suggest_group_types(&groups).is_empty());
    }
}
