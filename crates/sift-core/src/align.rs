//! Two-scan record alignment
//!
//! Matches flagged "needs fixing" rows against a freshly captured second
//! scan of the same statement span and backfills missing or better fields.
//! The scan is greedy and monotonic: accepted matches move strictly forward
//! through the scan rows, so no two flagged rows can land on out-of-order
//! or repeated scan rows.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::RawTransaction;

/// Scoring weights for the greedy monotonic matcher.
///
/// Carried over as tuned values, with no claim of optimality; every field
/// can be overridden by the host.
#[derive(Debug, Clone)]
pub struct AlignConfig {
    /// Both dates present and equal
    pub date_match_bonus: f64,
    /// Both dates present and different
    pub date_mismatch_penalty: f64,
    /// Target has no date but the scan row does
    pub missing_date_bonus: f64,
    /// Both rows have amounts and they agree within `amount_tolerance`
    pub amount_match_bonus: f64,
    /// Both rows have amounts and they disagree
    pub amount_mismatch_penalty: f64,
    /// Target has no amount but the scan row does
    pub amount_backfill_bonus: f64,
    /// Target has an amount but the scan row does not
    pub amount_dropout_penalty: f64,
    /// Multiplier applied to description similarity (0-100)
    pub similarity_weight: f64,
    /// Rows this close to the start of the search window get a
    /// chronological-order bonus of `window - distance`
    pub proximity_window: usize,
    /// Minimum score for a candidate to be accepted
    pub accept_threshold: f64,
    /// Absolute tolerance when comparing amounts
    pub amount_tolerance: f64,
    /// Replacement descriptions are truncated to this many characters
    pub description_limit: usize,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            date_match_bonus: 30.0,
            date_mismatch_penalty: 50.0,
            missing_date_bonus: 5.0,
            amount_match_bonus: 40.0,
            amount_mismatch_penalty: 40.0,
            amount_backfill_bonus: 20.0,
            amount_dropout_penalty: 10.0,
            similarity_weight: 0.3,
            proximity_window: 5,
            accept_threshold: 20.0,
            amount_tolerance: 0.05,
            description_limit: 50,
        }
    }
}

/// Which fields an accepted match wrote into the flagged row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatedField {
    Description,
    Amounts,
    TypeCode,
}

/// Result for one flagged row: either the scan row it matched and what was
/// copied over, or unmatched. Unmatched is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentOutcome {
    Matched {
        target_index: usize,
        scan_index: usize,
        updated_fields: Vec<UpdatedField>,
    },
    Unmatched {
        target_index: usize,
    },
}

/// The repaired row set plus a per-flagged-row outcome trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    pub rows: Vec<RawTransaction>,
    pub outcomes: Vec<AlignmentOutcome>,
}

/// Case-insensitive description similarity on a 0-100 scale.
///
/// Exact match after trim scores 100, containment 80; otherwise the token
/// overlap ratio over tokens longer than 2 characters. Symmetric in its
/// arguments.
pub fn description_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let a = a.trim();
    let b = b.trim();
    if a == b {
        return 100.0;
    }
    if a.contains(b) || b.contains(a) {
        return 80.0;
    }
    let tokens_a = tokens(a);
    let tokens_b = tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    intersection as f64 / tokens_a.len().max(tokens_b.len()) as f64 * 100.0
}

fn tokens(text: &str) -> HashSet<&str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|token| token.chars().count() > 2)
        .collect()
}

/// Aligns flagged rows against a second scan and repairs their fields.
#[derive(Debug, Clone, Default)]
pub struct RecordAligner {
    config: AlignConfig,
}

impl RecordAligner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AlignConfig) -> Self {
        Self { config }
    }

    /// Align the flagged rows of `rows` against `scan` and return a
    /// repaired copy. Inputs are never mutated.
    ///
    /// Flagged indices are visited in ascending order; each one scores
    /// every scan row past the previous accepted match and takes the best
    /// candidate if it clears `accept_threshold`. On acceptance the
    /// description is replaced only when the candidate's is at least as
    /// long (never downgrade to a shorter guess), amounts are copied only
    /// when the flagged row has none, and the type code only when the
    /// flagged row's is empty.
    pub fn align_and_repair(
        &self,
        flagged: &[usize],
        rows: &[RawTransaction],
        scan: &[RawTransaction],
    ) -> AlignmentReport {
        let cfg = &self.config;

        let mut indices: Vec<usize> = flagged
            .iter()
            .copied()
            .filter(|&idx| idx < rows.len())
            .collect();
        indices.sort_unstable();
        indices.dedup();

        let mut new_rows = rows.to_vec();
        let mut outcomes = Vec::with_capacity(indices.len());
        // exclusive lower bound into the scan
        let mut last_match: Option<usize> = None;

        for &idx in &indices {
            let target = &new_rows[idx];
            let target_has_amount = target.has_amount();
            let start = last_match.map_or(0, |m| m + 1);

            let mut best: Option<(usize, f64)> = None;
            for scan_index in start..scan.len() {
                let candidate = &scan[scan_index];
                let mut score = 0.0;

                if !target.date.is_empty() && !candidate.date.is_empty() {
                    if target.date == candidate.date {
                        score += cfg.date_match_bonus;
                    } else {
                        score -= cfg.date_mismatch_penalty;
                    }
                } else if target.date.is_empty() && !candidate.date.is_empty() {
                    score += cfg.missing_date_bonus;
                }

                let candidate_has_amount = candidate.has_amount();
                if target_has_amount && candidate_has_amount {
                    let in_matches =
                        (target.amount_in - candidate.amount_in).abs() < cfg.amount_tolerance;
                    let out_matches =
                        (target.amount_out - candidate.amount_out).abs() < cfg.amount_tolerance;
                    if in_matches && out_matches {
                        score += cfg.amount_match_bonus;
                    } else {
                        score -= cfg.amount_mismatch_penalty;
                    }
                } else if !target_has_amount && candidate_has_amount {
                    score += cfg.amount_backfill_bonus;
                } else if target_has_amount && !candidate_has_amount {
                    score -= cfg.amount_dropout_penalty;
                }

                score += description_similarity(&target.description, &candidate.description)
                    * cfg.similarity_weight;

                let distance = scan_index - start;
                if distance < cfg.proximity_window {
                    score += (cfg.proximity_window - distance) as f64;
                }

                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((scan_index, score));
                }
            }

            match best {
                Some((scan_index, score)) if score > cfg.accept_threshold => {
                    let candidate = &scan[scan_index];
                    let row = &mut new_rows[idx];
                    let mut updated_fields = Vec::new();

                    if candidate.description.chars().count() >= row.description.chars().count() {
                        row.description = candidate
                            .description
                            .chars()
                            .take(cfg.description_limit)
                            .collect();
                        updated_fields.push(UpdatedField::Description);
                    }
                    if !target_has_amount {
                        row.amount_in = candidate.amount_in;
                        row.amount_out = candidate.amount_out;
                        updated_fields.push(UpdatedField::Amounts);
                    }
                    if row.type_code.is_empty() && !candidate.type_code.is_empty() {
                        row.type_code = candidate.type_code.clone();
                        updated_fields.push(UpdatedField::TypeCode);
                    }

                    debug!(
                        "Row {idx} matched scan row {scan_index} (score {score:.1})"
                    );
                    last_match = Some(scan_index);
                    outcomes.push(AlignmentOutcome::Matched {
                        target_index: idx,
                        scan_index,
                        updated_fields,
                    });
                }
                _ => {
                    debug!("Row {idx}: no confident match");
                    outcomes.push(AlignmentOutcome::Unmatched { target_index: idx });
                }
            }
        }

        AlignmentReport {
            rows: new_rows,
            outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        row_index: usize,
        date: &str,
        desc: &str,
        amount_in: f64,
        amount_out: f64,
        type_code: &str,
    ) -> RawTransaction {
        RawTransaction {
            row_index,
            date: date.to_string(),
            description: desc.to_string(),
            amount_in,
            amount_out,
            type_code: type_code.to_string(),
        }
    }

    #[test]
    fn test_similarity_exact_containment_tokens() {
        assert_eq!(description_similarity("TESCO STORES", "tesco stores"), 100.0);
        assert_eq!(description_similarity("TESCO STORES 1234", "TESCO"), 80.0);
        // token overlap: {tesco, stores} vs {tesco, express} -> 1/2
        assert_eq!(
            description_similarity("TESCO STORES", "TESCO EXPRESS"),
            50.0
        );
        assert_eq!(description_similarity("", "TESCO"), 0.0);
        assert_eq!(description_similarity("A B", "C D"), 0.0);
    }

    #[test]
    fn test_similarity_symmetry() {
        let pairs = [
            ("TESCO STORES", "TESCO EXPRESS LTD"),
            ("AMAZON PRIME", "AMZN PRIME VIDEO"),
            ("X", "Y"),
            ("JOHN SMITH", "JOHN SMITH LTD"),
        ];
        for (a, b) in pairs {
            assert_eq!(
                description_similarity(a, b),
                description_similarity(b, a),
                "asymmetric for {a:?} / {b:?}"
            );
        }
    }

    #[test]
    fn test_backfills_garbled_row() {
        let rows = vec![
            row(0, "01/02/2023", "TESCO STORES", 0.0, 12.0, "CARD"),
            row(1, "02/02/2023", "T#SC* ST*R#S", 0.0, 0.0, ""),
            row(2, "03/02/2023", "BRITISH GAS", 0.0, 80.0, "DD"),
        ];
        let scan = vec![
            row(0, "01/02/2023", "TESCO STORES", 0.0, 12.0, "CARD"),
            row(1, "02/02/2023", "TESCO EXPRESS LONDON", 0.0, 9.5, "CARD"),
            row(2, "03/02/2023", "BRITISH GAS", 0.0, 80.0, "DD"),
        ];
        let report = RecordAligner::new().align_and_repair(&[1], &rows, &scan);
        let repaired = &report.rows[1];
        assert_eq!(repaired.description, "TESCO EXPRESS LONDON");
        assert_eq!(repaired.amount_out, 9.5);
        assert_eq!(repaired.type_code, "CARD");
        assert_eq!(
            report.outcomes,
            vec![AlignmentOutcome::Matched {
                target_index: 1,
                scan_index: 1,
                updated_fields: vec![
                    UpdatedField::Description,
                    UpdatedField::Amounts,
                    UpdatedField::TypeCode
                ],
            }]
        );
    }

    #[test]
    fn test_never_downgrades_to_shorter_description() {
        let rows = vec![row(0, "01/02/2023", "TESCO STORES HIGH STREET", 0.0, 12.0, "")];
        let scan = vec![row(0, "01/02/2023", "TESCO STORES HIGH ST", 0.0, 12.0, "")];
        let report = RecordAligner::new().align_and_repair(&[0], &rows, &scan);
        assert_eq!(report.rows[0].description, "TESCO STORES HIGH STREET");
        match &report.outcomes[0] {
            AlignmentOutcome::Matched { updated_fields, .. } => {
                assert!(!updated_fields.contains(&UpdatedField::Description));
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_existing_amounts_are_kept() {
        let rows = vec![row(0, "01/02/2023", "TESCO STORES", 0.0, 12.0, "")];
        let scan = vec![row(0, "01/02/2023", "TESCO STORES LONDON", 0.0, 12.01, "")];
        let report = RecordAligner::new().align_and_repair(&[0], &rows, &scan);
        assert_eq!(report.rows[0].amount_out, 12.0);
    }

    #[test]
    fn test_monotonic_scan_indices() {
        let rows = vec![
            row(0, "01/02/2023", "ALPHA PAYMENTS LTD", 0.0, 0.0, ""),
            row(1, "02/02/2023", "BRAVO HOLDINGS", 0.0, 0.0, ""),
            row(2, "03/02/2023", "CHARLIE SUPPLIES", 0.0, 0.0, ""),
        ];
        let scan = vec![
            row(0, "01/02/2023", "ALPHA PAYMENTS LTD", 0.0, 10.0, ""),
            row(1, "02/02/2023", "BRAVO HOLDINGS", 0.0, 20.0, ""),
            row(2, "03/02/2023", "CHARLIE SUPPLIES", 0.0, 30.0, ""),
        ];
        let report = RecordAligner::new().align_and_repair(&[0, 1, 2], &rows, &scan);
        let mut accepted = Vec::new();
        for outcome in &report.outcomes {
            if let AlignmentOutcome::Matched { scan_index, .. } = outcome {
                accepted.push(*scan_index);
            }
        }
        assert_eq!(accepted.len(), 3);
        assert!(accepted.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_no_candidate_above_threshold_leaves_row_unchanged() {
        let rows = vec![row(0, "01/02/2023", "ALPHA PAYMENTS LTD", 0.0, 10.0, "")];
        let scan = vec![row(0, "09/09/2024", "ZEBRA WIDGETS", 0.0, 99.0, "")];
        let report = RecordAligner::new().align_and_repair(&[0], &rows, &scan);
        assert_eq!(report.rows, rows);
        assert_eq!(
            report.outcomes,
            vec![AlignmentOutcome::Unmatched { target_index: 0 }]
        );
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let rows = vec![row(0, "01/02/2023", "X", 0.0, 0.0, "")];
        let scan = vec![row(0, "01/02/2023", "X RAY SUPPLIES LTD", 0.0, 5.0, "")];
        let rows_before = rows.clone();
        let scan_before = scan.clone();
        let _ = RecordAligner::new().align_and_repair(&[0], &rows, &scan);
        assert_eq!(rows, rows_before);
        assert_eq!(scan, scan_before);
    }

    #[test]
    fn test_description_truncated_to_limit() {
        let long_desc = "A".repeat(80);
        let rows = vec![row(0, "01/02/2023", "SHORT", 0.0, 0.0, "")];
        let scan = vec![row(0, "01/02/2023", &long_desc, 0.0, 5.0, "")];
        let report = RecordAligner::new().align_and_repair(&[0], &rows, &scan);
        assert_eq!(report.rows[0].description.len(), 50);
    }

    #[test]
    fn test_out_of_range_and_duplicate_indices_are_ignored() {
        let rows = vec![row(0, "01/02/2023", "ALPHA PAYMENTS LTD", 0.0, 0.0, "")];
        let scan = vec![row(0, "01/02/2023", "ALPHA PAYMENTS LTD", 0.0, 10.0, "")];
        let report = RecordAligner::new().align_and_repair(&[0, 0, 99], &rows, &scan);
        assert_eq!(report.outcomes.len(), 1);
    }
}
