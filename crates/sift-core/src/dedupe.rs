//! Near-duplicate entity detection
//!
//! Proposes merges between existing entity groups using normalized edit
//! distance plus containment on the names, with a smart-key containment
//! assist for variants whose tails differ completely ("AMAZON.CO.UK" vs
//! "AMAZON EU SARL"). Output is advisory: applying a suggestion is a
//! separate, explicit mapping mutation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canonical::SmartKeyGenerator;
use crate::error::Result;
use crate::models::EntityGroup;

/// Thresholds for accepting a merge candidate.
#[derive(Debug, Clone)]
pub struct DedupeConfig {
    /// Similarity alone above this accepts a candidate
    pub similarity_threshold: f64,
    /// Similarity above this accepts when one name contains the other
    pub containment_similarity: f64,
    /// Minimum chars of the shorter smart key for a key-containment accept
    pub min_key_overlap: usize,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            containment_similarity: 0.6,
            min_key_overlap: 3,
        }
    }
}

/// A proposed merge: candidates that look like the same entity as target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeSuggestion {
    pub target: EntityGroup,
    pub candidates: Vec<EntityGroup>,
}

/// Standard unit-cost edit distance, counted in characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=a.len()).collect();
    let mut current = vec![0; a.len() + 1];
    for (i, bc) in b.iter().enumerate() {
        current[0] = i + 1;
        for (j, ac) in a.iter().enumerate() {
            let cost = usize::from(ac != bc);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[a.len()]
}

/// Smart keys too short to be trusted never match anything.
const MIN_USABLE_KEY_CHARS: usize = 2;

/// Scans entity groups for probable duplicates.
pub struct DuplicateDetector {
    config: DedupeConfig,
    keys: SmartKeyGenerator,
}

impl DuplicateDetector {
    pub fn new() -> Result<Self> {
        Self::with_config(DedupeConfig::default())
    }

    pub fn with_config(config: DedupeConfig) -> Result<Self> {
        Ok(Self {
            config,
            keys: SmartKeyGenerator::new()?,
        })
    }

    /// Propose merges among the given groups.
    ///
    /// Groups are scanned largest-first so bigger groups act as merge
    /// targets. A candidate is accepted when normalized similarity on the
    /// lower-cased names clears `similarity_threshold`, clears
    /// `containment_similarity` with one name containing the other, or the
    /// smart keys are equal or containing with at least `min_key_overlap`
    /// chars of overlap. Each group appears in at most one suggestion per
    /// run.
    pub fn find_duplicates(&self, groups: &[EntityGroup]) -> Vec<MergeSuggestion> {
        let mut sorted: Vec<&EntityGroup> = groups.iter().collect();
        sorted.sort_by(|a, b| b.count.cmp(&a.count));

        let smart_keys: Vec<String> =
            sorted.iter().map(|g| self.keys.smart_key(&g.name)).collect();

        let mut assigned = vec![false; sorted.len()];
        let mut suggestions = Vec::new();

        for i in 0..sorted.len() {
            if assigned[i] {
                continue;
            }
            let target = sorted[i];
            let name_a = target.name.to_lowercase();
            let mut candidates = Vec::new();
            let mut candidate_slots = Vec::new();

            for j in (i + 1)..sorted.len() {
                if assigned[j] {
                    continue;
                }
                let candidate = sorted[j];
                let name_b = candidate.name.to_lowercase();
                let max_len = name_a.chars().count().max(name_b.chars().count());
                if max_len == 0 {
                    continue;
                }
                let distance = levenshtein(&name_a, &name_b);
                let similarity = 1.0 - distance as f64 / max_len as f64;
                let contained = name_a.contains(&name_b) || name_b.contains(&name_a);

                if similarity > self.config.similarity_threshold
                    || (similarity > self.config.containment_similarity && contained)
                    || self.smart_keys_match(&smart_keys[i], &smart_keys[j])
                {
                    candidates.push(candidate.clone());
                    candidate_slots.push(j);
                }
            }

            if !candidates.is_empty() {
                debug!(
                    "Duplicate suggestion: {:?} <- {} candidate(s)",
                    target.name,
                    candidates.len()
                );
                assigned[i] = true;
                for j in candidate_slots {
                    assigned[j] = true;
                }
                suggestions.push(MergeSuggestion {
                    target: target.clone(),
                    candidates,
                });
            }
        }

        suggestions
    }

    fn smart_keys_match(&self, a: &str, b: &str) -> bool {
        if a.chars().count() <= MIN_USABLE_KEY_CHARS || b.chars().count() <= MIN_USABLE_KEY_CHARS {
            return false;
        }
        if a == b {
            return true;
        }
        let min_overlap = self.config.min_key_overlap;
        (a.contains(b) && b.chars().count() >= min_overlap)
            || (b.contains(a) && a.chars().count() >= min_overlap)
    }
}
