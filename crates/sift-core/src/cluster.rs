//! Semi-automatic clustering of uncategorized entities
//!
//! First-pass clean-up: entities whose smart keys are equal, or where one
//! key contains the other with enough overlap, are proposed as one cluster
//! under the leader's smart key. Advisory only.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canonical::SmartKeyGenerator;
use crate::catalog::UNCATEGORIZED;
use crate::error::Result;
use crate::models::EntityGroup;

/// Smart keys at or below this length carry too little signal to cluster.
const MIN_KEY_CHARS: usize = 2;

/// A proposed cluster: the leader's smart key as the canonical name, the
/// member entity names to map onto it (leader first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub members: Vec<String>,
}

/// Builds clusters among currently-uncategorized entities.
pub struct ClusterBuilder {
    keys: SmartKeyGenerator,
}

impl ClusterBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            keys: SmartKeyGenerator::new()?,
        })
    }

    /// Propose disjoint clusters over the uncategorized entities.
    ///
    /// Longer names lead so the more specific entity picks the cluster.
    /// A candidate joins when the smart keys are equal, or one contains
    /// the other and the shorter key has at least `min_overlap_chars`
    /// characters. Entities matching nothing form no cluster.
    pub fn build_clusters(
        &self,
        groups: &[EntityGroup],
        min_overlap_chars: usize,
    ) -> Vec<Cluster> {
        let mut pool: Vec<(&str, String)> = groups
            .iter()
            .filter(|g| g.category.is_empty() || g.category == UNCATEGORIZED)
            .map(|g| (g.name.as_str(), self.keys.smart_key(&g.name)))
            .filter(|(_, key)| key.chars().count() > MIN_KEY_CHARS)
            .collect();
        pool.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        let mut assigned = vec![false; pool.len()];
        let mut clusters = Vec::new();

        for i in 0..pool.len() {
            if assigned[i] {
                continue;
            }
            let (leader_name, leader_key) = &pool[i];
            let mut members = Vec::new();
            let mut member_slots = Vec::new();

            for (j, (candidate_name, candidate_key)) in pool.iter().enumerate() {
                if i == j || assigned[j] {
                    continue;
                }
                let matched = leader_key == candidate_key
                    || (leader_key.contains(candidate_key.as_str())
                        && candidate_key.chars().count() >= min_overlap_chars)
                    || (candidate_key.contains(leader_key.as_str())
                        && leader_key.chars().count() >= min_overlap_chars);
                if matched {
                    members.push(candidate_name.to_string());
                    member_slots.push(j);
                }
            }

            if !members.is_empty() {
                members.insert(0, leader_name.to_string());
                assigned[i] = true;
                for j in member_slots {
                    assigned[j] = true;
                }
                debug!(
                    "Cluster {:?} with {} member(s)",
                    leader_key,
                    members.len()
                );
                clusters.push(Cluster {
                    name: leader_key.clone(),
                    members,
                });
            }
        }

        clusters.sort_by(|a, b| a.name.cmp(&b.name));
        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, category: &str) -> EntityGroup {
        EntityGroup {
            name: name.to_string(),
            category: category.to_string(),
            type_code: String::new(),
            comment: String::new(),
            count: 1,
            total_in: 0.0,
            total_out: 1.0,
            members: Vec::new(),
        }
    }

    #[test]
    fn test_shared_smart_key_clusters() {
        let builder = ClusterBuilder::new().unwrap();
        let groups = vec![
            group("TESCO STORES 1234", ""),
            group("TESCO STORES 5678", ""),
            group("SAINSBURYS", ""),
        ];
        let clusters = builder.build_clusters(&groups, 3);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].name, "TESCO STORES");
        assert_eq!(clusters[0].members.len(), 2);
        assert!(clusters[0]
            .members
            .iter()
            .all(|m| m.starts_with("TESCO STORES")));
    }

    #[test]
    fn test_key_containment_with_overlap() {
        let builder = ClusterBuilder::new().unwrap();
        let groups = vec![
            group("VODAFONE LIMITED", ""),
            group("VODAFONE", ""),
        ];
        let clusters = builder.build_clusters(&groups, 3);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
        // the longer name leads
        assert_eq!(clusters[0].members[0], "VODAFONE LIMITED");
    }

    #[test]
    fn test_overlap_threshold_blocks_short_keys() {
        let builder = ClusterBuilder::new().unwrap();
        let groups = vec![group("ABC HOLDINGS GROUP", ""), group("ABC", "")];
        // "ABC" is contained in the longer key, but 3 < 10 blocks it
        let clusters = builder.build_clusters(&groups, 10);
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_categorized_entities_are_excluded() {
        let builder = ClusterBuilder::new().unwrap();
        let groups = vec![
            group("TESCO STORES 1234", "Groceries"),
            group("TESCO STORES 5678", ""),
        ];
        assert!(builder.build_clusters(&groups, 3).is_empty());
    }

    #[test]
    fn test_uncategorized_placeholder_counts_as_unset() {
        let builder = ClusterBuilder::new().unwrap();
        let groups = vec![
            group("TESCO STORES 1234", UNCATEGORIZED),
            group("TESCO STORES 5678", ""),
        ];
        assert_eq!(builder.build_clusters(&groups, 3).len(), 1);
    }

    #[test]
    fn test_singletons_form_no_cluster() {
        let builder = ClusterBuilder::new().unwrap();
        let groups = vec![group("SAINSBURYS", ""), group("BRITISH GAS", "")];
        assert!(builder.build_clusters(&groups, 3).is_empty());
    }

    #[test]
    fn test_clusters_are_disjoint() {
        let builder = ClusterBuilder::new().unwrap();
        let groups = vec![
            group("VODAFONE LIMITED 01", ""),
            group("VODAFONE LIMITED 02", ""),
            group("VODAFONE", ""),
            group("NETFLIX JAN", ""),
            group("NETFLIX FEB", ""),
        ];
        let clusters = builder.build_clusters(&groups, 3);
        let mut seen = std::collections::HashSet::new();
        for cluster in &clusters {
            for member in &cluster.members {
                assert!(seen.insert(member.clone()), "{member} in two clusters");
            }
        }
    }
}
