//! Bulk clean operations
//!
//! Planners for the batch renames a user applies across many descriptions
//! at once: trim rules, manual renames, prefix/delimiter strips, case
//! conversion, smart-key auto-clean, and committing duplicate or cluster
//! suggestions. Every planner is pure: it returns a [`RenamePlan`] that the
//! caller inspects and then commits through
//! [`EntityCatalog::apply_plan`](crate::catalog::EntityCatalog::apply_plan).
//!
//! A plan also carries the annotation carryover its renames imply: when a
//! rename abandons an entity that had a category or comment and the new
//! name has none, the category migrates by plurality vote and the comment
//! is adopted.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::canonical::SmartKeyGenerator;
use crate::catalog::EntityCatalog;
use crate::cluster::Cluster;
use crate::dedupe::MergeSuggestion;
use crate::error::{Error, Result};
use crate::models::EntityGroup;
use crate::trim::{apply_trim, CompiledRuleSet, TrimMode};

/// Case conversion applied to current canonical names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseMode {
    Sentence,
    Lower,
    Upper,
    Title,
    Toggle,
}

/// A pure bulk-rename proposal: `description -> new canonical name` pairs
/// plus the category/comment carryover they imply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePlan {
    pub renames: Vec<(String, String)>,
    pub category_updates: HashMap<String, String>,
    pub comment_updates: HashMap<String, String>,
}

impl RenamePlan {
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

/// Rename via trim rules: each description's current canonical name is run
/// through the same `apply_trim` the preview uses.
pub fn trim_plan(
    catalog: &EntityCatalog,
    descriptions: &[String],
    rules: &CompiledRuleSet,
    mode: TrimMode,
) -> RenamePlan {
    let renames = descriptions
        .iter()
        .map(|desc| {
            let current = catalog.canonical_name(desc);
            let trimmed = apply_trim(&current, rules, mode);
            (desc.clone(), trimmed)
        })
        .collect();
    plan_from_renames(catalog, renames)
}

/// Rename every description to one manually chosen name.
pub fn rename_plan(
    catalog: &EntityCatalog,
    descriptions: &[String],
    new_name: &str,
) -> Result<RenamePlan> {
    let name = new_name.trim();
    if name.is_empty() {
        return Err(Error::InvalidMergeTarget(new_name.to_string()));
    }
    let renames = descriptions
        .iter()
        .map(|desc| (desc.clone(), name.to_string()))
        .collect();
    Ok(plan_from_renames(catalog, renames))
}

/// Drop a fixed number of leading characters from each raw description.
/// Lengths that would consume the whole description leave it unchanged.
pub fn strip_prefix_plan(
    catalog: &EntityCatalog,
    descriptions: &[String],
    length: usize,
) -> RenamePlan {
    let renames = descriptions
        .iter()
        .map(|desc| {
            let total = desc.chars().count();
            let result = if length > 0 && length < total {
                desc.chars().skip(length).collect::<String>()
            } else {
                desc.clone()
            };
            (desc.clone(), fallback_if_blank(catalog, desc, &result))
        })
        .collect();
    plan_from_renames(catalog, renames)
}

/// Keep only what follows the first occurrence of a delimiter in each raw
/// description.
pub fn strip_through_plan(
    catalog: &EntityCatalog,
    descriptions: &[String],
    delimiter: &str,
) -> RenamePlan {
    let renames = descriptions
        .iter()
        .map(|desc| {
            let result = match (!delimiter.is_empty()).then(|| desc.find(delimiter)).flatten() {
                Some(at) => desc[at + delimiter.len()..].to_string(),
                None => desc.clone(),
            };
            (desc.clone(), fallback_if_blank(catalog, desc, &result))
        })
        .collect();
    plan_from_renames(catalog, renames)
}

/// Convert the current canonical names to a different case.
pub fn case_plan(
    catalog: &EntityCatalog,
    descriptions: &[String],
    mode: CaseMode,
) -> RenamePlan {
    let renames = descriptions
        .iter()
        .map(|desc| {
            let current = catalog.canonical_name(desc);
            let converted = match mode {
                CaseMode::Sentence => sentence_case(&current),
                CaseMode::Lower => current.to_lowercase(),
                CaseMode::Upper => current.to_uppercase(),
                CaseMode::Title => title_case(&current),
                CaseMode::Toggle => toggle_case(&current),
            };
            (desc.clone(), converted)
        })
        .collect();
    plan_from_renames(catalog, renames)
}

/// Rename each description to its smart key, falling back to the plain
/// canonicalized name when the key is too short to stand alone.
pub fn auto_clean_plan(
    catalog: &EntityCatalog,
    keys: &SmartKeyGenerator,
    descriptions: &[String],
) -> RenamePlan {
    let renames = descriptions
        .iter()
        .map(|desc| {
            let mut cleaned = keys.smart_key(desc);
            if cleaned.chars().count() < 2 {
                cleaned = catalog.canonicalize(desc);
            }
            (desc.clone(), cleaned)
        })
        .collect();
    plan_from_renames(catalog, renames)
}

/// Commit plan for a duplicate suggestion: every member row of the target
/// and all candidates maps to the target's name.
pub fn suggestion_plan(catalog: &EntityCatalog, suggestion: &MergeSuggestion) -> RenamePlan {
    let mut renames = Vec::new();
    for group in std::iter::once(&suggestion.target).chain(&suggestion.candidates) {
        for member in &group.members {
            renames.push((member.description.clone(), suggestion.target.name.clone()));
        }
    }
    plan_from_renames(catalog, renames)
}

/// Commit plan for a cluster: every member row of the named entities maps
/// to the cluster name.
pub fn cluster_plan(
    catalog: &EntityCatalog,
    cluster: &Cluster,
    groups: &[EntityGroup],
) -> RenamePlan {
    let wanted: HashSet<&str> = cluster.members.iter().map(String::as_str).collect();
    let mut renames = Vec::new();
    for group in groups {
        if !wanted.contains(group.name.as_str()) {
            continue;
        }
        for member in &group.members {
            renames.push((member.description.clone(), cluster.name.clone()));
        }
    }
    plan_from_renames(catalog, renames)
}

/// Longest common prefix of the given names, trimmed. Used to seed the
/// manual-rename dialog.
pub fn common_prefix(names: &[String]) -> String {
    let Some(first) = names.first() else {
        return String::new();
    };
    let mut prefix = first.clone();
    for name in &names[1..] {
        while !name.starts_with(&prefix) {
            prefix.pop();
            if prefix.is_empty() {
                return String::new();
            }
        }
    }
    prefix.trim().to_string()
}

fn sentence_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

fn title_case(text: &str) -> String {
    text.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn toggle_case(text: &str) -> String {
    text.chars()
        .flat_map(|c| {
            if c.is_uppercase() {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                c.to_uppercase().collect::<Vec<_>>()
            }
        })
        .collect()
}

fn fallback_if_blank(catalog: &EntityCatalog, description: &str, result: &str) -> String {
    let trimmed = result.trim();
    if trimmed.is_empty() {
        catalog.canonical_name(description)
    } else {
        trimmed.to_string()
    }
}

/// Attach carryover to a rename list. Later entries for the same
/// description win, as when a user re-runs an operation over a selection.
fn plan_from_renames(catalog: &EntityCatalog, renames: Vec<(String, String)>) -> RenamePlan {
    let mut deduped: Vec<(String, String)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (desc, name) in renames {
        match index.get(&desc) {
            Some(&at) => deduped[at].1 = name,
            None => {
                index.insert(desc.clone(), deduped.len());
                deduped.push((desc, name));
            }
        }
    }

    // category votes per target, in first-seen order
    let mut vote_order: Vec<String> = Vec::new();
    let mut votes: HashMap<String, Vec<(String, usize)>> = HashMap::new();
    let mut comment_updates: HashMap<String, String> = HashMap::new();

    for (desc, new_name) in &deduped {
        let current = catalog.canonical_name(desc);
        if current == *new_name {
            continue;
        }
        if let Some(category) = catalog.category_of(&current).filter(|c| !c.is_empty()) {
            if catalog
                .category_of(new_name)
                .filter(|c| !c.is_empty())
                .is_none()
            {
                let target_votes = votes.entry(new_name.clone()).or_insert_with(|| {
                    vote_order.push(new_name.clone());
                    Vec::new()
                });
                match target_votes.iter_mut().find(|(c, _)| c == category) {
                    Some((_, count)) => *count += 1,
                    None => target_votes.push((category.to_string(), 1)),
                }
            }
        }
        if let Some(comment) = catalog.comment_of(&current).filter(|c| !c.is_empty()) {
            if catalog
                .comment_of(new_name)
                .filter(|c| !c.is_empty())
                .is_none()
            {
                comment_updates.insert(new_name.clone(), comment.to_string());
            }
        }
    }

    let mut category_updates = HashMap::new();
    for target in vote_order {
        if let Some(target_votes) = votes.remove(&target) {
            let mut best: Option<(String, usize)> = None;
            for (category, count) in target_votes {
                if best.as_ref().map_or(true, |(_, top)| count >= *top) {
                    best = Some((category, count));
                }
            }
            if let Some((category, _)) = best {
                category_updates.insert(target, category);
            }
        }
    }

    RenamePlan {
        renames: deduped,
        category_updates,
        comment_updates,
    }
}
