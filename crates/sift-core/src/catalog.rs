//! Entity catalog: the working row set and its tables
//!
//! Owns the rows, the raw-description -> canonical-name mapping (the only
//! mutable state in the core), and the category/type/comment tables keyed
//! by canonical name. Entity groups and category rollups are derived views,
//! recomputed on demand and never stored.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bulk::RenamePlan;
use crate::canonical::Canonicalizer;
use crate::error::{Error, Result};
use crate::models::{EntityGroup, RawTransaction};

/// Category shown for entities that have none assigned.
pub const UNCATEGORIZED: &str = "UNCATEGORIZED";

/// Entity groups re-grouped by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRollup {
    pub name: String,
    pub total_in: f64,
    pub total_out: f64,
    pub groups: Vec<EntityGroup>,
}

/// The working set: rows plus the mapping and annotation tables.
pub struct EntityCatalog {
    rows: Vec<RawTransaction>,
    canonicalizer: Canonicalizer,
    mapping: HashMap<String, String>,
    categories: HashMap<String, String>,
    types: HashMap<String, String>,
    comments: HashMap<String, String>,
}

impl EntityCatalog {
    pub fn new(rows: Vec<RawTransaction>) -> Result<Self> {
        Ok(Self {
            rows,
            canonicalizer: Canonicalizer::new()?,
            mapping: HashMap::new(),
            categories: HashMap::new(),
            types: HashMap::new(),
            comments: HashMap::new(),
        })
    }

    /// Restore a catalog from host-persisted tables.
    pub fn with_tables(
        rows: Vec<RawTransaction>,
        mapping: HashMap<String, String>,
        categories: HashMap<String, String>,
        types: HashMap<String, String>,
        comments: HashMap<String, String>,
    ) -> Result<Self> {
        Ok(Self {
            rows,
            canonicalizer: Canonicalizer::new()?,
            mapping,
            categories,
            types,
            comments,
        })
    }

    pub fn rows(&self) -> &[RawTransaction] {
        &self.rows
    }

    /// Replace the working row set (e.g. after the host re-runs alignment).
    pub fn set_rows(&mut self, rows: Vec<RawTransaction>) {
        self.rows = rows;
    }

    pub fn mapping(&self) -> &HashMap<String, String> {
        &self.mapping
    }

    pub fn categories(&self) -> &HashMap<String, String> {
        &self.categories
    }

    pub fn types(&self) -> &HashMap<String, String> {
        &self.types
    }

    pub fn comments(&self) -> &HashMap<String, String> {
        &self.comments
    }

    /// The canonical name a raw description currently resolves to: the
    /// mapping override if present, otherwise the canonicalized text.
    pub fn canonical_name(&self, description: &str) -> String {
        match self.mapping.get(description) {
            Some(name) => name.clone(),
            None => self.canonicalizer.canonicalize(description),
        }
    }

    /// Canonicalize a description, ignoring any mapping override.
    pub fn canonicalize(&self, description: &str) -> String {
        self.canonicalizer.canonicalize(description)
    }

    /// The mapping override for a raw description, if any.
    pub fn get_mapping(&self, description: &str) -> Option<&str> {
        self.mapping.get(description).map(String::as_str)
    }

    /// Set or clear the mapping override for one raw description.
    ///
    /// A blank canonical name is rejected before the table is touched.
    /// Clearing leaves any category/type/comment recorded under the
    /// abandoned name in place; those entries are inert until the name is
    /// produced again.
    pub fn set_mapping(&mut self, description: &str, canonical: Option<&str>) -> Result<()> {
        match canonical {
            Some(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(Error::InvalidMergeTarget(name.to_string()));
                }
                self.mapping
                    .insert(description.to_string(), trimmed.to_string());
            }
            None => {
                self.mapping.remove(description);
            }
        }
        Ok(())
    }

    /// Commit a rename plan: the bulk mapping application plus the
    /// category/comment carryover it implies.
    pub fn apply_plan(&mut self, plan: &RenamePlan) -> Result<()> {
        for (_, name) in &plan.renames {
            if name.trim().is_empty() {
                return Err(Error::InvalidMergeTarget(name.clone()));
            }
        }
        for (description, name) in &plan.renames {
            self.mapping.insert(description.clone(), name.clone());
        }
        for (name, category) in &plan.category_updates {
            self.categories.insert(name.clone(), category.clone());
        }
        for (name, comment) in &plan.comment_updates {
            self.comments.insert(name.clone(), comment.clone());
        }
        Ok(())
    }

    pub fn category_of(&self, name: &str) -> Option<&str> {
        self.categories.get(name).map(String::as_str)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.types.get(name).map(String::as_str)
    }

    pub fn comment_of(&self, name: &str) -> Option<&str> {
        self.comments.get(name).map(String::as_str)
    }

    pub fn set_category(&mut self, name: &str, category: Option<&str>) {
        match category {
            Some(category) => self
                .categories
                .insert(name.to_string(), category.to_string()),
            None => self.categories.remove(name),
        };
    }

    pub fn set_type(&mut self, name: &str, type_code: Option<&str>) {
        match type_code {
            Some(code) => self.types.insert(name.to_string(), code.to_string()),
            None => self.types.remove(name),
        };
    }

    pub fn set_comment(&mut self, name: &str, comment: Option<&str>) {
        match comment {
            Some(comment) => self.comments.insert(name.to_string(), comment.to_string()),
            None => self.comments.remove(name),
        };
    }

    /// Recompute the entity-group view over the whole row set.
    pub fn entity_groups(&self) -> Vec<EntityGroup> {
        self.entity_groups_between(None, None)
    }

    /// Recompute the entity-group view, restricted to rows whose parsed
    /// date falls inside the given bounds. Rows whose dates don't parse
    /// always pass the filter; rows with an empty description or no amount
    /// in either column never participate.
    pub fn entity_groups_between(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Vec<EntityGroup> {
        let mut order: Vec<String> = Vec::new();
        let mut by_name: HashMap<String, EntityGroup> = HashMap::new();

        for row in &self.rows {
            if row.description.is_empty() || !row.has_amount() {
                continue;
            }
            if let Some(date) = row.parsed_date() {
                if from.is_some_and(|bound| date < bound) {
                    continue;
                }
                if to.is_some_and(|bound| date > bound) {
                    continue;
                }
            }

            let name = self.canonical_name(&row.description);
            let group = by_name.entry(name.clone()).or_insert_with(|| {
                order.push(name.clone());
                EntityGroup {
                    name: name.clone(),
                    category: self
                        .categories
                        .get(&name)
                        .cloned()
                        .unwrap_or_else(|| UNCATEGORIZED.to_string()),
                    type_code: self.types.get(&name).cloned().unwrap_or_default(),
                    comment: self.comments.get(&name).cloned().unwrap_or_default(),
                    count: 0,
                    total_in: 0.0,
                    total_out: 0.0,
                    members: Vec::new(),
                }
            });
            group.count += 1;
            group.total_in += row.amount_in;
            group.total_out += row.amount_out;
            group.members.push(row.clone());
        }

        order
            .into_iter()
            .filter_map(|name| by_name.remove(&name))
            .collect()
    }

    /// Entity groups re-grouped by category, in first-seen order.
    pub fn category_rollup(&self) -> Vec<CategoryRollup> {
        let mut order: Vec<String> = Vec::new();
        let mut by_category: HashMap<String, CategoryRollup> = HashMap::new();

        for group in self.entity_groups() {
            let category = if group.category.is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                group.category.clone()
            };
            let rollup = by_category.entry(category.clone()).or_insert_with(|| {
                order.push(category.clone());
                CategoryRollup {
                    name: category.clone(),
                    total_in: 0.0,
                    total_out: 0.0,
                    groups: Vec::new(),
                }
            });
            rollup.total_in += group.total_in;
            rollup.total_out += group.total_out;
            rollup.groups.push(group);
        }

        order
            .into_iter()
            .filter_map(|name| by_category.remove(&name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(row_index: usize, date: &str, desc: &str, amount_out: f64) -> RawTransaction {
        RawTransaction {
            row_index,
            date: date.to_string(),
            description: desc.to_string(),
            amount_in: 0.0,
            amount_out,
            type_code: String::new(),
        }
    }

    fn sample_catalog() -> EntityCatalog {
        EntityCatalog::new(vec![
            row(0, "01/02/2023", "DD NETFLIX.COM", 9.99),
            row(1, "02/02/2023", "DD NETFLIX.COM", 9.99),
            row(2, "03/02/2023", "CARD PYMT TESCO STORES 3456", 25.50),
            row(3, "04/02/2023", "", 5.0),
            row(4, "05/02/2023", "BGC EMPTY ROW", 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_groups_partition_by_canonical_name() {
        let catalog = sample_catalog();
        let groups = catalog.entity_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "NETFLIX.COM");
        assert_eq!(groups[0].count, 2);
        assert!((groups[0].total_out - 19.98).abs() < 1e-9);
        assert_eq!(groups[1].name, "TESCO STORES 3456");
        // blank description and zero-amount rows don't participate
        let total_members: usize = groups.iter().map(|g| g.members.len()).sum();
        assert_eq!(total_members, 3);
    }

    #[test]
    fn test_mapping_override_wins() {
        let mut catalog = sample_catalog();
        catalog
            .set_mapping("DD NETFLIX.COM", Some("NETFLIX"))
            .unwrap();
        let groups = catalog.entity_groups();
        assert!(groups.iter().any(|g| g.name == "NETFLIX" && g.count == 2));
    }

    #[test]
    fn test_clear_mapping_restores_canonicalized_name() {
        let mut catalog = sample_catalog();
        catalog
            .set_mapping("DD NETFLIX.COM", Some("NETFLIX"))
            .unwrap();
        catalog.set_mapping("DD NETFLIX.COM", None).unwrap();
        assert_eq!(catalog.get_mapping("DD NETFLIX.COM"), None);
        assert_eq!(catalog.canonical_name("DD NETFLIX.COM"), "NETFLIX.COM");
    }

    #[test]
    fn test_blank_merge_target_rejected_without_mutation() {
        let mut catalog = sample_catalog();
        let result = catalog.set_mapping("DD NETFLIX.COM", Some("   "));
        assert!(matches!(result, Err(Error::InvalidMergeTarget(_))));
        assert_eq!(catalog.get_mapping("DD NETFLIX.COM"), None);
    }

    #[test]
    fn test_clearing_override_leaves_annotations() {
        let mut catalog = sample_catalog();
        catalog
            .set_mapping("DD NETFLIX.COM", Some("NETFLIX"))
            .unwrap();
        catalog.set_category("NETFLIX", Some("Entertainment"));
        catalog.set_mapping("DD NETFLIX.COM", None).unwrap();
        // the annotation stays and re-attaches if the name comes back
        assert_eq!(catalog.category_of("NETFLIX"), Some("Entertainment"));
        catalog
            .set_mapping("DD NETFLIX.COM", Some("NETFLIX"))
            .unwrap();
        let groups = catalog.entity_groups();
        let netflix = groups.iter().find(|g| g.name == "NETFLIX").unwrap();
        assert_eq!(netflix.category, "Entertainment");
    }

    #[test]
    fn test_date_range_filter_keeps_unparseable_dates() {
        let mut catalog = sample_catalog();
        catalog.set_rows(vec![
            row(0, "01/02/2023", "DD NETFLIX.COM", 9.99),
            row(1, "??", "DD NETFLIX.COM", 9.99),
            row(2, "01/03/2023", "DD NETFLIX.COM", 9.99),
        ]);
        let from = NaiveDate::from_ymd_opt(2023, 2, 10).unwrap();
        let groups = catalog.entity_groups_between(Some(from), None);
        // the January row is filtered out, the unparseable one stays
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);
    }

    #[test]
    fn test_category_rollup() {
        let mut catalog = sample_catalog();
        catalog.set_category("NETFLIX.COM", Some("Entertainment"));
        let rollups = catalog.category_rollup();
        assert_eq!(rollups.len(), 2);
        let entertainment = rollups
            .iter()
            .find(|r| r.name == "Entertainment")
            .unwrap();
        assert_eq!(entertainment.groups.len(), 1);
        assert!((entertainment.total_out - 19.98).abs() < 1e-9);
        assert!(rollups.iter().any(|r| r.name == UNCATEGORIZED));
    }

    #[test]
    fn test_group_annotations_come_from_tables() {
        let mut catalog = sample_catalog();
        catalog.set_type("NETFLIX.COM", Some("DD"));
        catalog.set_comment("NETFLIX.COM", Some("shared account"));
        let groups = catalog.entity_groups();
        let netflix = groups.iter().find(|g| g.name == "NETFLIX.COM").unwrap();
        assert_eq!(netflix.type_code, "DD");
        assert_eq!(netflix.comment, "shared account");
        assert_eq!(netflix.category, UNCATEGORIZED);
    }
}
