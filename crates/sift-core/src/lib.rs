//! Sift Core Library
//!
//! Entity resolution and record matching for noisy bank-statement captures:
//! - Canonicalization of free-text line descriptions
//! - Clustering keys and semi-automatic entity grouping
//! - User-authored trim rules (a small placeholder DSL)
//! - Transaction type classification
//! - Near-duplicate entity detection
//! - Two-scan alignment for repairing low-confidence rows
//!
//! The core is synchronous and in-memory. File ingestion, OCR extraction,
//! grid rendering, undo/redo and persistence belong to the host
//! application; the only state here is the entity catalog's mapping and
//! annotation tables.

pub mod align;
pub mod bulk;
pub mod canonical;
pub mod catalog;
pub mod classify;
pub mod cluster;
pub mod dedupe;
pub mod error;
pub mod lexicon;
pub mod models;
pub mod trim;

pub use align::{
    description_similarity, AlignConfig, AlignmentOutcome, AlignmentReport, RecordAligner,
    UpdatedField,
};
pub use bulk::{
    auto_clean_plan, case_plan, cluster_plan, common_prefix, rename_plan, strip_prefix_plan,
    strip_through_plan, suggestion_plan, trim_plan, CaseMode, RenamePlan,
};
pub use canonical::{Canonicalizer, SmartKeyGenerator, UNKNOWN_ENTITY};
pub use catalog::{CategoryRollup, EntityCatalog, UNCATEGORIZED};
pub use classify::{TypeClassifier, TypeSuggestion};
pub use cluster::{Cluster, ClusterBuilder};
pub use dedupe::{levenshtein, DedupeConfig, DuplicateDetector, MergeSuggestion};
pub use error::{Error, Result};
pub use models::{parse_amount, parse_statement_date, EntityGroup, RawTransaction};
pub use trim::{
    apply_trim, compile_trim_rules, preview_trim, CompiledRule, CompiledRuleSet, TrimMode,
    TrimPreview,
};
