//! Canonicalization of raw statement descriptions
//!
//! Two passes over the same banking lexicon: [`Canonicalizer`] produces the
//! display-grade entity name, [`SmartKeyGenerator`] applies a stricter
//! second pass to produce a clustering-only key that is never shown to
//! users. Every feature that needs entity normalization goes through this
//! module.

use regex::Regex;

use crate::error::Result;
use crate::lexicon::{compile_noise_patterns, compile_stop_words};

/// Name used when a description cleans down to nothing at all.
pub const UNKNOWN_ENTITY: &str = "UNKNOWN";

/// Collapse runs of whitespace to single spaces and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips the fixed banking-jargon lexicon from raw descriptions.
///
/// Compiled once; `canonicalize` itself is pure and idempotent.
pub struct Canonicalizer {
    noise: Vec<Regex>,
}

impl Canonicalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            noise: compile_noise_patterns()?,
        })
    }

    /// Produce a display-grade entity candidate from a raw description.
    ///
    /// Uppercases, removes lexicon terms longest-first, collapses
    /// whitespace. A result shorter than 2 characters falls back to the
    /// trimmed raw input, or [`UNKNOWN_ENTITY`] if that is also empty.
    pub fn canonicalize(&self, raw: &str) -> String {
        let mut cleaned = raw.to_uppercase();
        for pattern in &self.noise {
            cleaned = pattern.replace_all(&cleaned, " ").into_owned();
        }
        let cleaned = collapse_whitespace(&cleaned);
        if cleaned.chars().count() < 2 {
            let fallback = raw.trim();
            if fallback.is_empty() {
                UNKNOWN_ENTITY.to_string()
            } else {
                fallback.to_string()
            }
        } else {
            cleaned
        }
    }
}

/// Produces the aggressively-stripped key used only for clustering.
pub struct SmartKeyGenerator {
    noise: Vec<Regex>,
    stop_words: Vec<Regex>,
    numeric_token: Regex,
    punctuation: Regex,
}

impl SmartKeyGenerator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            noise: compile_noise_patterns()?,
            stop_words: compile_stop_words()?,
            numeric_token: Regex::new(r"\b\d+\b")?,
            punctuation: Regex::new(r"[^A-Z0-9\s&]")?,
        })
    }

    /// Clustering key for a raw description. May be empty.
    ///
    /// Runs the canonicalizer's stripping, then the generic stop-word list,
    /// drops standalone numeric tokens unless they are exactly 6 or 8
    /// digits (likely meaningful codes), and removes remaining punctuation
    /// except `&`.
    pub fn smart_key(&self, raw: &str) -> String {
        let mut text = raw.to_uppercase();
        for pattern in &self.noise {
            text = pattern.replace_all(&text, " ").into_owned();
        }
        for pattern in &self.stop_words {
            text = pattern.replace_all(&text, " ").into_owned();
        }
        text = self
            .numeric_token
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                let token = &caps[0];
                if token.len() == 6 || token.len() == 8 {
                    token.to_string()
                } else {
                    " ".to_string()
                }
            })
            .into_owned();
        text = self.punctuation.replace_all(&text, " ").into_owned();
        collapse_whitespace(&text)
    }
}
