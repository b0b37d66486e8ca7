//! Trim rule DSL
//!
//! Users author small rules describing text to remove from many
//! descriptions at once. Rules are separated by newlines, `|`, or the token
//! ` OR `, and mix literal text with bracket placeholders: `[date]`,
//! `[number]`/`[numbers]`, `[letter]`, `[mix]`, `[fuzzy date]`, or a quoted
//! literal `["text"]`. Unrecognized bracket content matches as literal text,
//! brackets included.
//!
//! Compilation never fails: a rule that doesn't compile is dropped, and a
//! ruleset with zero valid rules is a no-op. Preview and commit share
//! `apply_trim`, so what the user approves is exactly what is applied.

use regex::{escape, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::canonical::collapse_whitespace;
use crate::lexicon::case_insensitive;

/// How a rule match maps to the kept text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrimMode {
    /// Keep only what follows the match
    StartToMatch,
    /// Remove just the matched span, joining the halves with a space
    MatchOnly,
    /// Keep only what precedes the match
    MatchToEnd,
}

/// One parsed element of a rule line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleToken {
    /// Literal rule text; its whitespace matches any run of whitespace
    Literal(String),
    /// `["text"]` — matched exactly as written
    Quoted(String),
    Date,
    Number,
    Letter,
    Mix,
    FuzzyDate,
    /// Bracket content we don't recognize, matched as literal text
    /// including the brackets
    UnknownAsLiteral(String),
}

/// Numeric day/month/year, day + month name + optional year, month name +
/// year, or a bare 6-digit date.
const DATE_PATTERN: &str = r"(?:\b\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}\b|\b\d{1,2}\s*(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*(?:\s*\d{2,4})?\b|\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{2,4}\b|\b\d{6}\b)";
const NUMBER_PATTERN: &str = r"\b\d+\b";
const LETTER_PATTERN: &str = r"\b[A-Za-z0-9\-]{1,5}\b";
const MIX_PATTERN: &str = r"\b[A-Za-z0-9]+\b";
/// Month-name fragment with optional digits glued on either side; no
/// boundary enforcement so OCR noise still matches.
const FUZZY_DATE_PATTERN: &str =
    r"\b\d*(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\d*\b";

/// Rule separators: newline, pipe, or a whitespace-bounded OR.
const RULE_SEPARATOR: &str = r"(?i)\r?\n|\||\s+OR\s+";

/// A single compiled trim rule with the text it was built from.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub source: String,
    matcher: Regex,
}

/// Ordered, reusable set of compiled trim rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    rules: Vec<CompiledRule>,
}

impl CompiledRuleSet {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }
}

/// Preview line for one description: what it is and what it would become.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimPreview {
    pub original: String,
    pub result: String,
}

/// Compile user rule text into a reusable rule set. Never fails: lines
/// that don't compile are dropped with a warning.
pub fn compile_trim_rules(rule_text: &str) -> CompiledRuleSet {
    let separator = match Regex::new(RULE_SEPARATOR) {
        Ok(re) => re,
        Err(_) => return CompiledRuleSet::default(),
    };

    let mut rules = Vec::new();
    for raw_rule in separator.split(rule_text) {
        let rule = raw_rule.trim();
        if rule.is_empty() {
            continue;
        }
        let pattern = pattern_for(&tokenize(rule));
        if pattern.is_empty() {
            continue;
        }
        match case_insensitive(&pattern) {
            Ok(matcher) => rules.push(CompiledRule {
                source: rule.to_string(),
                matcher,
            }),
            Err(err) => {
                warn!("Dropping trim rule {rule:?}: {err}");
            }
        }
    }
    debug!("Compiled {} trim rule(s)", rules.len());
    CompiledRuleSet { rules }
}

/// Split a rule line into literal runs and bracket tokens.
fn tokenize(rule: &str) -> Vec<RuleToken> {
    let mut tokens = Vec::new();
    let mut rest = rule;
    loop {
        let Some(open) = rest.find('[') else { break };
        let Some(close) = rest[open..].find(']').map(|i| open + i) else {
            break;
        };
        if open > 0 {
            tokens.push(RuleToken::Literal(rest[..open].to_string()));
        }
        tokens.push(classify_bracket(&rest[open + 1..close]));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        tokens.push(RuleToken::Literal(rest.to_string()));
    }
    tokens
}

fn classify_bracket(content: &str) -> RuleToken {
    match content.to_lowercase().as_str() {
        "date" => RuleToken::Date,
        "number" | "numbers" => RuleToken::Number,
        "letter" => RuleToken::Letter,
        "mix" => RuleToken::Mix,
        "fuzzy date" => RuleToken::FuzzyDate,
        _ => match content
            .strip_prefix('"')
            .and_then(|inner| inner.strip_suffix('"'))
        {
            Some(inner) => RuleToken::Quoted(inner.to_string()),
            None => RuleToken::UnknownAsLiteral(content.to_string()),
        },
    }
}

fn pattern_for(tokens: &[RuleToken]) -> String {
    let mut pattern = String::new();
    let mut after_placeholder = false;
    for token in tokens {
        let expansion = match token {
            RuleToken::Literal(text) => flex_whitespace(&escape(text)),
            RuleToken::Quoted(text) => escape(text),
            RuleToken::Date => DATE_PATTERN.to_string(),
            RuleToken::Number => NUMBER_PATTERN.to_string(),
            RuleToken::Letter => LETTER_PATTERN.to_string(),
            RuleToken::Mix => MIX_PATTERN.to_string(),
            RuleToken::FuzzyDate => FUZZY_DATE_PATTERN.to_string(),
            RuleToken::UnknownAsLiteral(content) => escape(&format!("[{content}]")),
        };
        let is_placeholder = matches!(
            token,
            RuleToken::Date
                | RuleToken::Number
                | RuleToken::Letter
                | RuleToken::Mix
                | RuleToken::FuzzyDate
        );
        // back-to-back placeholders like [date][number] still match
        // whitespace-separated tokens
        if after_placeholder && is_placeholder {
            pattern.push_str(r"\s*");
        }
        pattern.push_str(&expansion);
        after_placeholder = is_placeholder;
    }
    pattern
}

/// Replace each whitespace run in already-escaped literal text with `\s*`.
fn flex_whitespace(escaped: &str) -> String {
    let mut out = String::new();
    let mut in_whitespace = false;
    for c in escaped.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push_str(r"\s*");
                in_whitespace = true;
            }
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Apply a rule set to one piece of text.
///
/// Rules are tried in file order and the first whose pattern matches wins.
/// The result is whitespace-collapsed and trimmed; text is returned
/// unchanged when no rule matches, and the pre-trim value is returned if
/// trimming would leave nothing.
pub fn apply_trim(text: &str, rules: &CompiledRuleSet, mode: TrimMode) -> String {
    for rule in &rules.rules {
        let Some(found) = rule.matcher.find(text) else {
            continue;
        };
        let result = match mode {
            TrimMode::StartToMatch => text[found.end()..].to_string(),
            TrimMode::MatchToEnd => text[..found.start()].to_string(),
            TrimMode::MatchOnly => {
                format!("{} {}", &text[..found.start()], &text[found.end()..])
            }
        };
        let result = collapse_whitespace(&result);
        if result.is_empty() {
            return text.to_string();
        }
        return result;
    }
    text.to_string()
}

/// Preview the effect of a rule set over many descriptions.
///
/// Calls the same function the commit path uses, so preview output equals
/// committed output for identical input.
pub fn preview_trim(items: &[String], rules: &CompiledRuleSet, mode: TrimMode) -> Vec<TrimPreview> {
    items
        .iter()
        .map(|item| TrimPreview {
            original: item.clone(),
            result: apply_trim(item, rules, mode),
        })
        .collect()
}
