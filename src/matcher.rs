//! Rule matching over transaction descriptions.
//!
//! A matcher string uses `%` as "any run of characters". Without a leading
//! `%` the pattern is anchored to the start of the description, without a
//! trailing one to the end, so `%X%` means contains, `X%` starts-with, `%X`
//! ends-with and a bare `X` is an exact match. Matching is case-sensitive.

use crate::models::Rule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<String>,
    anchored_start: bool,
    anchored_end: bool,
}

impl Pattern {
    pub fn parse(matcher: &str) -> Self {
        Self {
            segments: matcher
                .split('%')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            anchored_start: !matcher.starts_with('%'),
            anchored_end: !matcher.ends_with('%'),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        let count = self.segments.len();
        if count == 0 {
            // "" only matches "", while "%" matches anything.
            return !(self.anchored_start && self.anchored_end) || text.is_empty();
        }

        let mut pos = 0usize;
        for (i, seg) in self.segments.iter().enumerate() {
            let first = i == 0;
            let last = i + 1 == count;

            if first && self.anchored_start {
                if !text.starts_with(seg.as_str()) {
                    return false;
                }
                pos = seg.len();
                if last && self.anchored_end {
                    return pos == text.len();
                }
                continue;
            }

            if last && self.anchored_end {
                return match text.len().checked_sub(seg.len()) {
                    Some(start) => start >= pos && text.ends_with(seg.as_str()),
                    None => false,
                };
            }

            match text[pos..].find(seg.as_str()) {
                Some(offset) => pos += offset + seg.len(),
                None => return false,
            }
        }
        true
    }
}

/// The winning rule for a description.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub rule_id: i64,
    pub category: String,
    pub confidence: u8,
}

/// Rules with their patterns compiled once, in caller order.
pub struct RuleSet<'a> {
    compiled: Vec<(&'a Rule, Pattern)>,
}

impl<'a> RuleSet<'a> {
    pub fn new(rules: &'a [Rule]) -> Self {
        Self {
            compiled: rules
                .iter()
                .map(|rule| (rule, Pattern::parse(&rule.matcher)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    /// Highest confidence wins; on a tie the earlier rule keeps the win.
    pub fn best_match(&self, description: &str) -> Option<RuleMatch> {
        let mut best: Option<&Rule> = None;
        for (rule, pattern) in &self.compiled {
            if !pattern.is_match(description) {
                continue;
            }
            if best.map_or(true, |b| rule.confidence > b.confidence) {
                best = Some(rule);
            }
        }
        best.map(|rule| RuleMatch {
            rule_id: rule.id,
            category: rule.category.clone(),
            confidence: rule.confidence,
        })
    }
}

pub fn best_match(description: &str, rules: &[Rule]) -> Option<RuleMatch> {
    RuleSet::new(rules).best_match(description)
}
