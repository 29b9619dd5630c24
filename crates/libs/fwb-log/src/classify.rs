//! Severity classification of raw build output lines.
//!
//! Classification is an ordered rule table evaluated top-down: the first
//! matching rule decides the severity, and unmatched lines default to
//! [`LogLevel::Debug`]. The default table understands ninja-style output.

use regex::Regex;

use crate::prelude::*;
use crate::record::LogLevel;

/// One classification rule: lines matching `pattern` get `level`.
#[derive(Debug, Clone)]
pub struct OutputRule {
    pattern: Regex,
    level: LogLevel,
}

impl OutputRule {
    /// Compile a rule from a pattern string.
    pub fn new(pattern: &str, level: LogLevel) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            level,
        })
    }

    /// The severity this rule assigns.
    pub fn level(&self) -> LogLevel {
        self.level
    }
}

/// Ordered, first-match-wins severity classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<OutputRule>,
}

impl Classifier {
    /// Build a classifier from an ordered rule table.
    pub fn new(rules: Vec<OutputRule>) -> Self {
        Self { rules }
    }

    /// Classify one output line. Unmatched lines are `Debug`.
    pub fn classify(&self, line: &str) -> LogLevel {
        for rule in &self.rules {
            if rule.pattern.is_match(line) {
                return rule.level;
            }
        }
        LogLevel::Debug
    }
}

impl Default for Classifier {
    /// Rule table for ninja-driven builds: failed edges and compiler
    /// diagnostics are errors, edge progress and the linker memory report
    /// are informational, everything else is raw debug output.
    fn default() -> Self {
        let table = [
            (r"^FAILED: ", LogLevel::Error),
            (r"\berror: ", LogLevel::Error),
            (r"^ninja: error\b", LogLevel::Error),
            (r"^\[\d+/\d+\] ", LogLevel::Info),
            (r"^Memory region\b", LogLevel::Info),
            (r"^\s*(FLASH|RAM|SRAM|IDT_LIST):", LogLevel::Info),
        ];
        let rules = table
            .iter()
            .map(|(pattern, level)| {
                OutputRule::new(pattern, *level).expect("default rule pattern compiles")
            })
            .collect();
        Self { rules }
    }
}
