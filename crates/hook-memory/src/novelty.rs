//! Novelty analysis over captured memory content.
//!
//! A lightweight, deterministic pass that surfaces fragments worth keeping
//! as long-term learnings. Each fragment carries a signal category and a
//! confidence directly comparable against a caller-side threshold.

use regex::Regex;
use serde::{Deserialize, Serialize};

// Lines shorter than this are headers or fragments, not learnings.
const MIN_LINE_LENGTH: usize = 16;
// Lines longer than this are prose dumps with little concentrated signal.
const MAX_LINE_LENGTH: usize = 600;
// Upper bound on fragments surfaced per run.
const MAX_EXTRACTS: usize = 8;

/// A scored fragment surfaced by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extract {
    /// The fragment text
    pub content: String,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
    /// Signal category that flagged this fragment
    pub signal: String,
}

/// Analyzer output for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub extracts: Vec<Extract>,
}

/// Analyze changed text and return scored candidate fragments.
///
/// Deterministic: the same input always yields the same extracts, in input
/// order. Confidences are fixed per signal category; the first matching
/// category claims a line.
pub fn analyze(text: &str) -> Analysis {
    let patterns = signal_patterns();
    let mut extracts = Vec::new();

    for line in candidate_lines(text) {
        for (signal, confidence, re) in &patterns {
            if re.is_match(line) {
                extracts.push(Extract {
                    content: line.to_string(),
                    confidence: *confidence,
                    signal: (*signal).to_string(),
                });
                break;
            }
        }
        if extracts.len() >= MAX_EXTRACTS {
            break;
        }
    }

    Analysis { extracts }
}

/// Signal categories with their fixed confidence weights, most specific
/// first.
fn signal_patterns() -> Vec<(&'static str, f64, Regex)> {
    let table: &[(&str, f64, &str)] = &[
        (
            "error-pattern",
            0.9,
            r"(?i)\b(fail(s|ed|ing)?|error|crash(es|ed)?|broken|hangs?)\b.*\b(because|due to|caused by|when|unless)\b",
        ),
        (
            "insight",
            0.85,
            r"(?i)(\b(turns out|learned that|realized|the key is|gotcha)\b|important:)",
        ),
        (
            "decision",
            0.8,
            r"(?i)\b(decided (to|on|against)|chose|settled on|going with|will use)\b",
        ),
        (
            "workaround",
            0.8,
            r"(?i)\b(workaround|work around|instead of|to avoid)\b",
        ),
        (
            "preference",
            0.75,
            r"(?i)\b(prefer(s|red)?|always use|never use|convention)\b",
        ),
        (
            "todo",
            0.4,
            r"(?i)\b(todo|tbd|followup|follow-up)\b",
        ),
    ];

    table
        .iter()
        .filter_map(|(signal, confidence, pattern)| {
            Regex::new(pattern).ok().map(|re| (*signal, *confidence, re))
        })
        .collect()
}

/// Split text into scoreable lines: bullet/heading markers stripped,
/// questions and out-of-range lengths dropped.
fn candidate_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '#']).trim())
        .filter(|line| line.len() >= MIN_LINE_LENGTH && line.len() <= MAX_LINE_LENGTH)
        .filter(|line| !line.ends_with('?'))
}
