use regex::Regex;
use std::path::Path;

use crate::error::HarnessError;

/// Known benign console noise. Anything a page under test emits that does
/// not match one of these fails the run.
pub const DEFAULT_ALLOWED_PATTERNS: &[&str] = &[
    r"(?i)content.?security.?policy",
    r"(?i)report-only",
    r"(?i)google-?analytics|googletagmanager|gtag",
    r"(?i)segment\.(io|com)",
    r"(?i)favicon\.ico.*404",
    r"(?i)third-party cookie",
];

/// Collects console error lines over a page's lifetime and splits them into
/// allow-listed noise and genuine failures at assertion time.
#[derive(Debug)]
pub struct ConsoleErrorLog {
    allow: Vec<Regex>,
    errors: Vec<String>,
}

impl ConsoleErrorLog {
    pub fn new() -> Self {
        Self::with_patterns(DEFAULT_ALLOWED_PATTERNS)
            .expect("built-in allow-list patterns are valid")
    }

    pub fn with_patterns(patterns: &[&str]) -> Result<Self, HarnessError> {
        let allow = patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| HarnessError::Pattern(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ConsoleErrorLog {
            allow,
            errors: Vec::new(),
        })
    }

    pub fn record(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn is_allowed(&self, message: &str) -> bool {
        self.allow.iter().any(|re| re.is_match(message))
    }

    /// Everything recorded that the allow-list does not cover.
    pub fn unexpected(&self) -> Vec<&str> {
        self.errors
            .iter()
            .map(|s| s.as_str())
            .filter(|msg| !self.is_allowed(msg))
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.unexpected().is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Default for ConsoleErrorLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a captured console log (one message per line) through the default
/// allow-list and return the offending lines.
pub fn check_file(path: &Path) -> Result<Vec<String>, HarnessError> {
    let content = std::fs::read_to_string(path)?;
    let mut log = ConsoleErrorLog::new();
    for line in content.lines() {
        let line = line.trim();
        if !line.is_empty() {
            log.record(line);
        }
    }
    Ok(log.unexpected().into_iter().map(|s| s.to_string()).collect())
}
