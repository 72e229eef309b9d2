//! Ordered catalog of error signatures.
//!
//! Rules are checked strictly in catalog order and the first match wins, so
//! the position of a rule is part of its meaning: runtime exception names
//! come first, then HTTP status kinds, then the broad database, network and
//! timeout categories.

mod rules;

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub use rules::{RuleSpec, DEFAULT_RULES};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    #[default]
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(anyhow!("unknown severity '{other}'")),
        }
    }
}

/// One detection rule with the canned texts used to enrich its matches.
#[derive(Debug, Clone)]
pub struct ErrorRule {
    kind: String,
    regex: Regex,
    severity: Severity,
    analysis_template: Option<String>,
    default_solution: Option<String>,
    code_fix: Option<String>,
}

impl ErrorRule {
    /// Compile `pattern` case-insensitively.
    pub fn new(kind: impl Into<String>, pattern: &str) -> Result<Self> {
        let kind = kind.into();
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("invalid pattern for {kind}: {pattern}"))?;

        Ok(Self {
            kind,
            regex,
            severity: Severity::Low,
            analysis_template: None,
            default_solution: None,
            code_fix: None,
        })
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// `{message}` in the template is replaced by the extracted message.
    pub fn with_analysis(mut self, template: impl Into<String>) -> Self {
        self.analysis_template = Some(template.into());
        self
    }

    pub fn with_solution(mut self, solution: impl Into<String>) -> Self {
        self.default_solution = Some(solution.into());
        self
    }

    pub fn with_code_fix(mut self, code_fix: impl Into<String>) -> Self {
        self.code_fix = Some(code_fix.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn analysis_template(&self) -> Option<&str> {
        self.analysis_template.as_deref()
    }

    pub fn default_solution(&self) -> Option<&str> {
        self.default_solution.as_deref()
    }

    pub fn code_fix(&self) -> Option<&str> {
        self.code_fix.as_deref()
    }

    /// Search `line` and return the human-readable message: the first
    /// capture group when the pattern has one, else the whole match.
    pub fn extract(&self, line: &str) -> Option<String> {
        let captures = self.regex.captures(line)?;
        let matched = if self.regex.captures_len() > 1 {
            captures.get(1).or_else(|| captures.get(0))
        } else {
            captures.get(0)
        }?;
        Some(matched.as_str().trim().to_string())
    }
}

impl TryFrom<&RuleSpec> for ErrorRule {
    type Error = anyhow::Error;

    fn try_from(spec: &RuleSpec) -> Result<Self> {
        let mut rule = ErrorRule::new(spec.kind, spec.pattern)?.with_severity(spec.severity);
        if let Some(template) = spec.analysis {
            rule = rule.with_analysis(template);
        }
        if let Some(solution) = spec.solution {
            rule = rule.with_solution(solution);
        }
        if let Some(code_fix) = spec.code_fix {
            rule = rule.with_code_fix(code_fix);
        }
        Ok(rule)
    }
}

/// Immutable, ordered rule list. Patterns are compiled once here and reused
/// for every line.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    rules: Vec<ErrorRule>,
}

impl PatternCatalog {
    pub fn new(rules: Vec<ErrorRule>) -> Result<Self> {
        for (index, rule) in rules.iter().enumerate() {
            if rules[..index].iter().any(|other| other.kind == rule.kind) {
                return Err(anyhow!("duplicate error kind '{}' in catalog", rule.kind));
            }
        }
        Ok(Self { rules })
    }

    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self> {
        let rules = specs
            .iter()
            .map(ErrorRule::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::new(rules)
    }

    /// The built-in catalog.
    pub fn builtin() -> Result<Self> {
        Self::from_specs(DEFAULT_RULES)
    }

    pub fn rules(&self) -> &[ErrorRule] {
        &self.rules
    }

    pub fn get(&self, kind: &str) -> Option<&ErrorRule> {
        self.rules.iter().find(|rule| rule.kind == kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.kind.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
