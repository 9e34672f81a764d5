//! Rule data type (C7's data model, §3).

use serde::{Deserialize, Serialize};

/// The layer a rule belongs to, determining default precedence
/// (`global < user < project < session`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Applies to every user and assistant.
    Global,
    /// Applies to one user, across assistants/sessions.
    User,
    /// Applies within one project/workspace.
    Project,
    /// Applies to one session only.
    Session,
}

impl Scope {
    /// Numeric priority used by the merge pass (`global:1 < user:2 < project:3 < session:4`).
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            Self::Global => 1,
            Self::User => 2,
            Self::Project => 3,
            Self::Session => 4,
        }
    }
}

/// The condition that activates a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InclusionMode {
    /// Always matches.
    Always,
    /// Matches when any file in context matches `file_match_pattern`.
    FileMatch,
    /// Matches only when explicitly referenced by name.
    Manual,
}

/// A single rule contributing to the assembled system-prompt section.
///
/// Invariants: `inclusion == FileMatch` implies `file_match_pattern` is
/// `Some`; `Manual` rules require an explicit reference to activate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Primary key within `scope`.
    pub name: String,
    /// The rule's scope.
    pub scope: Scope,
    /// What activates the rule.
    pub inclusion: InclusionMode,
    /// Glob pattern required when `inclusion == FileMatch`.
    pub file_match_pattern: Option<String>,
    /// Tie-breaker within a scope; higher wins.
    pub priority: i32,
    /// Disabled rules never match.
    pub enabled: bool,
    /// Whether this rule wins over a same-named rule from a lower scope_priority.
    #[serde(rename = "override")]
    pub is_override: bool,
    /// One-line description, rendered under the rule's heading.
    pub description: String,
    /// The rule body, rendered verbatim in the prompt section.
    pub content: String,
}

impl Rule {
    /// Construct an always-included, non-overriding rule with default priority.
    #[must_use]
    pub fn always(scope: Scope, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope,
            inclusion: InclusionMode::Always,
            file_match_pattern: None,
            priority: 0,
            enabled: true,
            is_override: false,
            description: String::new(),
            content: content.into(),
        }
    }

    /// Whether the rule's invariants hold (`file_match` implies a pattern).
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.inclusion != InclusionMode::FileMatch || self.file_match_pattern.is_some()
    }
}
