//! Rule matching (§4.6 "Match").

use std::collections::HashSet;

use dataagent_core::rule::{InclusionMode, Rule};
use globset::GlobBuilder;

/// Context a rule is matched against.
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    /// File paths touched or referenced by the current turn.
    pub files: Vec<String>,
    /// The user's free-text query, used only for reference extraction upstream.
    pub query: String,
    /// Rule names explicitly referenced (via `@name` or similar) this turn.
    pub manual_refs: HashSet<String>,
}

/// Why a rule did or did not match, for conflict-report / debug purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The rule matched and should be considered for merging.
    Matched,
    /// The rule is disabled.
    Disabled,
    /// `inclusion=manual` and the rule wasn't referenced this turn.
    NotReferenced,
    /// `inclusion=file_match` and no file in context matched the pattern.
    NoFileMatch,
}

/// Evaluate a single rule against a match context.
#[must_use]
pub fn match_rule(rule: &Rule, ctx: &MatchContext) -> MatchOutcome {
    if !rule.enabled {
        return MatchOutcome::Disabled;
    }
    match rule.inclusion {
        InclusionMode::Always => MatchOutcome::Matched,
        InclusionMode::Manual => {
            if ctx.manual_refs.contains(&rule.name) {
                MatchOutcome::Matched
            } else {
                MatchOutcome::NotReferenced
            }
        },
        InclusionMode::FileMatch => {
            let Some(pattern) = rule.file_match_pattern.as_deref() else {
                return MatchOutcome::NoFileMatch;
            };
            if ctx.files.iter().any(|f| matches_file_pattern(pattern, f)) {
                MatchOutcome::Matched
            } else {
                MatchOutcome::NoFileMatch
            }
        },
    }
}

/// Glob-match a file path against a rule's `file_match_pattern`.
///
/// `*`/`?`/`[...]` use standard (non-separator-crossing) glob semantics; `**`
/// crosses path segments. A bare pattern with no `/` also matches the
/// trailing path component, so `"agent.md"` matches `"notes/agent.md"`.
#[must_use]
pub fn matches_file_pattern(pattern: &str, path: &str) -> bool {
    let Some(full_matcher) = compile(pattern) else {
        return false;
    };
    if full_matcher.is_match(path) {
        return true;
    }
    if !pattern.contains('/') {
        if let Some(trailing) = path.rsplit('/').next() {
            return full_matcher.is_match(trailing);
        }
    }
    false
}

fn compile(pattern: &str) -> Option<globset::GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .ok()
        .map(|g| g.compile_matcher())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(files: &[&str]) -> MatchContext {
        MatchContext {
            files: files.iter().map(ToString::to_string).collect(),
            query: String::new(),
            manual_refs: HashSet::new(),
        }
    }

    #[test]
    fn disabled_rule_never_matches() {
        let mut rule = Rule::always(dataagent_core::rule::Scope::Global, "r", "c");
        rule.enabled = false;
        assert_eq!(match_rule(&rule, &ctx(&[])), MatchOutcome::Disabled);
    }

    #[test]
    fn always_rule_matches_unconditionally() {
        let rule = Rule::always(dataagent_core::rule::Scope::Global, "r", "c");
        assert_eq!(match_rule(&rule, &ctx(&[])), MatchOutcome::Matched);
    }

    #[test]
    fn manual_rule_requires_explicit_reference() {
        let mut rule = Rule::always(dataagent_core::rule::Scope::User, "explain", "c");
        rule.inclusion = InclusionMode::Manual;
        assert_eq!(match_rule(&rule, &ctx(&[])), MatchOutcome::NotReferenced);

        let mut refs = HashSet::new();
        refs.insert("explain".to_string());
        let c = MatchContext {
            manual_refs: refs,
            ..ctx(&[])
        };
        assert_eq!(match_rule(&rule, &c), MatchOutcome::Matched);
    }

    #[test]
    fn file_match_bare_name_matches_trailing_component() {
        assert!(matches_file_pattern("agent.md", "notes/agent.md"));
        assert!(matches_file_pattern("agent.md", "agent.md"));
        assert!(!matches_file_pattern("agent.md", "agent.md.bak"));
    }

    #[test]
    fn file_match_double_star_crosses_segments() {
        assert!(matches_file_pattern("src/**/*.rs", "src/a/b/c.rs"));
        assert!(!matches_file_pattern("src/*.rs", "src/a/b/c.rs"));
    }

    #[test]
    fn file_match_rule_matches_when_any_file_matches() {
        let mut rule = Rule::always(dataagent_core::rule::Scope::Project, "rust-style", "c");
        rule.inclusion = InclusionMode::FileMatch;
        rule.file_match_pattern = Some("**/*.rs".to_string());
        assert_eq!(
            match_rule(&rule, &ctx(&["README.md", "src/lib.rs"])),
            MatchOutcome::Matched
        );
        assert_eq!(match_rule(&rule, &ctx(&["README.md"])), MatchOutcome::NoFileMatch);
    }

    #[test]
    fn file_match_without_pattern_never_matches() {
        let mut rule = Rule::always(dataagent_core::rule::Scope::Project, "broken", "c");
        rule.inclusion = InclusionMode::FileMatch;
        rule.file_match_pattern = None;
        assert_eq!(match_rule(&rule, &ctx(&["a.rs"])), MatchOutcome::NoFileMatch);
    }
}
