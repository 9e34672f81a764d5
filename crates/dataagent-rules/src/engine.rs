//! Rule engine pipeline: `load → match → merge → conflict_report → compose`.

use dataagent_core::rule::Rule;

use crate::conflict::{ConflictReport, detect_conflicts};
use crate::matcher::{MatchContext, MatchOutcome, match_rule};
use crate::merge::{ConflictNote, merge};
use crate::prompt::compose_prompt_section;

/// End-to-end result of evaluating a rule set against a context.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    /// The composed system-prompt section.
    pub prompt_section: String,
    /// Rules that ended up in the prompt section, in order.
    pub selected: Vec<Rule>,
    /// Notes from the merge pass (duplicates, overrides, size elisions).
    pub merge_notes: Vec<ConflictNote>,
    /// The independent conflict-detection report over every evaluated rule.
    pub conflict_report: ConflictReport,
}

/// A rule engine bound to one in-memory rule set.
///
/// Loading rules from disk is the caller's responsibility (see
/// `dataagent-rules::source` for the filesystem layout); the engine itself
/// only runs the match/merge/conflict/compose pipeline.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: Vec<Rule>,
    max_content_size: usize,
}

impl RuleEngine {
    /// Construct an engine over `rules`, bounding the prompt section to
    /// `max_content_size` bytes of rule content.
    #[must_use]
    pub fn new(rules: Vec<Rule>, max_content_size: usize) -> Self {
        Self {
            rules,
            max_content_size,
        }
    }

    /// Run the full pipeline against `ctx`.
    #[must_use]
    pub fn evaluate(&self, ctx: &MatchContext) -> EngineOutput {
        let matched: Vec<Rule> = self
            .rules
            .iter()
            .filter(|r| match_rule(r, ctx) == MatchOutcome::Matched)
            .cloned()
            .collect();

        let merge_outcome = merge(matched, self.max_content_size);
        let conflict_report = detect_conflicts(&self.rules);
        let prompt_section = compose_prompt_section(&merge_outcome.rules);

        EngineOutput {
            prompt_section,
            selected: merge_outcome.rules,
            merge_notes: merge_outcome.notes,
            conflict_report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataagent_core::rule::Scope;
    use std::collections::HashSet;

    #[test]
    fn evaluate_runs_the_full_pipeline() {
        let rules = vec![
            Rule::always(Scope::Global, "tone", "Be concise."),
            Rule::always(Scope::Project, "tone", "Be thorough."),
        ];
        let engine = RuleEngine::new(rules, 10_000);
        let output = engine.evaluate(&MatchContext {
            files: Vec::new(),
            query: String::new(),
            manual_refs: HashSet::new(),
        });
        assert_eq!(output.selected.len(), 1);
        assert!(output.prompt_section.contains("Be thorough."));
        assert_eq!(output.conflict_report.same_name.len(), 1);
    }
}
