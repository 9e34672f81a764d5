//! Merge pass (§4.6 "Merge" and "Size bound").

use std::cmp::Reverse;
use std::collections::HashMap;

use dataagent_core::rule::Rule;

/// A note explaining why a rule was kept, replaced, or elided during merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictNote {
    /// The rule name the note concerns.
    pub name: String,
    /// Human-readable explanation, e.g. `"duplicate name, keeping project"`.
    pub message: String,
}

/// Result of the merge pass: the final ordered rule list plus notes.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Rules selected for the final prompt section, in append order.
    pub rules: Vec<Rule>,
    /// Notes about duplicates, overrides, and size-bound elisions.
    pub notes: Vec<ConflictNote>,
}

/// Sort matched rules by `(scope_priority DESC, rule.priority DESC, name ASC)`,
/// resolve same-name duplicates via the `override` flag, and stop appending
/// once the running content size would exceed `max_content_size`.
#[must_use]
pub fn merge(mut matched: Vec<Rule>, max_content_size: usize) -> MergeOutcome {
    matched.sort_by(|a, b| {
        Reverse(a.scope.priority())
            .cmp(&Reverse(b.scope.priority()))
            .then_with(|| Reverse(a.priority).cmp(&Reverse(b.priority)))
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut notes = Vec::new();
    let mut chosen: HashMap<String, Rule> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for rule in matched {
        match chosen.get(&rule.name) {
            None => {
                order.push(rule.name.clone());
                chosen.insert(rule.name.clone(), rule);
            },
            Some(existing) => {
                if rule.is_override {
                    notes.push(ConflictNote {
                        name: rule.name.clone(),
                        message: format!("overridden by {}", scope_label(rule.scope)),
                    });
                    chosen.insert(rule.name.clone(), rule);
                } else {
                    notes.push(ConflictNote {
                        name: rule.name.clone(),
                        message: format!(
                            "duplicate name, keeping {}",
                            scope_label(existing.scope)
                        ),
                    });
                },
            },
        }
    }

    let mut total = 0usize;
    let mut rules = Vec::new();
    for name in order {
        let rule = chosen.remove(&name).expect("just inserted");
        let next_len = rule.content.len();
        if total + next_len > max_content_size {
            notes.push(ConflictNote {
                name: rule.name.clone(),
                message: "elided: exceeds max_content_size".to_string(),
            });
            continue;
        }
        total += next_len;
        rules.push(rule);
    }

    MergeOutcome { rules, notes }
}

fn scope_label(scope: dataagent_core::rule::Scope) -> &'static str {
    match scope {
        dataagent_core::rule::Scope::Global => "global",
        dataagent_core::rule::Scope::User => "user",
        dataagent_core::rule::Scope::Project => "project",
        dataagent_core::rule::Scope::Session => "session",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataagent_core::rule::{Rule, Scope};

    fn rule(scope: Scope, name: &str, priority: i32, is_override: bool, content: &str) -> Rule {
        let mut r = Rule::always(scope, name, content);
        r.priority = priority;
        r.is_override = is_override;
        r
    }

    #[test]
    fn higher_scope_priority_wins_ties() {
        let global = rule(Scope::Global, "style", 0, false, "global rule");
        let project = rule(Scope::Project, "style", 0, false, "project rule");
        let outcome = merge(vec![global, project], 10_000);
        assert_eq!(outcome.rules.len(), 1);
        assert_eq!(outcome.rules[0].content, "project rule");
        assert!(
            outcome
                .notes
                .iter()
                .any(|n| n.message.contains("duplicate name"))
        );
    }

    #[test]
    fn override_flag_replaces_the_existing_winner() {
        let project = rule(Scope::Project, "style", 0, false, "project rule");
        let session = rule(Scope::Session, "style", 0, true, "session override");
        let outcome = merge(vec![project, session], 10_000);
        assert_eq!(outcome.rules[0].content, "session override");
        assert!(outcome.notes.iter().any(|n| n.message.contains("overridden by")));
    }

    #[test]
    fn size_bound_elides_lower_priority_rules() {
        let a = rule(Scope::Global, "a", 10, false, "x".repeat(8));
        let b = rule(Scope::Global, "b", 5, false, "y".repeat(8));
        let outcome = merge(vec![a, b], 10);
        assert_eq!(outcome.rules.len(), 1);
        assert_eq!(outcome.rules[0].name, "a");
        assert!(outcome.notes.iter().any(|n| n.message.contains("elided")));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let outcome = merge(vec![], 10_000);
        assert!(outcome.rules.is_empty());
        assert!(outcome.notes.is_empty());
    }
}
