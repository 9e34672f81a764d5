//! Conflict detection (§4.6 "Conflict detection"), a separate reporting pass
//! over every evaluated rule — independent of what actually matched.

use std::collections::HashMap;

use dataagent_core::rule::Rule;

/// Opposing keyword pairs used for the contradictory-rule heuristic.
const KEYWORD_PAIRS: &[(&[&str], &[&str])] = &[
    (&["always", "must", "required"], &["never", "forbidden", "prohibited"]),
    (&["enable", "allow", "permit"], &["disable", "deny", "block"]),
    (&["include", "add"], &["exclude", "remove"]),
];

/// A same-name conflict: more than one rule shares a name.
#[derive(Debug, Clone)]
pub struct SameNameConflict {
    /// The shared rule name.
    pub name: String,
    /// Every rule sharing that name.
    pub rules: Vec<Rule>,
    /// Index into `rules` of the one that would win the merge.
    pub winner_index: usize,
}

/// A heuristic warning that two rules' contents use opposing keyword sets.
#[derive(Debug, Clone)]
pub struct ContradictoryWarning {
    /// First rule's name.
    pub first: String,
    /// Second rule's name.
    pub second: String,
    /// The keyword found in `first`'s content.
    pub first_keyword: &'static str,
    /// The opposing keyword found in `second`'s content.
    pub second_keyword: &'static str,
}

/// Report of every conflict found among `rules`. Does not alter merge output.
#[derive(Debug, Clone, Default)]
pub struct ConflictReport {
    /// Rules sharing the same name.
    pub same_name: Vec<SameNameConflict>,
    /// Pairs whose content uses opposing keyword sets.
    pub contradictory: Vec<ContradictoryWarning>,
}

/// Run the conflict-detection pass over every evaluated rule (matched or not).
#[must_use]
pub fn detect_conflicts(rules: &[Rule]) -> ConflictReport {
    let mut by_name: HashMap<&str, Vec<&Rule>> = HashMap::new();
    for rule in rules {
        by_name.entry(rule.name.as_str()).or_default().push(rule);
    }

    let mut same_name = Vec::new();
    for (name, group) in &by_name {
        if group.len() <= 1 {
            continue;
        }
        let winner_index = group
            .iter()
            .enumerate()
            .max_by_key(|(_, r)| (r.scope.priority(), r.priority))
            .map(|(i, _)| i)
            .unwrap_or(0);
        same_name.push(SameNameConflict {
            name: (*name).to_string(),
            rules: group.iter().map(|r| (*r).clone()).collect(),
            winner_index,
        });
    }
    same_name.sort_by(|a, b| a.name.cmp(&b.name));

    let mut contradictory = Vec::new();
    for i in 0..rules.len() {
        for j in (i + 1)..rules.len() {
            if let Some((first_kw, second_kw)) = find_opposition(&rules[i].content, &rules[j].content) {
                contradictory.push(ContradictoryWarning {
                    first: rules[i].name.clone(),
                    second: rules[j].name.clone(),
                    first_keyword: first_kw,
                    second_keyword: second_kw,
                });
            }
        }
    }

    ConflictReport {
        same_name,
        contradictory,
    }
}

fn find_opposition(a: &str, b: &str) -> Option<(&'static str, &'static str)> {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    for (left_set, right_set) in KEYWORD_PAIRS {
        if let Some(found_a) = left_set.iter().find(|kw| a_lower.contains(*kw)) {
            if let Some(found_b) = right_set.iter().find(|kw| b_lower.contains(*kw)) {
                return Some((found_a, found_b));
            }
        }
        if let Some(found_a) = right_set.iter().find(|kw| a_lower.contains(*kw)) {
            if let Some(found_b) = left_set.iter().find(|kw| b_lower.contains(*kw)) {
                return Some((found_a, found_b));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataagent_core::rule::Scope;

    #[test]
    fn same_name_conflict_is_reported_with_correct_winner() {
        let mut a = Rule::always(Scope::Global, "style", "a");
        a.priority = 0;
        let mut b = Rule::always(Scope::Project, "style", "b");
        b.priority = 0;
        let report = detect_conflicts(&[a, b]);
        assert_eq!(report.same_name.len(), 1);
        assert_eq!(report.same_name[0].rules[report.same_name[0].winner_index].content, "b");
    }

    #[test]
    fn unique_names_report_no_conflict() {
        let a = Rule::always(Scope::Global, "a", "x");
        let b = Rule::always(Scope::Global, "b", "y");
        let report = detect_conflicts(&[a, b]);
        assert!(report.same_name.is_empty());
    }

    #[test]
    fn contradictory_keywords_are_flagged() {
        let a = Rule::always(Scope::Global, "a", "Tests are always required before merging.");
        let b = Rule::always(Scope::Global, "b", "Running tests locally is forbidden in CI.");
        let report = detect_conflicts(&[a, b]);
        assert_eq!(report.contradictory.len(), 1);
    }

    #[test]
    fn non_contradictory_rules_raise_no_warning() {
        let a = Rule::always(Scope::Global, "a", "Use four-space indentation.");
        let b = Rule::always(Scope::Global, "b", "Prefer descriptive variable names.");
        let report = detect_conflicts(&[a, b]);
        assert!(report.contradictory.is_empty());
    }
}
