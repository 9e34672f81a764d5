//! Prompt section composition (§4.6 "Prompt section").

use dataagent_core::rule::Rule;

/// Render the final merged rule list as a system-prompt section.
///
/// Emits a header, then per rule `"### <name>\n*<description>*\n<content>\n"`.
/// An empty list yields an empty string (no header either).
#[must_use]
pub fn compose_prompt_section(rules: &[Rule]) -> String {
    if rules.is_empty() {
        return String::new();
    }
    let mut out = String::from("## Active rules\n\n");
    for rule in rules {
        out.push_str(&format!(
            "### {}\n*{}*\n{}\n",
            rule.name, rule.description, rule.content
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataagent_core::rule::Scope;

    #[test]
    fn empty_rules_yield_empty_string() {
        assert_eq!(compose_prompt_section(&[]), "");
    }

    #[test]
    fn rules_are_rendered_with_heading_and_description() {
        let mut rule = Rule::always(Scope::Global, "style", "Use snake_case.");
        rule.description = "Naming convention".to_string();
        let out = compose_prompt_section(&[rule]);
        assert!(out.contains("### style"));
        assert!(out.contains("*Naming convention*"));
        assert!(out.contains("Use snake_case."));
    }
}
