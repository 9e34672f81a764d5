//! Rule-file loading (§4.6, pipeline step "load"): scans a set of search
//! paths for `*.toml` rule files and deserializes each into a [`Rule`].
//!
//! Grounded in `dataagent-config`'s `defaults.toml`-via-`toml::from_str`
//! idiom: one rule per file, parsed directly with `serde`'s `#[serde(rename
//! = "override")]` mapping already on [`Rule`] itself. A malformed file is
//! logged and skipped rather than aborting the whole load — an operator's
//! typo in one rule file must not take down every other rule.

use std::path::Path;

use dataagent_core::rule::Rule;
use tracing::warn;
use walkdir::WalkDir;

/// Load every `*.toml` rule file under each of `search_paths`, in
/// directory-listing order within a path and in `search_paths` order
/// across paths. Nonexistent directories are skipped silently — not every
/// scope (global/user/project/session) has rules configured.
#[must_use]
pub fn load_rules(search_paths: &[impl AsRef<Path>]) -> Vec<Rule> {
    let mut rules = Vec::new();
    for root in search_paths {
        let root = root.as_ref();
        if !root.is_dir() {
            continue;
        }
        let mut paths: Vec<_> = WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "toml"))
            .map(|entry| entry.path().to_path_buf())
            .collect();
        paths.sort();

        for path in paths {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str::<Rule>(&content) {
                    Ok(rule) => rules.push(rule),
                    Err(err) => warn!(path = %path.display(), error = %err, "skipping malformed rule file"),
                },
                Err(err) => warn!(path = %path.display(), error = %err, "failed to read rule file"),
            }
        }
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataagent_core::rule::Scope;

    #[test]
    fn loads_well_formed_rule_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tone.toml"),
            r#"
            name = "tone"
            scope = "global"
            inclusion = "always"
            priority = 0
            enabled = true
            override = false
            description = "house style"
            content = "Be concise."
            "#,
        )
        .unwrap();

        let rules = load_rules(&[dir.path()]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "tone");
        assert_eq!(rules[0].scope, Scope::Global);
    }

    #[test]
    fn skips_malformed_files_without_aborting_the_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not a rule").unwrap();
        std::fs::write(
            dir.path().join("good.toml"),
            r#"
            name = "good"
            scope = "user"
            inclusion = "always"
            priority = 0
            enabled = true
            override = false
            description = ""
            content = "fine"
            "#,
        )
        .unwrap();

        let rules = load_rules(&[dir.path()]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "good");
    }

    #[test]
    fn nonexistent_search_path_is_skipped_silently() {
        let rules = load_rules(&["/does/not/exist"]);
        assert!(rules.is_empty());
    }

    #[test]
    fn non_toml_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "not a rule").unwrap();
        assert!(load_rules(&[dir.path()]).is_empty());
    }
}
