//! Reference extraction from free text (§4.6 "Reference extraction").

use std::collections::HashSet;

use regex::Regex;
use std::sync::LazyLock;

static MANUAL_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_-]+)").unwrap());
static BACKTICK_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\s]+\.[A-Za-z0-9]+)`").unwrap());
static PATH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:file|path):(\S+)").unwrap());

/// Extracted references from a query's free text.
#[derive(Debug, Clone, Default)]
pub struct ExtractedRefs {
    /// `@<token>` manual rule references.
    pub manual_refs: HashSet<String>,
    /// Referenced file paths (backtick-quoted or `file:`/`path:` tokens).
    pub files: HashSet<String>,
}

/// Extract `@name` manual refs and file references from free text.
#[must_use]
pub fn extract_refs(text: &str) -> ExtractedRefs {
    let manual_refs = MANUAL_REF
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();

    let mut files: HashSet<String> = BACKTICK_FILE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();
    files.extend(PATH_TOKEN.captures_iter(text).map(|c| c[1].to_string()));

    ExtractedRefs { manual_refs, files }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_manual_refs() {
        let refs = extract_refs("please follow @style-guide and @rust-idioms");
        assert!(refs.manual_refs.contains("style-guide"));
        assert!(refs.manual_refs.contains("rust-idioms"));
    }

    #[test]
    fn extracts_backtick_file_refs() {
        let refs = extract_refs("see `src/lib.rs` for context");
        assert!(refs.files.contains("src/lib.rs"));
    }

    #[test]
    fn extracts_path_and_file_tokens() {
        let refs = extract_refs("check file:README.md and path:docs/guide.md");
        assert!(refs.files.contains("README.md"));
        assert!(refs.files.contains("docs/guide.md"));
    }

    #[test]
    fn plain_text_yields_nothing() {
        let refs = extract_refs("just a normal question about the weather");
        assert!(refs.manual_refs.is_empty());
        assert!(refs.files.is_empty());
    }
}
