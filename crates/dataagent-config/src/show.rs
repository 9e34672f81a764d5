//! Resolved configuration display and serialization.

use serde::Serialize;

use crate::merge::FieldSources;
use crate::types::Config;

/// The result of [`crate::Config::load`]: the merged config plus provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// The fully-merged, validated configuration.
    pub config: Config,
    /// Which layer set each leaf field, keyed by dotted path.
    #[serde(skip)]
    pub field_sources: FieldSources,
    /// Config files that were actually found and merged, in load order.
    pub loaded_files: Vec<String>,
}

/// Output format for `dataagent config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML, matching the on-disk file format.
    Toml,
    /// JSON.
    Json,
}

impl ResolvedConfig {
    /// Render the resolved configuration in the given format.
    ///
    /// # Panics
    /// Panics if `Config` somehow fails to serialize; this cannot happen
    /// for a config tree built from valid TOML/JSON.
    #[must_use]
    pub fn render(&self, format: ShowFormat) -> String {
        match format {
            ShowFormat::Toml => {
                toml::to_string_pretty(&self.config).expect("config always serializes")
            },
            ShowFormat::Json => {
                serde_json::to_string_pretty(&self.config).expect("config always serializes")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_toml_and_json_both_succeed() {
        let resolved = ResolvedConfig {
            config: Config::default(),
            field_sources: FieldSources::new(),
            loaded_files: Vec::new(),
        };
        assert!(resolved.render(ShowFormat::Toml).contains("bind_addr"));
        assert!(resolved.render(ShowFormat::Json).contains("bind_addr"));
    }
}
