//! Memory loader (§4.7 C8): per-`(user_id, assistant_id)` long-term memory.

use std::path::{Path, PathBuf};

/// Resolved filesystem locations for one `(user_id, assistant_id)` pair.
#[derive(Debug, Clone)]
pub struct MemoryPaths {
    /// `<data_root>/users/<user_id>/<assistant_id>/agent.md` (multi-tenant) or
    /// `<data_root>/<assistant_id>/agent.md` (single-tenant).
    pub user_memory_path: PathBuf,
    /// `<project_root>/.<app>/agent.md`, present only when a project root
    /// was supplied.
    pub project_memory_path: Option<PathBuf>,
}

/// Whether memory is resolved per-user (multi-tenant) or per-assistant only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenancyMode {
    /// `<data_root>/users/<user_id>/<assistant_id>/agent.md`.
    MultiTenant,
    /// `<data_root>/<assistant_id>/agent.md`.
    SingleTenant,
}

/// Lazily-loaded memory content for one session/turn sequence.
///
/// The `loaded` flag implements the "before each agent run: if the state has
/// no loaded memory, read" behavior — once populated, a state is never
/// re-read within its lifetime.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    loaded: bool,
    user_memory: String,
    project_memory: String,
}

impl MemoryState {
    /// Whether memory has already been loaded into this state.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn memory_section(&self) -> String {
        if self.user_memory.is_empty() && self.project_memory.is_empty() {
            return String::new();
        }
        let mut out = String::from("## Memory\n\n");
        if !self.user_memory.is_empty() {
            out.push_str(&self.user_memory);
            out.push('\n');
        }
        if !self.project_memory.is_empty() {
            out.push_str(&self.project_memory);
            out.push('\n');
        }
        out
    }
}

/// Resolves memory paths, loads memory files, and composes the final system
/// prompt combining memory with the base prompt.
#[derive(Debug, Clone)]
pub struct MemoryLoader {
    data_root: PathBuf,
    app_name: String,
    tenancy: TenancyMode,
}

impl MemoryLoader {
    /// Construct a loader rooted at `data_root`, using `app_name` for the
    /// project-level `.{app_name}/agent.md` convention.
    #[must_use]
    pub fn new(data_root: impl Into<PathBuf>, app_name: impl Into<String>, tenancy: TenancyMode) -> Self {
        Self {
            data_root: data_root.into(),
            app_name: app_name.into(),
            tenancy,
        }
    }

    /// Resolve the memory file locations for a `(user_id, assistant_id)` pair.
    #[must_use]
    pub fn resolve_paths(&self, user_id: &str, assistant_id: &str, project_root: Option<&Path>) -> MemoryPaths {
        let user_memory_path = match self.tenancy {
            TenancyMode::MultiTenant => self
                .data_root
                .join("users")
                .join(user_id)
                .join(assistant_id)
                .join("agent.md"),
            TenancyMode::SingleTenant => self.data_root.join(assistant_id).join("agent.md"),
        };
        let project_memory_path = project_root.map(|root| root.join(format!(".{}", self.app_name)).join("agent.md"));
        MemoryPaths {
            user_memory_path,
            project_memory_path,
        }
    }

    /// Load memory into `state` if it hasn't already been loaded this
    /// lifetime. Missing files and I/O errors are swallowed — the run
    /// proceeds with whatever could be read (possibly empty).
    pub fn load_if_needed(
        &self,
        state: &mut MemoryState,
        user_id: &str,
        assistant_id: &str,
        project_root: Option<&Path>,
    ) {
        if state.loaded {
            return;
        }
        let paths = self.resolve_paths(user_id, assistant_id, project_root);
        state.user_memory = std::fs::read_to_string(&paths.user_memory_path).unwrap_or_default();
        state.project_memory = paths
            .project_memory_path
            .as_ref()
            .map(|p| std::fs::read_to_string(p).unwrap_or_default())
            .unwrap_or_default();
        state.loaded = true;
    }

    /// Compose the final system prompt: memory section, then the base
    /// prompt, then instructions telling the model where to write updates.
    #[must_use]
    pub fn compose_system_prompt(
        &self,
        state: &MemoryState,
        base_system_prompt: &str,
        user_id: &str,
        assistant_id: &str,
        project_root: Option<&Path>,
    ) -> String {
        let paths = self.resolve_paths(user_id, assistant_id, project_root);
        let mut instructions = format!(
            "You have long-term memory. Persist durable facts by writing to {}.",
            paths.user_memory_path.display()
        );
        if let Some(project_path) = &paths.project_memory_path {
            instructions.push_str(&format!(
                " Project-scoped notes go in {}.",
                project_path.display()
            ));
        }

        let memory_section = state.memory_section();
        if memory_section.is_empty() {
            format!("{base_system_prompt}\n\n{instructions}")
        } else {
            format!("{memory_section}\n\n{base_system_prompt}\n\n{instructions}")
        }
    }

    /// Remove the user-memory directory recursively.
    ///
    /// Returns `false` (not an error) if the directory doesn't exist.
    pub fn clear_memory(&self, user_id: &str, assistant_id: &str) -> bool {
        let dir = match self.tenancy {
            TenancyMode::MultiTenant => self.data_root.join("users").join(user_id).join(assistant_id),
            TenancyMode::SingleTenant => self.data_root.join(assistant_id),
        };
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }
}
