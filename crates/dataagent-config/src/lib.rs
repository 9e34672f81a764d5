#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Unified configuration system for the dataagent runtime.
//!
//! This crate provides a single [`Config`] type covering the server bind
//! address, session lifetime, MCP connection pool caps, HITL timeout,
//! connection manager capacity, storage backend selection, rule engine
//! search paths, and logging.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dataagent_config::Config;
//!
//! // Load with full precedence chain (defaults → system → user → workspace → env).
//! let resolved = Config::load(Some(std::path::Path::new("."))).unwrap();
//! let config = resolved.config;
//! println!("Binding to {}:{}", config.server.bind_addr, config.server.port);
//! ```
//!
//! # Configuration Precedence
//!
//! From lowest to highest priority (later layers override earlier ones):
//!
//! 1. **Embedded defaults** (`defaults.toml` compiled into the binary)
//! 2. **System** (`/etc/dataagent/config.toml`)
//! 3. **User** (`~/.dataagent/config.toml`)
//! 4. **Workspace** (`{workspace}/.dataagent/config.toml`)
//! 5. **Environment variables** (`DATAAGENT_*`) — fills only fields still unset
//!
//! # Design
//!
//! This crate has **no dependencies on other internal dataagent crates**. It
//! only depends on `serde`, `toml`, `thiserror`, `tracing`, and `directories`.
//! Conversion from config sections to domain types happens at the integration
//! boundary (CLI startup, server init) in the crates that consume them.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging with precedence.
pub mod merge;
/// Resolved configuration display and serialization.
pub mod show;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

// Re-export primary types at the crate root.
pub use error::{ConfigError, ConfigResult};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(workspace_root: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, None)
    }

    /// Load configuration with an explicit home directory override.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load_with_home(
        workspace_root: Option<&std::path::Path>,
        home_dir: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, Some(home_dir))
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
