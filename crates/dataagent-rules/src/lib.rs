#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Rule engine (C7) and memory loader (C8) for dataagent.
//!
//! The rule engine pipeline is `match → merge → conflict_report → compose`,
//! grounded in the same `globset` glob-matching idiom `dataagent-hitl` uses
//! for allowance patterns, generalized to rule-file glob matching. The
//! memory loader resolves per-`(user_id, assistant_id)` long-term memory
//! files and composes them into the system prompt alongside the rule
//! section.
//!
//! Neither component has a teacher-crate equivalent in the retrieved pack;
//! both are built fresh, in the idiom `dataagent-core`'s [`Rule`] data type
//! already establishes.
//!
//! [`Rule`]: dataagent_core::rule::Rule

/// Conflict detection, independent of the merge winner.
pub mod conflict;
/// Rule engine pipeline orchestration.
pub mod engine;
/// Rule engine error types.
pub mod error;
/// Rule matching against a turn's context.
pub mod matcher;
/// Per-user long-term memory loading (C8).
pub mod memory;
/// Merge pass: dedup, override resolution, size bound.
pub mod merge;
/// Final system-prompt section composition.
pub mod prompt;
/// `@name` and file-reference extraction from free text.
pub mod refs;
/// Rule-file loading from search-path directories (pipeline step "load").
pub mod source;

pub use conflict::{ConflictReport, ContradictoryWarning, SameNameConflict};
pub use engine::{EngineOutput, RuleEngine};
pub use error::{RuleError, RuleResult};
pub use matcher::{MatchContext, MatchOutcome, match_rule, matches_file_pattern};
pub use memory::{MemoryLoader, MemoryPaths, MemoryState, TenancyMode};
pub use merge::{ConflictNote, MergeOutcome, merge};
pub use prompt::compose_prompt_section;
pub use refs::{ExtractedRefs, extract_refs};
pub use source::load_rules;
