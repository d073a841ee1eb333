//! Hierarchical context store and resolver for conversational agents.
//!
//! Context is recorded at three scope levels (institution, group,
//! individual) and merged on demand into one text per individual.

pub mod adapter;
pub mod backup;
pub mod db;
pub mod editing;
pub mod error;
pub mod ipc;
pub mod model;
pub mod profile;
pub mod prompt;
pub mod resolver;
pub mod roster;
pub mod store;

pub use adapter::{AgentContext, ContextAdapter};
pub use editing::{ContextEditor, NewInstitutionEntry};
pub use error::{ContextError, Result};
pub use model::{ContextEntry, EntryPatch, Group, Individual, Institution, Membership, ScopeLevel};
pub use profile::{AgentProfile, Personalities};
pub use prompt::PromptAssembler;
pub use resolver::{resolve, Contribution, ContextLayer, ResolvedContext, Supplement, SupplementProvider};
pub use roster::Roster;
pub use store::{ContextStore, SqliteStore};
