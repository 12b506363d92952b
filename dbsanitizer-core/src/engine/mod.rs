//! Sanitization and truncation engine.
//!
//! # Module Structure
//! - `resolver`: configured reference → [`TableDescriptor`](crate::models::TableDescriptor)
//! - `values`: per-row replacement values
//! - `mutator`: chunked in-place sweep of one table
//! - `truncator`: unconditional table truncation
//! - `guard`: referential-integrity suspension around a run
//! - `progress`: observer contract for table sweeps
//! - `orchestrator`: the run state machine tying the above together
//!
//! Execution is strictly sequential: one table, one chunk, one row at a
//! time, over the store's single session.

pub mod guard;
pub mod mutator;
pub mod orchestrator;
pub mod progress;
pub mod resolver;
pub mod truncator;
pub mod values;

pub use guard::ConstraintGuard;
pub use mutator::{ChunkedRowMutator, TableStats};
pub use orchestrator::{
    Confirmation, FixedAnswer, Orchestrator, PlannedAction, PlannedTable, RunOutcome, RunReport,
    RunState, SanitizedTable, TableIssue,
};
pub use progress::{NoProgress, ProgressSink};
pub use resolver::{ResolvedTable, TableResolver};
pub use truncator::Truncator;
pub use values::resolve_row;
