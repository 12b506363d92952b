//! Top-level driver of a sanitization run.
//!
//! ```text
//! Idle ──> Confirming ──> Running ──> Done
//!   │           └──────> Aborted
//!   └──> InfoReport ──> Done
//! ```
//!
//! Failures confined to one table (unknown reference, missing rule set,
//! failed update or truncate) are logged, recorded in the [`RunReport`] and
//! do not stop the run. Anything else ends the run, after the constraint
//! guard has been released.

use super::guard::ConstraintGuard;
use super::mutator::{ChunkedRowMutator, TableStats};
use super::progress::ProgressSink;
use super::resolver::TableResolver;
use super::truncator::Truncator;
use crate::Result;
use crate::adapters::SanitizerStore;
use crate::config::RunConfiguration;
use crate::error::SanitizerError;
use crate::fake::FakeData;
use crate::registry::ModelRegistry;
use serde::Serialize;
use std::fmt;

/// Orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Confirming,
    InfoReport,
    Running,
    Done,
    Aborted,
}

/// Yes/no gate presented before any mutation.
pub trait Confirmation: Send {
    /// Asks the operator; `Ok(false)` aborts the run.
    ///
    /// # Errors
    /// Returns an error if the answer cannot be obtained.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Confirmation with a predetermined answer (`--yes`, tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmation for FixedAnswer {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(self.0)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// Both passes ran (individual tables may still have failed)
    Completed,
    /// The operator declined; nothing was touched
    Aborted,
    /// The list for the selected pass was empty
    NoOp,
    /// Report only; nothing was touched
    InfoReport,
}

/// What a table is planned for in an info report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlannedAction {
    Sanitize,
    Truncate,
}

/// One entry of an info report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTable {
    pub action: PlannedAction,
    pub reference: String,
    pub table_name: String,
    pub row_count: u64,
}

/// A table that was sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizedTable {
    pub table_name: String,
    pub stats: TableStats,
}

/// A table that was skipped or failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableIssue {
    pub reference: String,
    pub reason: String,
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Redacted store endpoint
    pub endpoint: String,
    pub sanitized: Vec<SanitizedTable>,
    pub truncated: Vec<String>,
    /// Sanitize-list tables excluded by the table filter
    pub filtered_out: Vec<String>,
    /// Tables not processed (unknown reference, no rule set)
    pub skipped: Vec<TableIssue>,
    /// Tables whose processing started and failed
    pub failed: Vec<TableIssue>,
    /// Info report entries
    pub planned: Vec<PlannedTable>,
}

impl RunReport {
    fn new(outcome: RunOutcome, endpoint: String) -> Self {
        Self {
            outcome,
            endpoint,
            sanitized: Vec::new(),
            truncated: Vec::new(),
            filtered_out: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            planned: Vec::new(),
        }
    }

    /// Total rows rewritten across all tables.
    pub fn rows_sanitized(&self) -> u64 {
        self.sanitized
            .iter()
            .fold(0_u64, |acc, t| acc.saturating_add(t.stats.rows))
    }

    /// The closing line of a run.
    pub fn summary(&self) -> String {
        match self.outcome {
            RunOutcome::Aborted => "Aborted, no changes made".to_string(),
            RunOutcome::NoOp => "No tables configured for this run, nothing to do".to_string(),
            RunOutcome::InfoReport => format!(
                "{} table(s) would be affected on {}, {} skipped",
                self.planned.len(),
                self.endpoint,
                self.skipped.len()
            ),
            RunOutcome::Completed => format!(
                "Sanitized {} table(s) ({} rows), truncated {} table(s), {} skipped, {} failed",
                self.sanitized.len(),
                self.rows_sanitized(),
                self.truncated.len(),
                self.skipped.len(),
                self.failed.len()
            ),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Sequences confirmation, constraint guard, sanitize pass and truncate pass.
///
/// # Example
/// ```rust,no_run
/// use dbsanitizer_core::adapters::create_adapter;
/// use dbsanitizer_core::engine::{FixedAnswer, NoProgress, Orchestrator};
/// use dbsanitizer_core::{ModelRegistry, RunConfiguration};
///
/// # async fn example() -> dbsanitizer_core::Result<()> {
/// let store = create_adapter("sqlite:///tmp/shop.db").await?;
/// let registry = ModelRegistry::new();
/// let config = RunConfiguration::new().with_sanitize_list(["User"]);
///
/// let mut orchestrator = Orchestrator::new(store.as_ref(), &registry, config);
/// let report = orchestrator
///     .run(&mut FixedAnswer(true), &mut NoProgress)
///     .await?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<'a> {
    store: &'a dyn SanitizerStore,
    registry: &'a ModelRegistry,
    config: RunConfiguration,
    state: RunState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        store: &'a dyn SanitizerStore,
        registry: &'a ModelRegistry,
        config: RunConfiguration,
    ) -> Self {
        Self {
            store,
            registry,
            config,
            state: RunState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Text presented by the confirmation gate.
    pub fn confirmation_prompt(&self) -> String {
        format!(
            "This will irreversibly modify the data on {}. Do you wish to continue?",
            self.store.endpoint()
        )
    }

    /// Executes the run.
    ///
    /// # Errors
    /// Returns an error for an invalid configuration, a failed
    /// confirmation prompt, a constraint guard that cannot be acquired or
    /// released, or a store failure that is not confined to one table.
    pub async fn run(
        &mut self,
        confirmation: &mut dyn Confirmation,
        progress: &mut dyn ProgressSink,
    ) -> Result<RunReport> {
        self.config.validate()?;
        let endpoint = self.store.endpoint();

        if self.config.info_only {
            self.state = RunState::InfoReport;
            let report = self.info_report(endpoint).await?;
            self.state = RunState::Done;
            return Ok(report);
        }

        self.state = RunState::Confirming;
        if !confirmation.confirm(&self.confirmation_prompt())? {
            tracing::info!("Run declined by operator");
            self.state = RunState::Aborted;
            return Ok(RunReport::new(RunOutcome::Aborted, endpoint));
        }

        self.state = RunState::Running;
        let selected = if self.config.truncate_only {
            &self.config.truncate_list
        } else {
            &self.config.sanitize_list
        };
        if selected.is_empty() {
            tracing::warn!("No tables configured for this run");
            self.state = RunState::Done;
            return Ok(RunReport::new(RunOutcome::NoOp, endpoint));
        }

        let mut report = RunReport::new(RunOutcome::Completed, endpoint);
        let guard = ConstraintGuard::acquire(self.store).await?;

        let passes = self.run_passes(&mut report, progress).await;
        let released = guard.release().await;

        self.state = RunState::Done;
        passes?;
        released?;

        tracing::debug!("{}", report.summary());
        Ok(report)
    }

    async fn run_passes(
        &self,
        report: &mut RunReport,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        if self.config.truncate_only {
            tracing::info!("Skipping sanitize pass (truncate only)");
        } else {
            self.sanitize_pass(report, progress).await?;
        }
        self.truncate_pass(report).await
    }

    async fn sanitize_pass(
        &self,
        report: &mut RunReport,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        let resolver = TableResolver::new(self.registry, self.store);
        let mutator = ChunkedRowMutator::new(self.store, self.config.chunk_size);
        let mut fake = FakeData::from_seed(self.config.seed);

        for reference in &self.config.sanitize_list {
            let table = match resolver.resolve(reference).await {
                Ok(table) => table,
                Err(e) => {
                    record_failure(report, reference, e, true)?;
                    continue;
                }
            };

            let table_name = &table.descriptor.table_name;
            if !self.config.includes_table(table_name) {
                tracing::debug!("Table '{}' excluded by --tables", table_name);
                report.filtered_out.push(table_name.clone());
                continue;
            }

            tracing::info!("Sanitizing table '{}'", table_name);
            match mutator.sanitize(&table, &mut fake, progress).await {
                Ok(stats) => {
                    tracing::info!(
                        "Sanitized {} rows of '{}' in {} chunk(s)",
                        stats.rows,
                        table_name,
                        stats.chunks
                    );
                    report.sanitized.push(SanitizedTable {
                        table_name: table_name.clone(),
                        stats,
                    });
                }
                Err(e @ SanitizerError::MissingRuleSet { .. }) => {
                    record_failure(report, reference, e, true)?;
                }
                Err(e) => record_failure(report, reference, e, false)?,
            }
        }

        Ok(())
    }

    async fn truncate_pass(&self, report: &mut RunReport) -> Result<()> {
        let resolver = TableResolver::new(self.registry, self.store);
        let truncator = Truncator::new(self.store);

        for reference in &self.config.truncate_list {
            let table = match resolver.resolve(reference).await {
                Ok(table) => table,
                Err(e) => {
                    record_failure(report, reference, e, true)?;
                    continue;
                }
            };

            match truncator.truncate(&table.descriptor).await {
                Ok(()) => report.truncated.push(table.descriptor.table_name),
                Err(e) => record_failure(report, reference, e, false)?,
            }
        }

        Ok(())
    }

    async fn info_report(&self, endpoint: String) -> Result<RunReport> {
        let resolver = TableResolver::new(self.registry, self.store);
        let mut report = RunReport::new(RunOutcome::InfoReport, endpoint);

        let lists = [
            (PlannedAction::Sanitize, &self.config.sanitize_list),
            (PlannedAction::Truncate, &self.config.truncate_list),
        ];

        for (action, references) in lists {
            for reference in references {
                match resolver.resolve(reference).await {
                    Ok(table) => report.planned.push(PlannedTable {
                        action,
                        reference: reference.clone(),
                        table_name: table.descriptor.table_name,
                        row_count: table.descriptor.row_count,
                    }),
                    Err(e) => record_failure(&mut report, reference, e, true)?,
                }
            }
        }

        tracing::debug!("{}", report.summary());
        Ok(report)
    }
}

/// Records a table-scoped failure, or hands back any other error.
fn record_failure(
    report: &mut RunReport,
    reference: &str,
    error: SanitizerError,
    skipped: bool,
) -> Result<()> {
    if !error.is_table_scoped() {
        return Err(error);
    }

    let reason = error_chain(&error);
    if skipped {
        tracing::warn!("Skipping '{}': {}", reference, reason);
        report.skipped.push(TableIssue {
            reference: reference.to_string(),
            reason,
        });
    } else {
        tracing::warn!("Table '{}' failed: {}", reference, reason);
        report.failed.push(TableIssue {
            reference: reference.to_string(),
            reason,
        });
    }
    Ok(())
}

/// Renders an error with its sources, `outer: inner: root`. A source whose
/// text already ends the rendered chain is not repeated.
fn error_chain(error: &SanitizerError) -> String {
    let mut rendered = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
