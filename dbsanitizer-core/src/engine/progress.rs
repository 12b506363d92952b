//! Progress reporting contract.

/// Observer of a table sweep.
///
/// Receives one `start` per table, one `advance` per processed row and a
/// closing `finish`, also when the sweep ends early on an error. Purely
/// observational: nothing a sink does can affect the run.
pub trait ProgressSink: Send {
    /// A sweep over `table` begins; `total` is the advisory row count.
    fn start(&mut self, table: &str, total: u64);

    /// One row has been processed.
    fn advance(&mut self);

    /// The sweep has ended.
    fn finish(&mut self);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&mut self, _table: &str, _total: u64) {}

    fn advance(&mut self) {}

    fn finish(&mut self) {}
}
