//! Terminal progress bar for table sweeps.

use dbsanitizer_core::ProgressSink;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "[{elapsed_precise}] {prefix} {bar:40.cyan/blue} {pos:>7}/{len:7} ({percent}%) {msg}";

/// One bar per table, drawn on stderr.
pub struct BarProgress {
    style: ProgressStyle,
    hidden: bool,
    bar: Option<ProgressBar>,
}

impl BarProgress {
    /// Creates the sink; a hidden sink draws nothing (`--quiet`).
    pub fn new(hidden: bool) -> Self {
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

        Self {
            style,
            hidden,
            bar: None,
        }
    }
}

impl ProgressSink for BarProgress {
    fn start(&mut self, table: &str, total: u64) {
        let bar = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total)
        };
        bar.set_style(self.style.clone());
        bar.set_prefix(table.to_string());
        self.bar = Some(bar);
    }

    fn advance(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message("done");
        }
    }
}
