//! Per-row outcomes and the job summary built from them.

use stockroom_core::models::{IngestOutcome, IngestSummary, RowError, RowStatus};

/// Result of running one row through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Inserted,
    Skipped(String),
    Failed(String),
}

impl RowOutcome {
    pub fn status(&self) -> RowStatus {
        match self {
            RowOutcome::Inserted => RowStatus::Inserted,
            RowOutcome::Skipped(_) => RowStatus::Skipped,
            RowOutcome::Failed(_) => RowStatus::Failed,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            RowOutcome::Inserted => None,
            RowOutcome::Skipped(reason) | RowOutcome::Failed(reason) => Some(reason),
        }
    }
}

/// Accumulates exactly one outcome per row, in row order.
#[derive(Debug, Default)]
pub struct ResultLedger {
    outcomes: Vec<IngestOutcome>,
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, row_index: usize, outcome: RowOutcome) {
        debug_assert!(
            self.outcomes
                .last()
                .map_or(true, |last| last.row_index < row_index),
            "rows must be recorded in increasing order"
        );

        self.outcomes.push(IngestOutcome {
            row_index,
            status: outcome.status(),
            reason: outcome.reason().map(str::to_string),
        });
    }

    pub fn outcomes(&self) -> &[IngestOutcome] {
        &self.outcomes
    }

    pub fn summary(&self) -> IngestSummary {
        let mut summary = IngestSummary {
            total: self.outcomes.len(),
            ..Default::default()
        };

        for outcome in &self.outcomes {
            match outcome.status {
                RowStatus::Inserted => summary.inserted += 1,
                RowStatus::Skipped => summary.skipped += 1,
                RowStatus::Failed => summary.failed += 1,
            }
            if let Some(reason) = &outcome.reason {
                summary.errors.push(RowError {
                    row: outcome.row_index,
                    reason: reason.clone(),
                });
            }
        }

        summary
    }
}
