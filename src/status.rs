// ABOUTME: Read-only status reporting over the shared state table.
// ABOUTME: Snapshots and renders per-service state; never mutates.

use crate::orchestrate::{ServiceRow, StateTable};
use std::sync::Arc;

/// Read-only view over the executor's state table.
///
/// Holds its own handle so it can be read concurrently while the executor
/// runs; all access goes through the table's read lock.
#[derive(Clone)]
pub struct StatusReporter {
    table: Arc<StateTable>,
}

impl StatusReporter {
    pub fn new(table: Arc<StateTable>) -> Self {
        Self { table }
    }

    /// Current per-service rows, name ascending.
    pub fn snapshot(&self) -> Vec<ServiceRow> {
        self.table.snapshot()
    }

    /// Render the snapshot as aligned text lines.
    pub fn render_lines(&self) -> Vec<String> {
        let rows = self.snapshot();
        let name_width = rows
            .iter()
            .map(|r| r.service.as_str().len())
            .max()
            .unwrap_or(0)
            .max("SERVICE".len());

        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(format!("{:<name_width$}  {:<8}  DETAIL", "SERVICE", "STATE"));
        for row in rows {
            lines.push(format!(
                "{:<name_width$}  {:<8}  {}",
                row.service.as_str(),
                row.state.to_string(),
                row.detail.as_deref().unwrap_or("-")
            ));
        }
        lines
    }
}
