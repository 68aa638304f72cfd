//! Driver loop over the comma-separated file list.

use std::path::Path;

use futures::StreamExt;
use futures::stream;
use tracing::{error, info, instrument};

use crate::classifier::{DocumentTask, TaskOutput};
use crate::error::{ClaimDocError, Result};

/// How a batch handles concurrency and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Documents in flight at once; 1 is strictly sequential
    pub concurrency: usize,
    /// Stop at the first failed document instead of continuing
    pub fail_fast: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            fail_fast: false,
        }
    }
}

/// What happened to one entry of the file list.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// Position in the file list
    pub index: usize,
    pub file_name: String,
    pub result: Result<TaskOutput>,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<DocumentOutcome>,
    /// Set when fail-fast stopped the run before every entry was processed
    pub stopped_early: bool,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.stopped_early && self.failed() == 0
    }
}

/// Split file-list contents into document names.
///
/// One trailing line terminator is dropped and empty entries are skipped;
/// names are otherwise kept byte-for-byte, including surrounding spaces.
pub fn split_file_list(contents: &str) -> Vec<String> {
    let contents = contents
        .strip_suffix("\r\n")
        .or_else(|| contents.strip_suffix('\n'))
        .unwrap_or(contents);
    contents
        .split(',')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and split the side file.
pub async fn read_file_list(path: &Path) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ClaimDocError::FileList {
            path: path.to_path_buf(),
            source,
        })?;
    let names = split_file_list(&contents);
    info!(path = %path.display(), count = names.len(), "Loaded file list");
    Ok(names)
}

/// Run `task` over `names`, reporting each outcome to `on_outcome` in list order.
///
/// With `concurrency > 1` several documents are in flight at once, but outcomes
/// are still delivered in input order.
#[instrument(skip_all, fields(documents = names.len(), concurrency = options.concurrency))]
pub async fn run_batch<T, F>(
    task: &T,
    names: &[String],
    options: BatchOptions,
    mut on_outcome: F,
) -> BatchSummary
where
    T: DocumentTask + ?Sized,
    F: FnMut(&DocumentOutcome),
{
    let mut outcomes = stream::iter(names.iter().enumerate())
        .map(|(index, name)| async move {
            let result = task.run(name).await;
            DocumentOutcome {
                index,
                file_name: name.clone(),
                result,
            }
        })
        .buffered(options.concurrency.max(1));

    let mut summary = BatchSummary::default();
    while let Some(outcome) = outcomes.next().await {
        on_outcome(&outcome);
        let failed = match &outcome.result {
            Ok(_) => false,
            Err(e) => {
                error!(
                    file = %outcome.file_name,
                    kind = e.kind(),
                    error = %e,
                    "Document failed"
                );
                true
            }
        };
        summary.outcomes.push(outcome);
        if failed && options.fail_fast {
            summary.stopped_early = summary.outcomes.len() < names.len();
            break;
        }
    }

    info!(
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "Batch finished"
    );
    summary
}
