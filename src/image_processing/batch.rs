use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Completion counter shared by the workers of one batch
pub struct BatchProcessor {
    pub total_files: usize,
    pub processed_count: AtomicUsize,
    pub start_time: Instant,
}

impl BatchProcessor {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            processed_count: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Increment processed count and return current count
    pub fn increment(&self) -> usize {
        self.processed_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_files == 0 {
            1.0
        } else {
            (self.processed_count.load(Ordering::Relaxed) as f64) / (self.total_files as f64)
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// How a batch is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One file after the other, in input order
    Sequential,
    /// Fan out over a dedicated pool of `jobs` threads (0 = one per CPU)
    Parallel { jobs: usize },
}

impl ExecutionMode {
    pub fn from_flags(parallel: bool, jobs: usize) -> Self {
        if parallel {
            ExecutionMode::Parallel { jobs }
        } else {
            ExecutionMode::Sequential
        }
    }
}

/// Run `process_fn` once per file and collect the results in input order.
///
/// `on_complete` is called with each result and the number of files finished
/// so far as soon as that file is done; under `Parallel` that order is the
/// completion order, not the input order. Tasks never see each other's state,
/// so one failing file cannot affect another.
pub fn run_batch<T, F, C>(
    files: &[PathBuf],
    mode: ExecutionMode,
    process_fn: F,
    on_complete: C,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&PathBuf) -> T + Send + Sync,
    C: Fn(&T, usize) + Send + Sync,
{
    let processor = BatchProcessor::new(files.len());

    let run_one = |file_path: &PathBuf| {
        let result = process_fn(file_path);
        let completed = processor.increment();
        tracing::trace!(
            file = %file_path.display(),
            completed,
            progress = processor.progress(),
            "file done"
        );
        on_complete(&result, completed);
        result
    };

    let results = match mode {
        ExecutionMode::Sequential => files.iter().map(run_one).collect(),
        ExecutionMode::Parallel { jobs } => {
            let threads = if jobs == 0 { num_cpus::get() } else { jobs };
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| {
                    Error::InvalidArgument(format!("Failed to initialize thread pool: {}", e))
                })?;
            tracing::debug!(threads, files = files.len(), "running batch in parallel");
            pool.install(|| files.par_iter().map(run_one).collect())
        }
    };

    tracing::debug!(
        elapsed = ?processor.elapsed(),
        progress = processor.progress(),
        "batch finished"
    );
    Ok(results)
}
