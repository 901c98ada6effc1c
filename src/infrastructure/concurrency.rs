/// Concurrency management for fun-trace.
/// Sizes the rayon pool used for call-graph construction and batch traces.

use anyhow::Result;
use tracing::info;

/// Worker count when none is requested: half the cores, at least one.
pub fn default_workers() -> usize {
    std::cmp::max(1, num_cpus::get() / 2)
}

/// Initialize the global rayon thread pool.
pub fn init_thread_pool(threads: Option<usize>) -> Result<usize> {
    let workers = threads.filter(|&n| n > 0).unwrap_or_else(default_workers);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    info!(workers, cores = num_cpus::get(), "initialized thread pool");
    Ok(workers)
}
