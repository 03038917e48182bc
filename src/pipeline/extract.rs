//! Contact extraction stage: matrix dump and reformatting
//! for every (sample, chromosome pair) unit.

use std::{
    path::PathBuf,
    sync::Arc,
    thread,
};
use crate::{
    FailurePolicy,
    ext,
    hic::{ChromPair, contacts},
};
use super::{ToolLog, tools::{self, Tools}};

/// One extraction unit: dump the counts of a single chromosome pair
/// from a single sample matrix, then reformat them.
#[derive(Debug, Clone)]
pub struct ExtractJob {
    pub sample: String,
    pub matrix: PathBuf,
    pub pair: ChromPair,
    pub raw_path: PathBuf,
    pub modified_path: PathBuf,
}

impl ExtractJob {
    fn describe(&self) -> String {
        format!("{} {}", self.sample, self.pair)
    }
}

fn process_job(job: &ExtractJob, tools: &Tools, resolution: u32, tool_log: &ToolLog) -> crate::Result<()> {
    if job.raw_path.exists() {
        log::warn!("    {}: raw counts file {} exists, skipping dump",
            job.describe(), ext::fmt::path(&job.raw_path));
    } else {
        tools::run_tool("matrix dump",
            tools.dump_command(&job.matrix, &job.pair, resolution, &job.raw_path), tool_log)?;
    }
    let n_records = contacts::reformat(&job.raw_path, &job.modified_path, &job.pair)?;
    log::debug!("    {}: {} records", job.describe(), n_records);
    Ok(())
}

/// Runs all extraction units, in `threads` worker threads.
/// Returns an error under `FailurePolicy::Abort`; otherwise failed units
/// are logged, counted and reported at the end of the stage.
pub fn run(
    jobs: Vec<ExtractJob>,
    tools: &Arc<Tools>,
    tool_log: &Arc<ToolLog>,
    resolution: u32,
    threads: u16,
    policy: FailurePolicy,
) -> crate::Result<()>
{
    let n_jobs = jobs.len();
    log::info!("Extracting contact counts: {} units in {} thread(s)", n_jobs, threads);
    let n_failed = if threads <= 1 {
        run_worker(&jobs, tools, tool_log, resolution, policy)?
    } else {
        run_multi_thread(jobs, tools, tool_log, resolution, threads, policy)?
    };
    if n_failed > 0 {
        log::warn!("Extraction failed for {} out of {} units, continuing with the remaining data",
            n_failed, n_jobs);
    }
    Ok(())
}

fn run_worker(
    jobs: &[ExtractJob],
    tools: &Tools,
    tool_log: &ToolLog,
    resolution: u32,
    policy: FailurePolicy,
) -> crate::Result<usize>
{
    let mut n_failed = 0;
    for job in jobs.iter() {
        if let Err(e) = process_job(job, tools, resolution, tool_log) {
            match policy {
                FailurePolicy::Abort => {
                    log::error!("{}: extraction failed", job.describe());
                    return Err(e);
                }
                FailurePolicy::Skip => {
                    log::error!("{}: extraction failed: {}", job.describe(), e.display());
                    n_failed += 1;
                }
            }
        }
    }
    Ok(n_failed)
}

fn run_multi_thread(
    jobs: Vec<ExtractJob>,
    tools: &Arc<Tools>,
    tool_log: &Arc<ToolLog>,
    resolution: u32,
    threads: u16,
    policy: FailurePolicy,
) -> crate::Result<usize>
{
    let threads = usize::from(threads);
    let jobs = Arc::new(jobs);
    let n_jobs = jobs.len();
    let mut handles = Vec::with_capacity(threads);
    let mut start = 0;
    for worker_ix in 0..threads {
        if start == n_jobs {
            break;
        }
        let rem_workers = threads - worker_ix;
        let end = start + (n_jobs - start + rem_workers - 1) / rem_workers;
        // Closure with cloned data.
        {
            let jobs = Arc::clone(&jobs);
            let tools = Arc::clone(tools);
            let tool_log = Arc::clone(tool_log);
            handles.push(thread::spawn(move ||
                run_worker(&jobs[start..end], &tools, &tool_log, resolution, policy)));
        }
        start = end;
    }
    assert_eq!(start, n_jobs);

    let mut n_failed = 0;
    for handle in handles {
        n_failed += handle.join().expect("Extraction worker panicked")?;
    }
    Ok(n_failed)
}
