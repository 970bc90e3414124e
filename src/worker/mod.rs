//! # Worker Pool
//!
//! A fixed set of background threads that execute [`Job`]s off the control
//! thread. The pool is a plain value with no global state, so the chunk
//! manager owns its own pools and multiple worlds can coexist in one
//! process (the tests do exactly that).
//!
//! ## Scheduling
//!
//! * Each worker is backed by a dedicated channel pair and holds at most
//!   [`MAX_JOBS_IN_FLIGHT`] job at a time, so jobs on one worker run
//!   strictly FIFO.
//! * Jobs submitted while every worker is busy buffer in a pool-wide FIFO
//!   queue; a prioritized submission is inserted at the front instead,
//!   which is how edit-triggered work preempts speculative loading.
//! * Dispatch is round-robin over the workers, resuming after the last
//!   channel used, and [`WorkerPool::drain_completed`] refills freed
//!   workers from the queue immediately (work-conserving).
//!
//! Across workers no completion order is guaranteed; consumers treat
//! out-of-order arrival as the normal case and discard stale results.
//!
//! ## Boot-once configuration
//!
//! Workers receive the immutable [`WorkerContext`] (terrain function,
//! world dimensions, lighting parameters) when they are spawned instead of
//! on every job.

pub mod job;

use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};

pub use job::{Job, JobKind, JobOutput, WorkerContext, execute_job};

/// Maximum number of jobs in flight per worker channel.
///
/// Kept at 1 so each worker processes jobs in order and the queue stays
/// on the control thread where priority insertion can still reorder it.
pub const MAX_JOBS_IN_FLIGHT: usize = 1;

/// Communication endpoint for one worker thread.
///
/// The join handle is held only to keep the thread's lifetime tied to the
/// pool; dropping the pool closes `job_sender`, which ends the worker's
/// receive loop.
#[derive(Debug)]
struct WorkerChannel {
    job_sender: Sender<Job>,
    output_receiver: Receiver<JobOutput>,
    jobs_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// A fixed-size pool of job-executing worker threads.
pub struct WorkerPool {
    channels: Vec<WorkerChannel>,
    queued_jobs: VecDeque<Job>,
    current_channel: usize,
}

/// Picks a worker count from the machine's available parallelism, clamped
/// to `[1, ceiling]`.
pub fn default_worker_count(ceiling: usize) -> usize {
    let available = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    available.clamp(1, ceiling.max(1))
}

impl WorkerPool {
    /// Spawns `num_workers` threads, each booted with a shared handle to
    /// the immutable worker context.
    pub fn new(num_workers: usize, context: Arc<WorkerContext>) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        for worker_index in 0..num_workers {
            let (job_tx, job_rx) = channel::<Job>();
            let (output_tx, output_rx) = channel::<JobOutput>();
            let worker_context = context.clone();

            let worker = thread::spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    let output = execute_job(job, &worker_context);
                    if output_tx.send(output).is_err() {
                        // Pool dropped while we were working; nothing left
                        // to report to.
                        break;
                    }
                }
            });

            debug!("spawned worker {worker_index}");
            channels.push(WorkerChannel {
                job_sender: job_tx,
                output_receiver: output_rx,
                jobs_in_flight: 0,
                _worker: worker,
            });
        }

        info!("worker pool ready with {num_workers} workers");
        WorkerPool {
            channels,
            queued_jobs: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of jobs buffered waiting for a free worker.
    pub fn queued_len(&self) -> usize {
        self.queued_jobs.len()
    }

    /// Whether no job is in flight or queued anywhere in the pool.
    pub fn is_idle(&self) -> bool {
        self.queued_jobs.is_empty()
            && self.channels.iter().all(|c| c.jobs_in_flight == 0)
    }

    /// Attempts to hand a job to a specific worker channel.
    ///
    /// On failure (worker disconnected) the job is returned to the caller
    /// for requeueing.
    fn try_send_job(&mut self, job: Job, channel_index: usize) -> Result<(), Job> {
        match self.channels[channel_index].job_sender.send(job) {
            Ok(()) => {
                self.channels[channel_index].jobs_in_flight += 1;
                Ok(())
            }
            Err(send_error) => Err(send_error.0),
        }
    }

    /// Finds a worker that can accept a job right now, round-robin from
    /// the channel after the last one used.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }
        if self
            .channels
            .iter()
            .all(|channel| channel.jobs_in_flight >= MAX_JOBS_IN_FLIGHT)
        {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;
        loop {
            if self.channels[current].jobs_in_flight < MAX_JOBS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Submits a job for execution.
    ///
    /// The job starts immediately if a worker is free; otherwise it is
    /// buffered. A `prioritized` job jumps to the front of the buffer so it
    /// runs before any speculative work already queued.
    ///
    /// # Returns
    /// `true` if the job was handed to a worker immediately, `false` if it
    /// was queued.
    pub fn submit(&mut self, job: Job, prioritized: bool) -> bool {
        match self.find_available_channel() {
            Some(channel_index) => match self.try_send_job(job, channel_index) {
                Ok(()) => {
                    self.current_channel = (channel_index + 1) % self.channels.len();
                    true
                }
                Err(job) => {
                    warn!(
                        "worker {channel_index} disconnected, queueing {:?} job for chunk {:?}",
                        job.kind(),
                        job.position()
                    );
                    self.enqueue(job, prioritized);
                    false
                }
            },
            None => {
                self.enqueue(job, prioritized);
                false
            }
        }
    }

    fn enqueue(&mut self, job: Job, prioritized: bool) {
        if prioritized {
            self.queued_jobs.push_front(job);
        } else {
            self.queued_jobs.push_back(job);
        }
    }

    /// Moves queued jobs onto free workers, oldest (or prioritized) first,
    /// until the queue is empty or every worker is busy.
    pub fn pump_queue(&mut self) {
        if self.queued_jobs.is_empty() {
            return;
        }

        let Some(mut channel_index) = self.find_available_channel() else {
            return;
        };

        while let Some(job) = self.queued_jobs.pop_front() {
            match self.try_send_job(job, channel_index) {
                Ok(()) => {
                    self.current_channel = (channel_index + 1) % self.channels.len();
                    match self.find_available_channel() {
                        Some(next_index) => channel_index = next_index,
                        None => break,
                    }
                }
                Err(job) => {
                    // Channel disconnected; put the job back and stop for
                    // this pass.
                    self.queued_jobs.push_front(job);
                    break;
                }
            }
        }
    }

    /// Collects every completed job output and immediately redispatches
    /// queued jobs onto the workers this frees up.
    ///
    /// Must be called from the control thread; outputs are applied to the
    /// chunk map single-threadedly by the caller.
    pub fn drain_completed(&mut self) -> Vec<JobOutput> {
        let mut outputs = Vec::new();
        for channel in &mut self.channels {
            while let Ok(output) = channel.output_receiver.try_recv() {
                channel.jobs_in_flight -= 1;
                outputs.push(output);
            }
        }
        // Work-conserving: freed workers pick up buffered jobs right away.
        self.pump_queue();
        outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::LightingConfig;
    use crate::terrain::{GenerationStrategy, TerrainGenerator};
    use cgmath::Point3;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    fn context() -> Arc<WorkerContext> {
        Arc::new(WorkerContext {
            terrain: TerrainGenerator::new(42, GenerationStrategy::Flat { max_height: 6 })
                .unwrap(),
            chunk_size: 8,
            block_dimension: 1.0,
            lighting: LightingConfig::default(),
        })
    }

    fn generate_job(x: i32, version: u64) -> Job {
        Job::Generate {
            position: Point3::new(x, 0, 0),
            version,
            changed_blocks: HashMap::new(),
        }
    }

    fn collect_outputs(pool: &mut WorkerPool, expected: usize) -> Vec<JobOutput> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut outputs = Vec::new();
        while outputs.len() < expected {
            assert!(Instant::now() < deadline, "timed out waiting for jobs");
            outputs.extend(pool.drain_completed());
            std::thread::sleep(Duration::from_millis(1));
        }
        outputs
    }

    #[test]
    fn excess_jobs_queue_and_complete_in_submission_order() {
        let mut pool = WorkerPool::new(1, context());

        let mut started_immediately = 0;
        for x in 0..4 {
            if pool.submit(generate_job(x, x as u64), false) {
                started_immediately += 1;
            }
        }
        // Pool of size 1: exactly one job starts right away.
        assert_eq!(started_immediately, 1);
        assert_eq!(pool.queued_len(), 3);

        let outputs = collect_outputs(&mut pool, 4);
        let order: Vec<i32> = outputs.iter().map(|o| o.position().x).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert!(pool.is_idle());
    }

    #[test]
    fn prioritized_jobs_jump_the_queue() {
        let mut pool = WorkerPool::new(1, context());

        for x in 0..3 {
            pool.submit(generate_job(x, x as u64), false);
        }
        // Submitted last, but prioritized: runs before the buffered jobs.
        pool.submit(generate_job(99, 99), true);

        let outputs = collect_outputs(&mut pool, 4);
        let order: Vec<i32> = outputs.iter().map(|o| o.position().x).collect();
        // Job 0 was already on the worker when the prioritized job arrived.
        assert_eq!(order, vec![0, 99, 1, 2]);
    }

    #[test]
    fn all_workers_start_jobs_concurrently() {
        let mut pool = WorkerPool::new(3, context());
        let mut started = 0;
        for x in 0..3 {
            if pool.submit(generate_job(x, 0), false) {
                started += 1;
            }
        }
        assert_eq!(started, 3);
        assert_eq!(pool.queued_len(), 0);
        collect_outputs(&mut pool, 3);
    }

    #[test]
    fn default_worker_count_respects_the_ceiling() {
        assert_eq!(default_worker_count(1), 1);
        assert!(default_worker_count(64) >= 1);
        assert!(default_worker_count(4) <= 4);
    }
}
