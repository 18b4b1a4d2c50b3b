use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, error, instrument};

use super::ThreadPool;
use crate::{PhonebookError, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A thread pool implemented with a shared job queue (i.e. channel).
///
/// This implementation uses the MPMC [`channel`] provided by the crossbeam crate as a single
/// producer, multiple consumer queue. The producer is the pool itself, the worker threads are
/// the consumers. Connections handed to the pool while every worker is busy wait in the queue
/// until a worker frees up.
///
/// If a job panics, its worker thread is replaced by a new one.
///
/// [`channel`]: https://docs.rs/crossbeam/0.8.1/crossbeam/channel/index.html
pub struct SharedQueueThreadPool {
    /// the sending part of the job queue
    tx: Sender<Job>,
}

impl ThreadPool for SharedQueueThreadPool {
    /// create a new thread pool with the given number of worker `threads`.
    /// Every worker receives a handle to the receiving end of the channel
    fn new(threads: u32) -> Result<Self> {
        if threads == 0 {
            return Err(PhonebookError::Parsing(
                "a shared queue pool needs at least one thread".to_string(),
            ));
        }
        let (tx, rx) = channel::unbounded::<Job>();
        for id in 0..threads {
            let jobs = JobReceiver(rx.clone());
            thread::Builder::new()
                .name(format!("phonebook-worker-{}", id))
                .spawn(move || run_jobs(jobs))?;
        }
        debug!("created shared queue pool with {} threads", threads);
        Ok(SharedQueueThreadPool { tx })
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.tx.send(Box::new(job)).is_err() {
            error!("There are no threads left in the pool, dropping job");
        }
    }
}

/// Receives jobs from the queue and runs them.
/// Additionally, this type is responsible for restarting any worker that panicked
#[derive(Clone, Debug)]
struct JobReceiver(Receiver<Job>);

impl Drop for JobReceiver {
    fn drop(&mut self) {
        if thread::panicking() {
            debug!("worker panicked, starting a replacement");
            let jobs = self.clone();
            if let Err(e) = thread::Builder::new().spawn(move || run_jobs(jobs)) {
                error!("Failed to spawn a thread: {}", e);
            }
        }
    }
}

/// waits for jobs to arrive on the (wrapped) receiver and runs them until the pool is dropped
#[instrument(skip(jobs))]
fn run_jobs(jobs: JobReceiver) {
    while let Ok(job) = jobs.0.recv() {
        job();
    }
    debug!("worker exited because the thread pool was destroyed");
}
