use std::thread;

use tracing::error;

use super::ThreadPool;
use crate::Result;

/// a thread-pool that is not actually a pool. It starts a new, named thread on every spawn
/// request, so there is no limit on how many jobs run at once
#[derive(Debug, Default)]
pub struct NaiveThreadPool;

impl ThreadPool for NaiveThreadPool {
    fn new(_threads: u32) -> Result<Self> {
        Ok(NaiveThreadPool)
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(e) = thread::Builder::new()
            .name("phonebook-conn".to_string())
            .spawn(job)
        {
            error!("Failed to spawn a thread: {}", e);
        }
    }
}
