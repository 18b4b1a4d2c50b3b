//! Thread pools that the server uses to run one connection handler per accepted connection.
//!
//! [`NaiveThreadPool`] starts a fresh thread for every job and is the default: the number of
//! concurrent connections is unbounded. [`SharedQueueThreadPool`] runs jobs on a fixed number of
//! worker threads, so at most `threads` connections are serviced at once and the rest wait in
//! its queue.
use crate::Result;

/// The interface every thread pool implements.
pub trait ThreadPool {
    /// creates a new thread pool that will run jobs on `threads` threads
    ///
    /// # Errors
    /// returns an error if any of the threads could not be started
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized;

    /// runs `job` on a thread of this pool
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static;
}

mod naive;
mod shared_queue;

pub use self::naive::NaiveThreadPool;
pub use self::shared_queue::SharedQueueThreadPool;
