//! Completion delivery onto a designated execution context.
//!
//! A [`CompletionQueue`] is the sending half: fetch tasks running on the
//! runtime's worker threads push finished callbacks into it. The matching
//! [`CompletionLoop`] is owned by whichever task or thread plays the role of
//! the "main" context and runs those callbacks one at a time, in the order
//! they were queued.

use tokio::sync::mpsc;
use tracing::trace;

/// A unit of work queued for the completion context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Creates a connected queue/loop pair.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (queue, mut main_loop) = http_utility::completion_queue();
/// queue.dispatch(Box::new(|| println!("on the completion context")));
/// drop(queue);
/// assert_eq!(main_loop.run_pending(), 1);
/// # }
/// ```
pub fn completion_queue() -> (CompletionQueue, CompletionLoop) {
    let (job_tx, job_rx) = mpsc::unbounded_channel::<Job>();
    (CompletionQueue { job_tx }, CompletionLoop { job_rx })
}

/// Handle for scheduling work onto a [`CompletionLoop`]. Cheap to clone.
#[derive(Clone, Debug)]
pub struct CompletionQueue {
    job_tx: mpsc::UnboundedSender<Job>,
}

impl CompletionQueue {
    /// Queues `job` for the loop. The job never runs inline.
    ///
    /// Returns `false` if the loop has been dropped, in which case `job` is
    /// dropped without running.
    pub fn dispatch(&self, job: Job) -> bool {
        match self.job_tx.send(job) {
            Ok(()) => true,
            Err(_) => {
                trace!("completion loop gone, dropping job");
                false
            }
        }
    }
}

/// The receiving half; runs queued jobs on the context that drives it.
#[derive(Debug)]
pub struct CompletionLoop {
    job_rx: mpsc::UnboundedReceiver<Job>,
}

impl CompletionLoop {
    /// Waits for the next job and runs it.
    ///
    /// Returns `false` when every [`CompletionQueue`] has been dropped and
    /// nothing is left to run.
    pub async fn run_one(&mut self) -> bool {
        match self.job_rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Runs every job that is already queued, without waiting.
    /// Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.job_rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Runs jobs until every [`CompletionQueue`] handle, including those held
    /// by in-flight fetches, has been dropped.
    pub async fn run(mut self) {
        let mut ran = 0usize;
        while self.run_one().await {
            ran += 1;
        }
        trace!(ran, "completion loop finished");
    }
}
