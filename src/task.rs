//! Background tasks
//!
//! Fire-and-poll operations on worker threads. The UI thread spawns work,
//! then polls the handle once per frame; results are only ever consumed on
//! the UI thread, so application state never needs a lock.

use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;

/// Failure of the task machinery itself (not of the work it ran)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    /// The worker thread panicked or dropped its sender
    #[error("background task ended without a result")]
    Disconnected,
}

/// Handle to a pending background operation
pub struct AsyncOp<T> {
    receiver: Receiver<T>,
    finished: bool,
}

impl<T: Send + 'static> AsyncOp<T> {
    /// Run `work` on a new thread
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = channel();
        thread::spawn(move || {
            let _ = sender.send(work());
        });
        Self { receiver, finished: false }
    }
}

impl<T> AsyncOp<T> {
    /// Non-blocking check. Returns the result exactly once.
    pub fn poll(&mut self) -> Option<Result<T, TaskError>> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(value) => {
                self.finished = true;
                Some(Ok(value))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(Err(TaskError::Disconnected))
            }
        }
    }

    /// Block until the worker finishes
    #[cfg(test)]
    pub fn wait(mut self) -> Result<T, TaskError> {
        if self.finished {
            return Err(TaskError::Disconnected);
        }
        self.finished = true;
        self.receiver.recv().map_err(|_| TaskError::Disconnected)
    }

    /// True once `poll` has handed out the result
    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_wait_returns_value() {
        let op = AsyncOp::spawn(|| 21 * 2);
        assert_eq!(op.wait(), Ok(42));
    }

    #[test]
    fn test_poll_yields_once() {
        let mut op = AsyncOp::spawn(|| "done");
        let mut result = None;
        for _ in 0..200 {
            if let Some(r) = op.poll() {
                result = Some(r);
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(result, Some(Ok("done")));
        assert!(op.is_finished());
        assert_eq!(op.poll(), None);
    }

    #[test]
    fn test_panicking_worker_disconnects() {
        let op: AsyncOp<u32> = AsyncOp::spawn(|| panic!("worker failure"));
        assert_eq!(op.wait(), Err(TaskError::Disconnected));
    }
}
