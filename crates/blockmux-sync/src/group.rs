use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::cancel::CancelToken;

/// Collects the first error reported by a set of sibling workers.
///
/// The group owns a child of the caller's [`CancelToken`]. Recording an error
/// or a worker panicking inside [`run`](Self::run) cancels that child so every
/// sibling parked on it stops; cancelling the caller's token stops the group
/// as well. Workers are expected to run inside
/// `std::thread::scope`, which joins them before the group is finished.
pub struct TaskGroup<E> {
    first: Mutex<Option<E>>,
    token: CancelToken,
}

impl<E: std::fmt::Display> TaskGroup<E> {
    /// Create a group whose workers stop when `parent` is cancelled.
    pub fn new(parent: &CancelToken) -> Self {
        Self {
            first: Mutex::new(None),
            token: parent.child_token(),
        }
    }

    /// Token every worker of this group must observe.
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Run one worker body, recording its error if it fails.
    ///
    /// A panic in `work` cancels the group before it unwinds further, so the
    /// scope joining the workers can finish and re-raise it.
    pub fn run<T>(&self, work: impl FnOnce() -> Result<T, E>) -> Option<T> {
        let _unwind = CancelOnUnwind(&self.token);
        match work() {
            Ok(value) => Some(value),
            Err(err) => {
                self.record(err);
                None
            }
        }
    }

    /// Record an error and stop the siblings. Later errors are discarded.
    pub fn record(&self, err: E) {
        {
            let mut first = self.first.lock().unwrap_or_else(PoisonError::into_inner);
            if first.is_none() {
                debug!(error = %err, "worker failed, stopping siblings");
                *first = Some(err);
            }
        }
        self.token.cancel();
    }

    /// Consume the group, returning the first recorded error.
    pub fn finish(self) -> Result<(), E> {
        match self
            .first
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct CancelOnUnwind<'a>(&'a CancelToken);

impl Drop for CancelOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            debug!("worker panicked, stopping siblings");
            self.0.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::time::Duration;

    use crossbeam::channel::{bounded, select};

    use super::*;

    #[test]
    fn all_workers_succeed() {
        let parent = CancelToken::new();
        let group: TaskGroup<String> = TaskGroup::new(&parent);

        let total = std::thread::scope(|s| {
            let a = s.spawn(|| group.run(|| Ok::<_, String>(2)));
            let b = s.spawn(|| group.run(|| Ok::<_, String>(3)));
            a.join().unwrap().unwrap() + b.join().unwrap().unwrap()
        });

        assert_eq!(total, 5);
        assert!(!group.token().is_cancelled());
        assert!(group.finish().is_ok());
    }

    #[test]
    fn first_error_wins_and_stops_siblings() {
        let parent = CancelToken::new();
        let group: TaskGroup<String> = TaskGroup::new(&parent);
        let (_tx, rx) = bounded::<()>(0);

        std::thread::scope(|s| {
            s.spawn(|| {
                group.run(|| {
                    select! {
                        recv(rx) -> _ => Ok(()),
                        recv(group.token().listener()) -> _ => Err("stopped".to_string()),
                    }
                })
            });
            std::thread::sleep(Duration::from_millis(10));
            s.spawn(|| group.run(|| Err::<(), _>("boom".to_string())));
        });

        assert!(group.token().is_cancelled());
        assert!(!parent.is_cancelled());
        assert_eq!(group.finish().unwrap_err(), "boom");
    }

    #[test]
    fn parent_cancellation_reaches_group() {
        let parent = CancelToken::new();
        let group: TaskGroup<String> = TaskGroup::new(&parent);
        parent.cancel();
        assert!(group.token().is_cancelled());
        assert!(group.finish().is_ok());
    }

    #[test]
    fn panicking_worker_stops_siblings() {
        let parent = CancelToken::new();
        let group: TaskGroup<String> = TaskGroup::new(&parent);
        let (_tx, rx) = bounded::<()>(0);
        let (stopped_tx, stopped) = bounded::<bool>(1);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            std::thread::scope(|s| {
                s.spawn(|| {
                    let result = group.run(|| {
                        select! {
                            recv(rx) -> _ => Ok(()),
                            recv(group.token().listener()) -> _ => Err("stopped".to_string()),
                        }
                    });
                    let _ = stopped_tx.send(result.is_none());
                });
                s.spawn(|| group.run(|| -> Result<(), String> { panic!("worker blew up") }));
            });
        }));

        assert!(outcome.is_err(), "the worker panic reaches the caller");
        assert_eq!(stopped.try_recv(), Ok(true));
        assert!(!parent.is_cancelled());
        assert_eq!(group.finish().unwrap_err(), "stopped");
    }
}
