use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crossbeam::channel::{bounded, Receiver, Sender};

struct State {
    cancelled: bool,
    // Dropping the sender disconnects `listener`, waking every `select!`
    // parked on it.
    trigger: Option<Sender<()>>,
    children: Vec<Weak<Inner>>,
}

struct Inner {
    state: Mutex<State>,
    listener: Receiver<()>,
}

/// Cooperative cancellation shared between a caller and its workers.
///
/// Workers blocked on channel operations include
/// `recv(token.listener())` in their `select!` and wake as soon as the token
/// is cancelled. Child tokens are cancelled with their parent but can also be
/// cancelled on their own.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        let (trigger, listener) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    cancelled: false,
                    trigger: Some(trigger),
                    children: Vec::new(),
                }),
                listener,
            }),
        }
    }

    /// Cancel this token and every child derived from it.
    pub fn cancel(&self) {
        let children = {
            let mut state = self.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            state.trigger = None;
            std::mem::take(&mut state.children)
        };

        for child in children.iter().filter_map(Weak::upgrade) {
            CancelToken { inner: child }.cancel();
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called on this token or a parent.
    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Receiver that becomes ready (disconnected) once the token is cancelled.
    ///
    /// It never yields a value; only the disconnect is meaningful.
    pub fn listener(&self) -> &Receiver<()> {
        &self.inner.listener
    }

    /// Derive a token cancelled together with this one.
    pub fn child_token(&self) -> CancelToken {
        let child = CancelToken::new();
        let mut state = self.lock();
        if state.cancelled {
            drop(state);
            child.cancel();
        } else {
            state.children.retain(|weak| weak.strong_count() > 0);
            state.children.push(Arc::downgrade(&child.inner));
        }
        child
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
