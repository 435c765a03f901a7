//! Worker plumbing shared by the blockmux streaming primitives.
//!
//! - [`Pool`]: typed object pool; [`Pooled`] guards release on drop
//! - [`CancelToken`]: cancellation that wakes workers parked on channels
//! - [`TaskGroup`]: first-error-wins aggregation for scoped worker threads
//! - [`read_full`]: fill a buffer, stopping only at end of input

pub mod cancel;
pub mod group;
pub mod io;
pub mod pool;

pub use cancel::CancelToken;
pub use group::TaskGroup;
pub use io::read_full;
pub use pool::{BlockPool, Pool, Pooled, DEFAULT_MAX_IDLE};
