//! High-water-mark block copier.
//!
//! Tape drives and similar sequential devices want large writes of one fixed
//! size, issued back to back. [`copy`] reads a source into pooled blocks and
//! only starts writing once a high water mark of full blocks is buffered, then
//! drains the buffer completely before waiting again. Every write is exactly
//! one block except possibly the last.

pub mod config;
pub mod copier;
pub mod error;

pub use config::{CopyConfig, DEFAULT_BLOCK_SIZE, DEFAULT_HWM_PERCENT};
pub use copier::{copy, BlockCopier, CopyStats};
pub use error::{CopyError, Result};
