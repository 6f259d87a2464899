//! Fail-fast policy.
//!
//! Runtime operations report failures as [`RuntimeError`]. Generated code has
//! no way to handle them, so the C entry points route every error here: the
//! diagnostic goes to stderr and the process exits with status 1.

use crate::{RtResult, RuntimeError};

/// Exit status after a runtime error.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Print `err` and terminate the process.
#[cold]
pub fn terminate(err: &RuntimeError) -> ! {
    tracing::error!(category = err.category(), "{err}");
    eprintln!("{err}");
    std::process::exit(FAILURE_EXIT_CODE)
}

/// Unwrap `result`, terminating on error.
#[inline]
pub fn or_terminate<T>(result: RtResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => terminate(&err),
    }
}
