//! Conversion of notifier handler outputs into a settled outcome.

use std::fmt;

use crate::error::{HandlerError, HandlerResult};

/// Output types a multicast handler may return.
///
/// Implemented for `()` (always succeeds) and for `Result<(), E>` where `E`
/// is printable; an `Err` becomes [`HandlerError::Failed`].
pub trait IntoOutcome {
    /// Settles the output.
    fn into_outcome(self) -> HandlerResult;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> HandlerResult {
        Ok(())
    }
}

impl<E: fmt::Display> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> HandlerResult {
        self.map_err(HandlerError::failed)
    }
}
