//! Error types used by the channel registry and by handlers.
//!
//! This module defines two main error enums:
//!
//! - [`RegistryError`] - errors raised by the registry while resolving a channel.
//! - [`HandlerError`] - the failed outcome of a single multicast handler.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! Publishing to a channel without subscribers is **not** an error: senders
//! return `None` and notifiers resolve immediately.

use thiserror::Error;

/// # Errors produced by the channel registry.
///
/// The registry stores handlers type-erased and restores their static types at
/// the [`Sender`](crate::Sender)/[`Notifier`](crate::Notifier) boundary. Users of
/// a channel id are expected to agree on payload/result types; when they do not,
/// the downcast fails and this error is produced.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The handler installed on the channel was registered with different payload/result types.
    #[error("channel {channel:?} holds a handler of another type; expected {expected}")]
    TypeMismatch {
        /// Channel id the lookup was made for.
        channel: String,
        /// Type name of the handler the caller expected.
        expected: &'static str,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use courier::RegistryError;
    ///
    /// let err = RegistryError::TypeMismatch { channel: "parse".into(), expected: "u32" };
    /// assert_eq!(err.as_label(), "registry_type_mismatch");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::TypeMismatch { .. } => "registry_type_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegistryError::TypeMismatch { channel, expected } => {
                format!("type mismatch on channel={channel:?}; expected={expected}")
            }
        }
    }
}

/// # Outcome of a failed multicast handler.
///
/// Notifier handlers settle independently: a failure is recorded (and optionally
/// logged) but never stops the other handlers or the surrounding `publish`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler returned an error value.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Handler panicked while being called or polled.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl HandlerError {
    /// Builds a [`HandlerError::Failed`] from anything printable.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        HandlerError::Failed {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use courier::HandlerError;
    ///
    /// let err = HandlerError::failed("boom");
    /// assert_eq!(err.as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Failed { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Converts a caught panic payload into [`HandlerError::Panicked`].
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        HandlerError::Panicked { info }
    }
}

/// Result of a single multicast handler invocation.
pub type HandlerResult = Result<(), HandlerError>;
