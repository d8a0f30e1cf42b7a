//! Error types used by the ticket queue.
//!
//! This module defines two error enums:
//!
//! - [`ConfigError`] — invalid configuration; the queue is never created.
//! - [`QueueError`] — a wait on a ticket failed; local to the caller that waited.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::sync::Arc;

use thiserror::Error;

use crate::core::TicketId;

/// # Errors produced while building a queue configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Stall timeout was negative.
    #[error("timeout must be >= 0, got {value}ms")]
    NegativeTimeout {
        /// The rejected value, in milliseconds.
        value: i64,
    },

    /// Retry limit was negative.
    #[error("retries must be >= 0, got {value}")]
    NegativeRetries {
        /// The rejected value.
        value: i64,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use turnstile::ConfigError;
    ///
    /// let err = ConfigError::NegativeTimeout { value: -1 };
    /// assert_eq!(err.as_label(), "config_negative_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::NegativeTimeout { .. } => "config_negative_timeout",
            ConfigError::NegativeRetries { .. } => "config_negative_retries",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConfigError::NegativeTimeout { value } => format!("negative timeout: {value}ms"),
            ConfigError::NegativeRetries { value } => format!("negative retries: {value}"),
        }
    }
}

/// # Errors produced by waiting on a ticket.
///
/// A failed wait never affects the queue or other tickets. None of these
/// conditions is retried internally; callers that need another turn must
/// acquire a new ticket.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The ticket was already disposed when the wait was issued.
    #[error("ticket {id} is disposed")]
    Disposed {
        /// Ticket the wait was issued for.
        id: TicketId,
    },

    /// The ticket is not currently enqueued in this queue.
    #[error("ticket {id} is not in the queue")]
    NotPresent {
        /// Ticket the wait was issued for.
        id: TicketId,
    },

    /// The ticket was removed before it became the head.
    #[error("ticket {id} was removed while waiting{}", reason_suffix(.reason))]
    Removed {
        /// Ticket the wait was issued for.
        id: TicketId,
        /// Reason supplied with the removal, if any.
        reason: Option<Arc<str>>,
    },

    /// Every handle to the queue was dropped while the wait was pending.
    #[error("queue closed while ticket {id} was waiting")]
    Closed {
        /// Ticket the wait was issued for.
        id: TicketId,
    },
}

fn reason_suffix(reason: &Option<Arc<str>>) -> String {
    match reason {
        Some(r) => format!(": {r}"),
        None => String::new(),
    }
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use turnstile::{QueueError, TicketId};
    ///
    /// let err = QueueError::NotPresent { id: TicketId::new(3) };
    /// assert_eq!(err.as_label(), "ticket_not_present");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Disposed { .. } => "ticket_disposed",
            QueueError::NotPresent { .. } => "ticket_not_present",
            QueueError::Removed { .. } => "ticket_removed",
            QueueError::Closed { .. } => "queue_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            QueueError::Disposed { id } => format!("disposed: {id}"),
            QueueError::NotPresent { id } => format!("not present: {id}"),
            QueueError::Removed { id, reason } => match reason {
                Some(r) => format!("removed: {id} ({r})"),
                None => format!("removed: {id}"),
            },
            QueueError::Closed { id } => format!("closed: {id}"),
        }
    }

    /// Ticket the failed wait was issued for.
    pub fn ticket(&self) -> TicketId {
        match self {
            QueueError::Disposed { id }
            | QueueError::NotPresent { id }
            | QueueError::Removed { id, .. }
            | QueueError::Closed { id } => *id,
        }
    }

    /// Removal reason carried by [`QueueError::Removed`].
    pub fn reason(&self) -> Option<&str> {
        match self {
            QueueError::Removed { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}
