//! # LogWriter — simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos; implement a custom [`Subscribe`] for metrics
//! or structured logging.
//!
//! ## Example output
//! ```text
//! [acquired] ticket=#1
//! [head] ticket=#1 retries=0
//! [requeued] ticket=#1 retries=1
//! [removed] ticket=#2 retries=0 reason="scope exited"
//! [head] empty
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
///
/// Enabled via the `logging` feature.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Formats an event as a single log line.
pub(crate) fn render(e: &Event) -> String {
    let ticket = e
        .ticket
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    let retries = e.retries.unwrap_or(0);

    match e.kind {
        EventKind::TicketAcquired => format!("[acquired] ticket={ticket}"),
        EventKind::HeadChanged => match e.ticket {
            Some(_) => format!("[head] ticket={ticket} retries={retries}"),
            None => "[head] empty".to_string(),
        },
        EventKind::TicketRequeued => format!("[requeued] ticket={ticket} retries={retries}"),
        EventKind::TicketRemoved => match e.reason.as_deref() {
            Some(reason) => format!("[removed] ticket={ticket} retries={retries} reason={reason:?}"),
            None => format!("[removed] ticket={ticket} retries={retries}"),
        },
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        println!("{}", render(e));
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TicketId;

    #[test]
    fn test_render_lines() {
        let head = Event::new(EventKind::HeadChanged)
            .with_ticket(TicketId::new(3))
            .with_retries(1);
        assert_eq!(render(&head), "[head] ticket=#3 retries=1");

        let empty = Event::new(EventKind::HeadChanged);
        assert_eq!(render(&empty), "[head] empty");

        let removed = Event::new(EventKind::TicketRemoved)
            .with_ticket(TicketId::new(2))
            .with_retries(0)
            .with_reason("scope exited");
        assert_eq!(
            render(&removed),
            "[removed] ticket=#2 retries=0 reason=\"scope exited\""
        );
    }
}
