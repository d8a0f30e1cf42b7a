//! Queue core: ordering, waiting and stall supervision.
//!
//! The only public API from this module is [`TicketQueue`], [`Ticket`] and
//! [`TicketId`], plus the fixed removal reasons.
//!
//! Internal modules:
//! - [`queue`]: ticket order, head transitions, removal and waits;
//! - [`ticket`]: the disposable ticket handle and its shared cell;
//! - [`supervisor`]: the stall timer that requeues or evicts a stuck head;
//! - [`waiters`]: pending waits keyed by ticket;
//! - [`builder`]: queue construction with subscribers.

mod builder;
mod queue;
mod supervisor;
mod ticket;
mod waiters;

pub use builder::QueueBuilder;
pub use queue::TicketQueue;
pub use supervisor::STALLED_PAST_RETRY_LIMIT;
pub use ticket::{Ticket, TicketId, SCOPE_EXITED};
