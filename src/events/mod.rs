//! Job events: types and the fan-out bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! push job lifecycle events to real-time observers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and JSON wire format
//! - [`EventBus`], [`Subscription`], [`SubscriberId`] timeout-bounded fan-out
//!
//! ## Quick reference
//! - **Publishers**: worker loops (`core::runner`), via [`JobReporter`](crate::JobReporter)
//!   for installer output.
//! - **Consumers**: one [`Subscription`] per `/ws` connection.

mod bus;
mod event;

pub use bus::{EventBus, SubscriberId, Subscription};
pub use event::{Event, EventKind};
