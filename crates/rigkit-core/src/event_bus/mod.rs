//! # Event Dispatch
//!
//! Delivers link notifications to observers registered by the integrating
//! application:
//! - `LineReceived` for every decoded line
//! - `Error` for failed opens and driver faults
//! - `ConnectionChanged` whenever the link may have changed state
//!
//! Synchronous handlers run on the publishing thread, in registration order,
//! before `publish` returns. Async consumers can take a broadcast receiver
//! instead. Nothing is replayed to observers registered after an event was
//! published.
//!
//! ## Usage
//!
//! ```rust
//! use rigkit_core::{EventCategory, EventDispatcher, EventFilter, LinkEvent};
//!
//! let dispatcher = EventDispatcher::new();
//! let id = dispatcher.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Line]),
//!     |event| {
//!         if let LinkEvent::LineReceived(line) = event {
//!             println!("rx: {}", line);
//!         }
//!     },
//! );
//!
//! dispatcher.publish(LinkEvent::ConnectionChanged);
//! dispatcher.unsubscribe(id);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
