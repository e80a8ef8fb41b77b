//! Event dispatcher implementation.
//!
//! Each controller link owns one [`EventDispatcher`]; there is no global
//! instance.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{EventCategory, LinkEvent};

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Filter to receive only specific event types
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Receive all events.
    #[default]
    All,
    /// Receive events matching any of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Check if an event matches this filter
    pub fn matches(&self, event: &LinkEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

/// Type alias for event handler functions
type EventHandler = Arc<dyn Fn(&LinkEvent) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    handler: EventHandler,
}

/// Configuration for the event dispatcher
#[derive(Debug, Clone)]
pub struct EventDispatcherConfig {
    /// Channel capacity for async receivers.
    pub channel_capacity: usize,
}

impl Default for EventDispatcherConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Delivers link events to registered observers
pub struct EventDispatcher {
    /// Broadcast channel sender for async receivers
    sender: broadcast::Sender<LinkEvent>,
    /// Synchronous handlers, in registration order
    handlers: RwLock<Vec<Subscription>>,
    /// Configuration
    config: EventDispatcherConfig,
}

impl EventDispatcher {
    /// Create a new dispatcher with default configuration
    pub fn new() -> Self {
        Self::with_config(EventDispatcherConfig::default())
    }

    /// Create a new dispatcher with custom configuration
    pub fn with_config(config: EventDispatcherConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            handlers: RwLock::new(Vec::new()),
            config,
        }
    }

    /// Publish an event to all observers
    ///
    /// Matching handlers are called on the current thread in the order they
    /// were registered. Returns the number of handlers invoked.
    pub fn publish(&self, event: LinkEvent) -> usize {
        tracing::trace!("Publishing {}", event.description());

        // Snapshot so handlers may subscribe or unsubscribe while running.
        let matching: Vec<EventHandler> = self
            .handlers
            .read()
            .iter()
            .filter(|sub| sub.filter.matches(&event))
            .map(|sub| Arc::clone(&sub.handler))
            .collect();

        for handler in &matching {
            handler(&event);
        }

        // No async receivers is not an error.
        let _ = self.sender.send(event);

        matching.len()
    }

    /// Subscribe to events with a synchronous handler
    ///
    /// The handler runs on the publishing thread (for line events, the
    /// serial reader thread), so it should return quickly.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&LinkEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().push(Subscription {
            id,
            filter,
            handler: Arc::new(handler),
        });
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Get a receiver for async consumption
    ///
    /// Only events published after this call are delivered.
    pub fn receiver(&self) -> broadcast::Receiver<LinkEvent> {
        self.sender.subscribe()
    }

    /// Unsubscribe from events
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|sub| sub.id != id);
        let removed = handlers.len() != before;
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Get the number of synchronous subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Get the current configuration
    pub fn config(&self) -> &EventDispatcherConfig {
        &self.config
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.config)
            .finish()
    }
}
