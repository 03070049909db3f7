//! Routing of gateway events to the flows waiting on them.
//!
//! Each session flow subscribes with an [`EventFilter`] describing the
//! channel or message it is waiting on. [`EventHub::dispatch`] delivers an
//! event to every matching subscription; events nobody is waiting for are
//! dropped. A subscription unregisters itself when dropped, so an abandoned
//! or timed-out wait leaves nothing behind.

use crate::{ChannelId, MessageId, UserId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};

/// An event delivered by the platform gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// A user added a reaction to a message.
    ReactionAdded {
        /// Channel holding the message
        channel: ChannelId,
        /// Message that was reacted to
        message: MessageId,
        /// Unicode emoji of the reaction
        emoji: String,
        /// Reacting user
        user: UserId,
    },
    /// A user posted a text message.
    MessageReceived {
        /// Channel the message was posted in
        channel: ChannelId,
        /// Identifier of the posted message
        message: MessageId,
        /// Message author
        author: UserId,
        /// Raw message content
        content: String,
    },
}

impl GatewayEvent {
    /// Channel the event happened in.
    pub fn channel(&self) -> ChannelId {
        match self {
            GatewayEvent::ReactionAdded { channel, .. }
            | GatewayEvent::MessageReceived { channel, .. } => *channel,
        }
    }

    /// User who caused the event.
    pub fn actor(&self) -> UserId {
        match self {
            GatewayEvent::ReactionAdded { user, .. } => *user,
            GatewayEvent::MessageReceived { author, .. } => *author,
        }
    }
}

/// Which events a subscription receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    /// Reactions added to one message
    ReactionsOn(MessageId),
    /// Text messages posted in one channel
    MessagesIn(ChannelId),
}

impl EventFilter {
    /// Whether the event falls under this filter.
    pub fn matches(&self, event: &GatewayEvent) -> bool {
        match (self, event) {
            (EventFilter::ReactionsOn(id), GatewayEvent::ReactionAdded { message, .. }) => {
                id == message
            }
            (EventFilter::MessagesIn(id), GatewayEvent::MessageReceived { channel, .. }) => {
                id == channel
            }
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct HubState {
    next_id: u64,
    subscribers: HashMap<u64, (EventFilter, mpsc::UnboundedSender<GatewayEvent>)>,
}

/// Fan-out point between the gateway and the session flows.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    state: Arc<Mutex<HubState>>,
}

impl EventHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start receiving events matching `filter`.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.insert(id, (filter, tx));
        debug!(?filter, subscription = id, "Subscribed to gateway events");

        Subscription {
            id,
            rx,
            hub: Arc::clone(&self.state),
        }
    }

    /// Deliver an event to every matching subscription.
    ///
    /// Returns how many subscriptions received it; zero means it was dropped.
    pub fn dispatch(&self, event: GatewayEvent) -> usize {
        let mut state = self.state.lock();
        let mut delivered = 0;
        state.subscribers.retain(|_, (filter, tx)| {
            if !filter.matches(&event) {
                return true;
            }
            match tx.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });

        if delivered == 0 {
            trace!(channel = %event.channel(), "No subscription for gateway event");
        }
        delivered
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

/// A live event subscription owned by one waiting flow.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<GatewayEvent>,
    hub: Arc<Mutex<HubState>>,
}

impl Subscription {
    /// Wait for the next matching event with no deadline.
    pub async fn next(&mut self) -> Option<GatewayEvent> {
        self.rx.recv().await
    }

    /// Wait for the next matching event, giving up at `deadline`.
    ///
    /// Returns `None` when the deadline passes first.
    pub async fn next_until(&mut self, deadline: Instant) -> Option<GatewayEvent> {
        tokio::time::timeout_at(deadline, self.rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Discard events that were queued but not yet consumed.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.lock().subscribers.remove(&self.id);
    }
}
