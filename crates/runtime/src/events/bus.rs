//! Topic-based event bus implementation.

use serde::Serialize;
use tokio::sync::broadcast;

use combat_core::CombatEvent;

use super::types::{Notice, TurnEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize)]
pub enum Topic {
    /// Rule-level events emitted by engine operations
    Combat,
    /// Turn triggers and AI decisions
    Turn,
    /// Observational notices answering requests
    Notice,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize)]
pub enum Event {
    Combat(CombatEvent),
    Turn(TurnEvent),
    Notice(Notice),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Combat(_) => Topic::Combat,
            Event::Turn(_) => Topic::Turn,
            Event::Notice(_) => Topic::Notice,
        }
    }

    /// Short stable label used by the rolling log.
    pub fn label(&self) -> &'static str {
        match self {
            Event::Combat(event) => event.name(),
            Event::Turn(event) => event.name(),
            Event::Notice(_) => "notice",
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing is best-effort: with no subscribers
/// the event is dropped.
#[derive(Clone)]
pub struct EventBus {
    combat: broadcast::Sender<Event>,
    turn: broadcast::Sender<Event>,
    notice: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            combat: broadcast::channel(capacity).0,
            turn: broadcast::channel(capacity).0,
            notice: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Combat => &self.combat,
            Topic::Turn => &self.turn,
            Topic::Notice => &self.notice,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "runtime::events", ?topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::ParticipantId;
    use combat_core::EncounterId;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut combat = bus.subscribe(Topic::Combat);
        let mut notice = bus.subscribe(Topic::Notice);

        bus.publish(Event::Combat(CombatEvent::EncounterStarted {
            encounter: EncounterId(1),
        }));
        bus.publish(Event::Notice(Notice::applied(ParticipantId(0), "dismissed")));

        assert!(matches!(combat.recv().await, Ok(Event::Combat(_))));
        assert!(matches!(notice.recv().await, Ok(Event::Notice(_))));
        assert!(combat.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(Event::Notice(Notice::rejected(ParticipantId(3))));
    }
}
