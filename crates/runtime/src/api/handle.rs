//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! driving encounters, submitting requests, querying snapshots, or streaming
//! events from specific topics. Rule refusals surface as
//! [`RuntimeError::Rule`].
use tokio::sync::{broadcast, mpsc, oneshot};

use combat_core::{
    CastOutcome, CombatState, Combatant, CombatantId, ConditionSnapshot, DamageOptions,
    DamageOutcome, DamageRequest, EncounterId, MeleeOutcome, ThreatSnapshot,
};

use super::errors::{Result, RuntimeError};
use crate::authority::{ParticipantId, RequestEnvelope};
use crate::events::{Event, EventBus, LogEntry, Notice, Topic};
use crate::workers::{Command, TurnOutcome};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Adds a combatant to the roster and returns its id.
    pub async fn spawn(&self, combatant: Combatant) -> Result<CombatantId> {
        self.request(|reply| Command::Spawn {
            combatant: Box::new(combatant),
            reply,
        })
        .await
    }

    pub async fn summon(
        &self,
        owner: CombatantId,
        kind: &str,
        variant: Option<&str>,
    ) -> Result<CombatantId> {
        let id = self
            .request(|reply| Command::Summon {
                owner,
                kind: kind.to_owned(),
                variant: variant.map(str::to_owned),
                reply,
            })
            .await??;
        Ok(id)
    }

    pub async fn begin_encounter(&self, encounter: EncounterId) -> Result<()> {
        self.request(|reply| Command::BeginEncounter { encounter, reply })
            .await
    }

    pub async fn end_encounter(&self) -> Result<()> {
        self.request(|reply| Command::EndEncounter { reply }).await??;
        Ok(())
    }

    /// Turn-advance trigger using the default turn order.
    pub async fn advance_turn(&self, round: u32, turn: u32) -> Result<TurnOutcome> {
        self.advance_turn_for(round, turn, None).await
    }

    /// Turn-advance trigger with an explicit active combatant.
    pub async fn advance_turn_for(
        &self,
        round: u32,
        turn: u32,
        active: Option<CombatantId>,
    ) -> Result<TurnOutcome> {
        let outcome = self
            .request(|reply| Command::AdvanceTurn {
                round,
                turn,
                active,
                reply,
            })
            .await??;
        Ok(outcome)
    }

    pub async fn cast(
        &self,
        caster: CombatantId,
        ability: &str,
        target: Option<CombatantId>,
    ) -> Result<CastOutcome> {
        let outcome = self
            .request(|reply| Command::Cast {
                caster,
                ability: ability.to_owned(),
                target,
                reply,
            })
            .await??;
        Ok(outcome)
    }

    /// Melee attack with every swing haste allows this turn.
    pub async fn attack(&self, attacker: CombatantId, target: CombatantId) -> Result<Vec<MeleeOutcome>> {
        let outcomes = self
            .request(|reply| Command::Attack {
                attacker,
                target,
                reply,
            })
            .await??;
        Ok(outcomes)
    }

    pub async fn apply_damage(
        &self,
        request: DamageRequest,
        options: DamageOptions,
    ) -> Result<DamageOutcome> {
        let outcome = self
            .request(|reply| Command::ApplyDamage {
                request,
                options,
                reply,
            })
            .await??;
        Ok(outcome)
    }

    /// Submits a request on behalf of a participant.
    ///
    /// The notice is the only answer: an unauthorized or refused request
    /// gets the same generic "not applied" notice.
    pub async fn submit(&self, envelope: RequestEnvelope) -> Result<Notice> {
        self.request(|reply| Command::Submit { envelope, reply })
            .await
    }

    /// Parses a JSON request body and submits it.
    pub async fn submit_json(&self, requester: ParticipantId, body: &str) -> Result<Notice> {
        let envelope = RequestEnvelope::from_json(requester, body)
            .map_err(|e| RuntimeError::InvalidPayload(e.to_string()))?;
        self.submit(envelope).await
    }

    /// Top `top` threat rows of a hostile.
    pub async fn threat_snapshot(&self, hostile: CombatantId, top: usize) -> Result<ThreatSnapshot> {
        self.request(|reply| Command::ThreatSnapshot {
            hostile,
            top,
            reply,
        })
        .await?
        .ok_or(RuntimeError::UnknownCombatant(hostile))
    }

    pub async fn condition_snapshot(&self, combatant: CombatantId) -> Result<ConditionSnapshot> {
        self.request(|reply| Command::ConditionSnapshot { combatant, reply })
            .await?
            .ok_or(RuntimeError::UnknownCombatant(combatant))
    }

    /// The last `limit` events, oldest first.
    pub async fn recent_events(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.request(|reply| Command::RecentEvents { limit, reply })
            .await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Combat` - Rule-level events from every engine operation
    /// - `Topic::Turn` - Turn triggers and AI decisions
    /// - `Topic::Notice` - Answers to submitted requests
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use combat_runtime::Topic;
    ///
    /// let mut turns = handle.subscribe(Topic::Turn);
    /// while let Ok(event) = turns.recv().await {
    ///     // Handle turn events
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Query the current combat state (read-only snapshot)
    pub async fn query_state(&self) -> Result<CombatState> {
        self.request(|reply| Command::QueryState { reply }).await
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
