//! Typed requests from non-authoritative parties.
//!
//! Messages arrive as JSON (`{"type": "dismissSummon", ...}`). Pet
//! configuration changes are a free-form map filtered through a fixed
//! whitelist before anything reaches the rules.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use combat_core::{AiMode, CombatState, CombatantId, FailureReason, PetConfigChange, RuleResult};

use super::ownership::ParticipantId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    DismissSummon {
        owner: CombatantId,
        kind: String,
    },
    UpdatePetConfig {
        owner: CombatantId,
        #[serde(default)]
        pet: Option<CombatantId>,
        #[serde(default)]
        kind: Option<String>,
        changes: Map<String, Value>,
    },
    RenamePet {
        owner: CombatantId,
        #[serde(default)]
        pet: Option<CombatantId>,
        #[serde(default)]
        kind: Option<String>,
        nickname: Option<String>,
    },
    SwapSummonVariant {
        owner: CombatantId,
        kind: String,
        #[serde(default)]
        variant: Option<String>,
    },
    ApplyCharm {
        caster: CombatantId,
        target: CombatantId,
        rounds: u32,
    },
}

impl Request {
    /// The combatant whose owner must authorize this request.
    pub fn owning_combatant(&self) -> CombatantId {
        match self {
            Request::DismissSummon { owner, .. }
            | Request::UpdatePetConfig { owner, .. }
            | Request::RenamePet { owner, .. }
            | Request::SwapSummonVariant { owner, .. } => *owner,
            Request::ApplyCharm { caster, .. } => *caster,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Request::DismissSummon { .. } => "dismissSummon",
            Request::UpdatePetConfig { .. } => "updatePetConfig",
            Request::RenamePet { .. } => "renamePet",
            Request::SwapSummonVariant { .. } => "swapSummonVariant",
            Request::ApplyCharm { .. } => "applyCharm",
        }
    }
}

/// A request tagged with the participant who sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub requester: ParticipantId,
    pub request: Request,
}

impl RequestEnvelope {
    pub fn new(requester: ParticipantId, request: Request) -> Self {
        Self { requester, request }
    }

    /// Parses a request body. The requester comes from the transport, never
    /// from the body.
    pub fn from_json(requester: ParticipantId, body: &str) -> serde_json::Result<Self> {
        let request = serde_json::from_str(body)?;
        Ok(Self { requester, request })
    }
}

/// Why a change map could not be turned into whitelisted changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChangeError {
    #[error("key `{0}` is not configurable")]
    NotAllowed(String),

    #[error("value for `{key}` is invalid: {message}")]
    InvalidValue { key: String, message: String },
}

/// Maps whitelisted keys to typed changes. Any other key rejects the map.
pub fn parse_changes(changes: &Map<String, Value>) -> Result<Vec<PetConfigChange>, ChangeError> {
    changes
        .iter()
        .map(|(key, value)| {
            let invalid = |e: serde_json::Error| ChangeError::InvalidValue {
                key: key.clone(),
                message: e.to_string(),
            };
            let value = value.clone();
            let change = match key.as_str() {
                "mode" => PetConfigChange::Mode(
                    serde_json::from_value::<AiMode>(value).map_err(invalid)?,
                ),
                "enabled" => PetConfigChange::Enabled(serde_json::from_value(value).map_err(invalid)?),
                "followDistance" => {
                    PetConfigChange::FollowDistance(serde_json::from_value(value).map_err(invalid)?)
                }
                "autoTaunt" => PetConfigChange::AutoTaunt(serde_json::from_value(value).map_err(invalid)?),
                "rotationProfile" => {
                    PetConfigChange::RotationProfile(serde_json::from_value(value).map_err(invalid)?)
                }
                "nickname" => PetConfigChange::Nickname(serde_json::from_value(value).map_err(invalid)?),
                other => return Err(ChangeError::NotAllowed(other.to_owned())),
            };
            Ok(change)
        })
        .collect()
}

/// Resolves the pet a request addresses: an explicit id owned by `owner`, or
/// the owner's active summon of `kind`.
pub fn resolve_pet(
    state: &CombatState,
    owner: CombatantId,
    pet: Option<CombatantId>,
    kind: Option<&str>,
) -> RuleResult<CombatantId> {
    match (pet, kind) {
        (Some(pet), _) => {
            let combatant = state.roster.get(pet).ok_or(FailureReason::NotFound)?;
            if combatant.owner == Some(owner) {
                Ok(pet)
            } else {
                Err(FailureReason::NoPermission)
            }
        }
        (None, Some(kind)) => state
            .roster
            .active_summon(owner, kind)
            .ok_or(FailureReason::NotFound),
        (None, None) => Err(FailureReason::NoTarget),
    }
}
