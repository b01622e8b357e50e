//! Turn sequencing, action resolution and adversary direction.

use indexmap::IndexMap;
use thiserror::Error;

use crate::combatant::{Combatant, CombatantId};
use crate::ledger::{LedgerError, ResourceKind};

pub mod actions;
pub mod director;
pub mod resolver;
pub mod sequencer;

pub use actions::{ActionShape, ActionTemplate, CostClass, EffectKind, Target};
pub use director::{Decision, Predicate, Rule, Script, TargetSelector};
pub use resolver::{Resolution, TargetOutcome};
pub use sequencer::{Phase, SequenceError, TurnSequencer};

/// Participants keyed by id, kept in initiative order.
pub type Roster = IndexMap<CombatantId, Combatant>;

/// Why a submitted action or move was discarded. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{actor} cannot spend {resource}: {source}")]
    ResourceInsufficiency {
        actor: CombatantId,
        resource: ResourceKind,
        source: LedgerError,
    },
    #[error("invalid target for {action}: {reason}")]
    InvalidTarget { action: String, reason: String },
    #[error("{actor} has no action named '{action}'")]
    UnknownAction { actor: CombatantId, action: String },
    #[error("no combatant with id '{0}'")]
    UnknownCombatant(CombatantId),
    #[error("it is not {0}'s turn")]
    OutOfTurn(CombatantId),
    #[error("{0} is defeated and cannot act")]
    ActorDefeated(CombatantId),
    #[error("encounter is not accepting actions ({0})")]
    NotAccepting(Phase),
}

pub(crate) fn combatant_at(roster: &Roster, idx: usize) -> Option<&Combatant> {
    roster.get_index(idx).map(|(_, c)| c)
}

pub(crate) fn combatant_at_mut(roster: &mut Roster, idx: usize) -> Option<&mut Combatant> {
    roster.get_index_mut(idx).map(|(_, c)| c)
}
