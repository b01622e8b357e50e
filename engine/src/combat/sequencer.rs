//! Initiative order and the turn/round state machine.
//!
//! `AwaitingStart → InTurn → (RoundBoundary →) InTurn … → Resolved`.
//! The functions here are the only writers of the round counter, the active
//! index and the phase, and the only place ledgers are refilled.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::{Roster, combatant_at, combatant_at_mut};
use crate::Dice;
use crate::encounter::Outcome;
use crate::ledger::ResourceKind;
use crate::log::{EncounterEvent, EncounterLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingStart,
    InTurn,
    /// Held only while `end_turn` wraps the round; callers see the `[ROUND]`
    /// log line instead, never this phase.
    RoundBoundary,
    Resolved(Outcome),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::AwaitingStart => f.write_str("awaiting start"),
            Phase::InTurn => f.write_str("in turn"),
            Phase::RoundBoundary => f.write_str("round boundary"),
            Phase::Resolved(outcome) => write!(f, "resolved: {}", outcome),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("encounter already started")]
    AlreadyStarted,
    #[error("encounter has not started")]
    NotStarted,
    #[error("encounter already resolved ({0})")]
    Resolved(Outcome),
    #[error("no combatant is left standing")]
    NoneStanding,
}

#[derive(Debug, Clone)]
pub struct TurnSequencer {
    phase: Phase,
    round: u32,
    active: usize,
}

impl Default for TurnSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnSequencer {
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitingStart,
            round: 1,
            active: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Index of the combatant whose turn is open, if any.
    pub fn active_index(&self) -> Option<usize> {
        matches!(self.phase, Phase::InTurn).then_some(self.active)
    }

    pub fn ensure_awaiting_start(&self) -> Result<(), SequenceError> {
        match self.phase {
            Phase::AwaitingStart => Ok(()),
            Phase::Resolved(outcome) => Err(SequenceError::Resolved(outcome)),
            Phase::InTurn | Phase::RoundBoundary => Err(SequenceError::AlreadyStarted),
        }
    }

    pub fn require_in_turn(&self) -> Result<usize, SequenceError> {
        match self.phase {
            Phase::InTurn => Ok(self.active),
            Phase::Resolved(outcome) => Err(SequenceError::Resolved(outcome)),
            Phase::AwaitingStart | Phase::RoundBoundary => Err(SequenceError::NotStarted),
        }
    }

    pub(crate) fn start(
        &mut self,
        roster: &mut Roster,
        log: &mut EncounterLog,
    ) -> Result<(), SequenceError> {
        self.ensure_awaiting_start()?;
        let first = next_standing(roster, None).ok_or(SequenceError::NoneStanding)?;
        self.round = 1;
        log.push(self.round, format!("[ROUND] {}", self.round));
        self.begin_turn(first, roster, log);
        Ok(())
    }

    /// Close the active turn and open the next one, crossing a round boundary
    /// when the active combatant was the last one standing in order.
    pub(crate) fn advance(
        &mut self,
        roster: &mut Roster,
        log: &mut EncounterLog,
    ) -> Result<(), SequenceError> {
        let current = self.require_in_turn()?;
        let next = match next_standing(roster, Some(current)) {
            Some(next) => next,
            None => {
                self.round_boundary(roster, log);
                next_standing(roster, None).ok_or(SequenceError::NoneStanding)?
            }
        };
        self.begin_turn(next, roster, log);
        Ok(())
    }

    pub(crate) fn resolve(&mut self, outcome: Outcome, log: &mut EncounterLog) {
        if matches!(self.phase, Phase::Resolved(_)) {
            return;
        }
        self.phase = Phase::Resolved(outcome);
        tracing::info!(%outcome, round = self.round, "encounter resolved");
        log.push(self.round, format!("[END] {}", outcome));
        log.emit(EncounterEvent::EncounterResolved { outcome });
    }

    fn round_boundary(&mut self, roster: &mut Roster, log: &mut EncounterLog) {
        self.phase = Phase::RoundBoundary;
        self.round += 1;
        for combatant in roster.values_mut() {
            combatant.resources_mut().refill(ResourceKind::Reaction);
        }
        tracing::debug!(round = self.round, "round boundary");
        log.push(self.round, format!("[ROUND] {}", self.round));
    }

    fn begin_turn(&mut self, idx: usize, roster: &mut Roster, log: &mut EncounterLog) {
        self.active = idx;
        self.phase = Phase::InTurn;
        let Some(combatant) = combatant_at_mut(roster, idx) else {
            return;
        };
        combatant.resources_mut().refill_turn();
        let id = combatant.id().clone();
        tracing::debug!(active = %id, round = self.round, "turn begins");
        log.push(self.round, format!("[TURN][{}]", combatant.name()));
        log.emit(EncounterEvent::TurnAdvanced {
            active: id,
            round: self.round,
        });
    }
}

/// Assign initiative once: pre-rolled values are kept, everyone else rolls
/// d20 + bonus. Then order the roster.
pub fn roll_initiative(roster: &mut Roster, dice: &mut Dice, log: &mut EncounterLog) {
    for combatant in roster.values_mut() {
        let line = match combatant.fixed_initiative() {
            Some(fixed) => {
                combatant.set_initiative(fixed);
                format!("[INIT][{}] {} (pre-rolled)", combatant.name(), fixed)
            }
            None => {
                let roll = dice.d20() as i32;
                let bonus = combatant.initiative_bonus();
                combatant.set_initiative(roll + bonus);
                format!(
                    "[INIT][{}] d20={} {:+} = {}",
                    combatant.name(),
                    roll,
                    bonus,
                    roll + bonus
                )
            }
        };
        log.push(0, line);
    }
    sort_by_initiative(roster);
}

/// Descending by initiative. The sort is stable, so ties keep insertion order.
pub fn sort_by_initiative(roster: &mut Roster) {
    roster.sort_by(|_, a, _, b| b.initiative().cmp(&a.initiative()));
}

/// First non-defeated index strictly after `after` (or from the top when `None`).
pub fn next_standing(roster: &Roster, after: Option<usize>) -> Option<usize> {
    let start = after.map_or(0, |i| i + 1);
    (start..roster.len()).find(|&i| combatant_at(roster, i).is_some_and(|c| !c.is_defeated()))
}
