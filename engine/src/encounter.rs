//! The encounter aggregate: roster, sequencer, dice and log behind one
//! `&mut self` surface.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::actions::{CostClass, Target};
use crate::combat::resolver::{self, Resolution, Scene};
use crate::combat::sequencer::{self, Phase, SequenceError, TurnSequencer};
use crate::combat::{ActionError, Roster, combatant_at, director};
use crate::combatant::{Combatant, CombatantId, Faction, Position};
use crate::conditions::ConditionSet;
use crate::ledger::{ResourceKind, ResourceLedger};
use crate::life::Vitals;
use crate::log::{EncounterEvent, EncounterLog};
use crate::Dice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat,
    Flee,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Victory => "victory",
            Outcome::Defeat => "defeat",
            Outcome::Flee => "flee",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("encounter roster is empty")]
    EmptyRoster,
    #[error("duplicate combatant id '{0}'")]
    DuplicateId(CombatantId),
    #[error("combatant '{id}' has max hp {max_hp}; it must be positive")]
    InvalidHitPoints { id: CombatantId, max_hp: i32 },
    #[error("no combatant template named '{0}'")]
    UnknownTemplate(String),
    #[error("no built-in script named '{0}'")]
    UnknownScript(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    pub name: String,
    pub faction: Faction,
    pub initiative: i32,
    pub vitals: Vitals,
    pub conditions: ConditionSet,
    pub resources: ResourceLedger,
    pub position: Position,
}

impl From<&Combatant> for CombatantSnapshot {
    fn from(c: &Combatant) -> Self {
        Self {
            id: c.id().clone(),
            name: c.name().to_string(),
            faction: c.faction(),
            initiative: c.initiative(),
            vitals: *c.vitals(),
            conditions: c.conditions().clone(),
            resources: *c.resources(),
            position: c.position(),
        }
    }
}

/// Read-only copy of encounter state for presentation and persistence.
#[derive(Debug, Clone, Serialize)]
pub struct EncounterSnapshot {
    pub round: u32,
    pub phase: Phase,
    pub active: Option<CombatantId>,
    pub combatants: Vec<CombatantSnapshot>,
}

#[derive(Debug, Clone)]
pub struct Encounter {
    roster: Roster,
    sequencer: TurnSequencer,
    dice: Dice,
    log: EncounterLog,
}

impl Encounter {
    /// Validate the roster and roll initiative. The encounter waits for
    /// [`Encounter::start`].
    pub fn new(combatants: Vec<Combatant>, mut dice: Dice) -> Result<Self, AssemblyError> {
        if combatants.is_empty() {
            return Err(AssemblyError::EmptyRoster);
        }
        let mut seen = HashSet::new();
        let mut roster = Roster::with_capacity(combatants.len());
        for combatant in combatants {
            if combatant.max_hp() <= 0 {
                return Err(AssemblyError::InvalidHitPoints {
                    id: combatant.id().clone(),
                    max_hp: combatant.max_hp(),
                });
            }
            if !seen.insert(combatant.id().clone()) {
                return Err(AssemblyError::DuplicateId(combatant.id().clone()));
            }
            roster.insert(combatant.id().clone(), combatant);
        }

        let mut log = EncounterLog::new();
        sequencer::roll_initiative(&mut roster, &mut dice, &mut log);
        tracing::debug!(combatants = roster.len(), "encounter assembled");

        Ok(Self {
            roster,
            sequencer: TurnSequencer::new(),
            dice,
            log,
        })
    }

    /// Open round 1. Termination is checked first, so a roster with an
    /// empty side resolves immediately.
    pub fn start(&mut self) -> Result<(), SequenceError> {
        self.sequencer.ensure_awaiting_start()?;
        let count = |faction: Faction| {
            self.roster
                .values()
                .filter(|c| c.faction() == faction)
                .count()
        };
        let line = format!(
            "[START] players: {}, adversaries: {}",
            count(Faction::Player),
            count(Faction::Adversary)
        );
        self.log.push(0, line);
        if self.check_termination().is_some() {
            return Ok(());
        }
        self.sequencer.start(&mut self.roster, &mut self.log)
    }

    /// Validate and resolve one action. A rejection is logged as `[REJECT]`
    /// and returned; it changes nothing else.
    pub fn submit_action(
        &mut self,
        actor: &CombatantId,
        action: &str,
        target: Target,
    ) -> Result<Resolution, ActionError> {
        let result = self.try_action(actor, action, &target);
        match &result {
            Ok(_) => {
                self.check_termination();
            }
            Err(err) => self.reject(actor, err),
        }
        result
    }

    fn try_action(
        &mut self,
        actor: &CombatantId,
        action: &str,
        target: &Target,
    ) -> Result<Resolution, ActionError> {
        let phase = self.sequencer.phase();
        let active = self
            .sequencer
            .active_index()
            .ok_or(ActionError::NotAccepting(phase))?;
        let idx = self
            .roster
            .get_index_of(actor)
            .ok_or_else(|| ActionError::UnknownCombatant(actor.clone()))?;
        let combatant = combatant_at(&self.roster, idx)
            .ok_or_else(|| ActionError::UnknownCombatant(actor.clone()))?;
        if combatant.is_defeated() {
            return Err(ActionError::ActorDefeated(actor.clone()));
        }
        let template = combatant
            .action(action)
            .cloned()
            .ok_or_else(|| ActionError::UnknownAction {
                actor: actor.clone(),
                action: action.to_string(),
            })?;
        // Reactions may be taken on anyone's turn.
        if template.cost != CostClass::Reaction && idx != active {
            return Err(ActionError::OutOfTurn(actor.clone()));
        }

        let scene = Scene {
            roster: &mut self.roster,
            dice: &mut self.dice,
            log: &mut self.log,
            round: self.sequencer.round(),
        };
        resolver::resolve(scene, idx, &template, target)
    }

    /// Move the active combatant. Distance is counted in grid squares
    /// (diagonals count as one) and paid from the movement budget. Returns
    /// the feet of movement left.
    pub fn submit_move(&mut self, actor: &CombatantId, to: Position) -> Result<u32, ActionError> {
        let result = self.try_move(actor, to);
        if let Err(err) = &result {
            self.reject(actor, err);
        }
        result
    }

    fn try_move(&mut self, actor: &CombatantId, to: Position) -> Result<u32, ActionError> {
        let phase = self.sequencer.phase();
        let active = self
            .sequencer
            .active_index()
            .ok_or(ActionError::NotAccepting(phase))?;
        let idx = self
            .roster
            .get_index_of(actor)
            .ok_or_else(|| ActionError::UnknownCombatant(actor.clone()))?;
        if idx != active {
            return Err(ActionError::OutOfTurn(actor.clone()));
        }
        let round = self.sequencer.round();
        let Some((_, combatant)) = self.roster.get_index_mut(idx) else {
            return Err(ActionError::UnknownCombatant(actor.clone()));
        };
        if combatant.is_defeated() {
            return Err(ActionError::ActorDefeated(actor.clone()));
        }
        let from = combatant.position();
        let feet = from.distance_ft(to);
        combatant
            .resources_mut()
            .spend(ResourceKind::Movement, feet)
            .map_err(|source| ActionError::ResourceInsufficiency {
                actor: actor.clone(),
                resource: ResourceKind::Movement,
                source,
            })?;
        combatant.set_position(to);
        let left = combatant.resources().movement();
        let line = format!(
            "[MOVE][{}] {} → {} ({} ft, {} ft left)",
            combatant.name(),
            from,
            to,
            feet,
            left
        );
        self.log.push(round, line);
        Ok(left)
    }

    /// Close the active turn and open the next.
    pub fn end_turn(&mut self) -> Result<(), SequenceError> {
        self.sequencer.advance(&mut self.roster, &mut self.log)
    }

    /// The party withdraws. Returns false if the encounter was already over.
    pub fn force_flee(&mut self) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.sequencer.resolve(Outcome::Flee, &mut self.log);
        true
    }

    /// Let the director act for whoever holds the turn, then end the turn.
    /// A rejected decision is logged and the turn still ends.
    pub fn play_directed_turn(&mut self) -> Result<Option<Resolution>, SequenceError> {
        let idx = self.sequencer.require_in_turn()?;
        let Some(actor) = combatant_at(&self.roster, idx) else {
            return Err(SequenceError::NoneStanding);
        };
        let actor_id = actor.id().clone();
        let actor_name = actor.name().to_string();

        let resolution = match director::decide(&self.roster, idx, &mut self.dice) {
            Some(decision) => self
                .submit_action(&actor_id, &decision.action, decision.target)
                .ok(),
            None => {
                self.log.push(
                    self.sequencer.round(),
                    format!("[IDLE][{}] has nothing to do", actor_name),
                );
                None
            }
        };

        if !self.is_resolved() {
            self.end_turn()?;
        }
        Ok(resolution)
    }

    /// Play directed turns until a player holds the turn or the encounter ends.
    pub fn run_adversary_turns(&mut self) -> Result<Vec<Resolution>, SequenceError> {
        let mut resolutions = Vec::new();
        while let Some(active) = self.active() {
            if active.faction() != Faction::Adversary {
                break;
            }
            if let Some(resolution) = self.play_directed_turn()? {
                resolutions.push(resolution);
            }
        }
        Ok(resolutions)
    }

    fn check_termination(&mut self) -> Option<Outcome> {
        if self.is_resolved() {
            return self.outcome();
        }
        let standing = |faction: Faction| {
            self.roster
                .values()
                .any(|c| c.faction() == faction && !c.is_defeated())
        };
        let outcome = if !standing(Faction::Adversary) {
            Outcome::Victory
        } else if !standing(Faction::Player) {
            Outcome::Defeat
        } else {
            return None;
        };
        self.sequencer.resolve(outcome, &mut self.log);
        Some(outcome)
    }

    fn reject(&mut self, actor: &CombatantId, err: &ActionError) {
        tracing::debug!(actor = %actor, error = %err, "action rejected");
        let name = self
            .roster
            .get(actor)
            .map_or_else(|| actor.to_string(), |c| c.name().to_string());
        self.log.push(
            self.sequencer.round(),
            format!("[REJECT][{}] {}", name, err),
        );
    }

    pub fn phase(&self) -> Phase {
        self.sequencer.phase()
    }

    pub fn round(&self) -> u32 {
        self.sequencer.round()
    }

    pub fn active(&self) -> Option<&Combatant> {
        self.sequencer
            .active_index()
            .and_then(|idx| combatant_at(&self.roster, idx))
    }

    pub fn active_id(&self) -> Option<&CombatantId> {
        self.active().map(Combatant::id)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.sequencer.phase() {
            Phase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn combatant(&self, id: &CombatantId) -> Option<&Combatant> {
        self.roster.get(id)
    }

    /// Combatants in initiative order.
    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.roster.values()
    }

    pub fn log(&self) -> &EncounterLog {
        &self.log
    }

    pub fn drain_events(&mut self) -> Vec<EncounterEvent> {
        self.log.drain_events()
    }

    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            round: self.round(),
            phase: self.phase(),
            active: self.active_id().cloned(),
            combatants: self.roster.values().map(CombatantSnapshot::from).collect(),
        }
    }
}
