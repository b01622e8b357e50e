//! Turn-based tactical encounter engine.
//!
//! Orders combatants by initiative, tracks each combatant's action economy,
//! resolves single-target and area actions, and directs adversaries through
//! generic or scripted policies. Presentation and persistence live elsewhere;
//! the engine only emits log lines, events and snapshots.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

pub mod api;
pub mod combat;
pub mod combatant;
pub mod conditions;
pub mod content;
pub mod encounter;
pub mod formula;
pub mod ledger;
pub mod life;
pub mod log;

pub use combat::{ActionError, ActionShape, ActionTemplate, CostClass, EffectKind, Target};
pub use combatant::{Combatant, CombatantId, Faction, Position};
pub use conditions::{Condition, ConditionSet};
pub use encounter::{Encounter, Outcome};
pub use formula::Formula;
pub use ledger::{LedgerError, ResourceKind, ResourceLedger};
pub use life::{LifeState, Vitals};
pub use log::{EncounterEvent, EncounterLog, LogEntry};

/// Source of every random number the engine consumes.
///
/// Seeded dice are reproducible; scripted dice replay fixed faces first and
/// fall back to a zero-seeded generator once the script runs out.
#[derive(Debug, Clone)]
pub struct Dice {
    rng: ChaCha8Rng,
    scripted: VecDeque<u32>,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            scripted: VecDeque::new(),
        }
    }

    pub fn from_scripted(faces: Vec<u32>) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(0),
            scripted: faces.into(),
        }
    }

    /// Roll one die with `sides` faces. Scripted faces are clamped into range.
    pub fn roll(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        match self.scripted.pop_front() {
            Some(face) => face.clamp(1, sides),
            None => self.rng.gen_range(1..=sides),
        }
    }

    pub fn d20(&mut self) -> u32 {
        self.roll(20)
    }

    /// Percentile test: true when a d100 lands at or under `probability` × 100.
    pub fn chance(&mut self, probability: f64) -> bool {
        let threshold = (probability.clamp(0.0, 1.0) * 100.0).round() as u32;
        self.roll(100) <= threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackRoll {
    pub roll: i32,
    pub bonus: i32,
    pub total: i32,
    pub armor: i32,
    pub hit: bool,
}

/// Roll a d20, add the to-hit bonus, compare against armor. Meets-or-exceeds hits.
pub fn attack_check(dice: &mut Dice, bonus: i32, armor: i32) -> AttackRoll {
    let roll = dice.d20() as i32;
    let total = roll + bonus;
    AttackRoll {
        roll,
        bonus,
        total,
        armor,
        hit: total >= armor,
    }
}

/// Ability modifier = floor((score - 10) / 2), used for initiative from a dexterity score.
pub fn ability_mod(score: i32) -> i32 {
    // `div_euclid` with positive divisor matches mathematical floor division.
    (score - 10).div_euclid(2)
}
