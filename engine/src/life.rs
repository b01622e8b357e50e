use serde::{Deserialize, Serialize};

use crate::conditions::{Condition, ConditionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeState {
    Active,
    Defeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub hp: i32,
    pub max_hp: i32,
    pub armor: i32,
    pub state: LifeState,
}

impl Vitals {
    pub fn new(max_hp: i32, armor: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            armor,
            state: LifeState::Active,
        }
    }

    /// Start below full health. Clamped into `0..=max_hp`; zero starts defeated.
    pub fn with_current(mut self, hp: i32) -> Self {
        self.hp = hp.clamp(0, self.max_hp);
        if self.hp == 0 {
            self.state = LifeState::Defeated;
        }
        self
    }

    pub fn is_defeated(&self) -> bool {
        matches!(self.state, LifeState::Defeated)
    }

    /// Remaining hit points as a fraction of maximum.
    pub fn fraction(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        self.hp as f64 / self.max_hp as f64
    }
}

/// Apply damage and handle the drop to 0. Returns true if the combatant was defeated by this call.
pub fn apply_damage(
    name: &str,
    vitals: &mut Vitals,
    conditions: &mut ConditionSet,
    dmg: i32,
    mut log: impl FnMut(String),
) -> bool {
    if vitals.is_defeated() {
        return false;
    }

    let dmg = dmg.max(0);
    let before = vitals.hp;
    vitals.hp = (vitals.hp - dmg).max(0);
    log(format!(
        "[HP][{}] {} → {} (−{})",
        name, before, vitals.hp, dmg
    ));

    if before > 0 && vitals.hp == 0 {
        vitals.state = LifeState::Defeated;
        if conditions.insert(Condition::Unconscious) {
            log(format!("[COND][{}] gains unconscious", name));
        }
        log(format!("[DEFEAT][{}] drops to 0 HP", name));
        return true;
    }
    false
}

/// Healing, capped at maximum. Defeated combatants are not valid recipients. Returns hp restored.
pub fn heal(name: &str, vitals: &mut Vitals, amount: i32, mut log: impl FnMut(String)) -> i32 {
    if amount <= 0 || vitals.is_defeated() {
        return 0;
    }
    let before = vitals.hp;
    vitals.hp = (vitals.hp + amount).min(vitals.max_hp);
    log(format!(
        "[HEAL][{}] +{} HP ({} → {})",
        name,
        vitals.hp - before,
        before,
        vitals.hp
    ));
    vitals.hp - before
}
