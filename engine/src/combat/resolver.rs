//! Action resolution: preconditions, targeting, hit checks and effects.
//!
//! Validation (resource, target) happens before anything is written, so a
//! rejected action leaves the roster and the log untouched. Once accepted,
//! resolution runs to completion.

use serde::Serialize;

use super::actions::{ActionShape, ActionTemplate, EffectKind, MINIMUM_AMOUNT, Target};
use super::{ActionError, Roster, combatant_at, combatant_at_mut};
use crate::combatant::{CombatantId, Position};
use crate::ledger::LedgerError;
use crate::life;
use crate::log::{EncounterEvent, EncounterLog};
use crate::{AttackRoll, Dice, attack_check};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    pub target: CombatantId,
    pub hit: bool,
    pub amount: i32,
    pub hp_before: i32,
    pub hp_after: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub actor: CombatantId,
    pub action: String,
    /// Present only when an attack check was rolled.
    pub attack: Option<AttackRoll>,
    pub outcomes: Vec<TargetOutcome>,
    pub defeated: Vec<CombatantId>,
}

impl Resolution {
    pub fn affected(&self) -> impl Iterator<Item = &CombatantId> {
        self.outcomes.iter().filter(|o| o.hit).map(|o| &o.target)
    }
}

/// Everything `resolve` needs to touch.
pub(crate) struct Scene<'a> {
    pub roster: &'a mut Roster,
    pub dice: &'a mut Dice,
    pub log: &'a mut EncounterLog,
    pub round: u32,
}

struct Aim {
    affected: Vec<usize>,
    label: String,
    centre: Option<Position>,
}

pub(crate) fn resolve(
    scene: Scene<'_>,
    actor_idx: usize,
    template: &ActionTemplate,
    target: &Target,
) -> Result<Resolution, ActionError> {
    let Scene {
        roster,
        dice,
        log,
        round,
    } = scene;

    let actor = combatant_at(roster, actor_idx)
        .ok_or_else(|| ActionError::InvalidTarget {
            action: template.name.clone(),
            reason: "acting combatant is not in the roster".into(),
        })?;
    let actor_id = actor.id().clone();
    let actor_name = actor.name().to_string();
    let actor_pos = actor.position();

    let resource = template.cost.resource();
    if !actor.resources().can_afford(resource) {
        return Err(ActionError::ResourceInsufficiency {
            actor: actor_id,
            resource,
            source: LedgerError::Spent(resource),
        });
    }

    let aim = aim(roster, actor_idx, template, target)?;

    if let Some(actor) = combatant_at_mut(roster, actor_idx) {
        actor
            .resources_mut()
            .spend(resource, 0)
            .map_err(|source| ActionError::ResourceInsufficiency {
                actor: actor_id.clone(),
                resource,
                source,
            })?;
    }

    tracing::debug!(actor = %actor_id, action = %template.name, target = %aim.label, "resolving");
    log.push(
        round,
        format!("[ACTION][{}] {} → {}", actor_name, template.name, aim.label),
    );

    let mut resolution = Resolution {
        actor: actor_id,
        action: template.name.clone(),
        attack: None,
        outcomes: Vec::new(),
        defeated: Vec::new(),
    };

    match template.shape {
        ActionShape::SingleTarget { range_ft } => {
            let Some(&idx) = aim.affected.first() else {
                return Ok(resolution);
            };
            if let Some(target) = combatant_at(roster, idx) {
                let distance = actor_pos.distance_ft(target.position());
                if distance > range_ft {
                    log.push(
                        round,
                        format!(
                            "[RANGE][{}] {} is {} ft away, beyond {} ft (advisory)",
                            actor_name,
                            target.name(),
                            distance,
                            range_ft
                        ),
                    );
                }
            }
            match template.effect {
                EffectKind::Damage => {
                    let armor = combatant_at(roster, idx).map_or(0, |c| c.armor());
                    let atk = attack_check(dice, template.to_hit, armor);
                    log.push(
                        round,
                        format!(
                            "[ATTACK][{}] d20={} {:+} = {} vs AC {} → {}",
                            actor_name,
                            atk.roll,
                            atk.bonus,
                            atk.total,
                            atk.armor,
                            if atk.hit { "HIT" } else { "MISS" }
                        ),
                    );
                    resolution.attack = Some(atk);
                    if atk.hit {
                        let amount = roll_amount(template, &actor_name, dice, log, round);
                        apply(roster, log, round, idx, template, amount, &mut resolution);
                    } else if let Some(target) = combatant_at(roster, idx) {
                        resolution.outcomes.push(TargetOutcome {
                            target: target.id().clone(),
                            hit: false,
                            amount: 0,
                            hp_before: target.hp(),
                            hp_after: target.hp(),
                        });
                    }
                }
                EffectKind::Healing => {
                    let amount = roll_amount(template, &actor_name, dice, log, round);
                    apply(roster, log, round, idx, template, amount, &mut resolution);
                }
            }
        }
        ActionShape::Area { .. } | ActionShape::SelfTarget => {
            if let (Some(centre), ActionShape::Area { radius_ft, .. }) = (aim.centre, template.shape)
            {
                log.push(
                    round,
                    format!(
                        "[AREA][{}] {} ft radius at {} catches {}",
                        actor_name,
                        radius_ft,
                        centre,
                        aim.affected.len()
                    ),
                );
            }
            let amount = roll_amount(template, &actor_name, dice, log, round);
            for &idx in &aim.affected {
                apply(roster, log, round, idx, template, amount, &mut resolution);
            }
        }
    }

    Ok(resolution)
}

/// Work out who the action affects. Nothing is written here.
fn aim(
    roster: &Roster,
    actor_idx: usize,
    template: &ActionTemplate,
    target: &Target,
) -> Result<Aim, ActionError> {
    let invalid = |reason: String| ActionError::InvalidTarget {
        action: template.name.clone(),
        reason,
    };
    let standing = |id: &CombatantId| -> Result<usize, ActionError> {
        let idx = roster
            .get_index_of(id)
            .ok_or_else(|| invalid(format!("no combatant with id '{}'", id)))?;
        match combatant_at(roster, idx) {
            Some(c) if !c.is_defeated() => Ok(idx),
            _ => Err(invalid(format!("{} is defeated", id))),
        }
    };
    let name_of = |idx: usize| combatant_at(roster, idx).map_or_else(String::new, |c| c.name().to_string());
    let actor_pos = combatant_at(roster, actor_idx).map_or_else(Position::default, |c| c.position());

    match template.shape {
        ActionShape::SingleTarget { .. } => {
            let idx = match target {
                Target::Combatant(id) => standing(id)?,
                Target::Myself => actor_idx,
                Target::Point(p) => {
                    return Err(invalid(format!(
                        "single-target action aimed at point {}",
                        p
                    )));
                }
            };
            Ok(Aim {
                affected: vec![idx],
                label: name_of(idx),
                centre: None,
            })
        }
        ActionShape::Area {
            range_ft,
            radius_ft,
        } => {
            let (centre, label) = match target {
                Target::Point(p) => (*p, format!("point {}", p)),
                Target::Combatant(id) => {
                    let idx = standing(id)?;
                    let pos = combatant_at(roster, idx).map_or(actor_pos, |c| c.position());
                    (pos, name_of(idx))
                }
                Target::Myself => (actor_pos, "self".to_string()),
            };
            if !matches!(target, Target::Myself) {
                let distance = actor_pos.distance_ft(centre);
                if distance > range_ft {
                    return Err(invalid(format!(
                        "{} is {} ft away, range is {} ft",
                        label, distance, range_ft
                    )));
                }
            }
            // An area centred on the actor emanates from it and spares it.
            let spares_actor = matches!(target, Target::Myself);
            let affected = roster
                .values()
                .enumerate()
                .filter(|(i, _)| !(spares_actor && *i == actor_idx))
                .filter(|(_, c)| !c.is_defeated() && c.position().within_radius(centre, radius_ft))
                .map(|(i, _)| i)
                .collect();
            Ok(Aim {
                affected,
                label,
                centre: Some(centre),
            })
        }
        ActionShape::SelfTarget => match target {
            Target::Myself => Ok(Aim {
                affected: vec![actor_idx],
                label: "self".into(),
                centre: None,
            }),
            Target::Combatant(id) if roster.get_index_of(id) == Some(actor_idx) => Ok(Aim {
                affected: vec![actor_idx],
                label: "self".into(),
                centre: None,
            }),
            _ => Err(invalid("self-only action aimed elsewhere".into())),
        },
    }
}

/// Evaluate the template's formula. No formula at all deals the fixed minimum;
/// a formula with no usable term counts as zero.
fn roll_amount(
    template: &ActionTemplate,
    actor_name: &str,
    dice: &mut Dice,
    log: &mut EncounterLog,
    round: u32,
) -> i32 {
    let Some(formula) = &template.formula else {
        return MINIMUM_AMOUNT;
    };
    let roll = formula.evaluate(dice);
    if roll.malformed {
        tracing::warn!(action = %template.name, formula = %formula, "malformed formula");
        log.push(
            round,
            format!(
                "[FORMULA][{}] '{}' has no usable terms; treated as 0",
                actor_name, formula
            ),
        );
        return 0;
    }
    for term in formula.malformed_terms() {
        tracing::warn!(action = %template.name, term, "ignoring malformed formula term");
        log.push(
            round,
            format!(
                "[FORMULA][{}] ignoring '{}' in '{}'",
                actor_name, term, formula
            ),
        );
    }
    let total = roll.total.max(0);
    let tag = match template.effect {
        EffectKind::Damage => "DMG",
        EffectKind::Healing => "HEAL",
    };
    log.push(
        round,
        format!("[{}][{}] {} = {}", tag, actor_name, formula, total),
    );
    total
}

fn apply(
    roster: &mut Roster,
    log: &mut EncounterLog,
    round: u32,
    idx: usize,
    template: &ActionTemplate,
    amount: i32,
    resolution: &mut Resolution,
) {
    let Some((id, combatant)) = roster.get_index_mut(idx) else {
        return;
    };
    let name = combatant.name().to_string();
    let (vitals, conditions) = combatant.vitals_and_conditions_mut();
    let hp_before = vitals.hp;

    match template.effect {
        EffectKind::Damage => {
            if life::apply_damage(&name, vitals, conditions, amount, |msg| log.push(round, msg)) {
                resolution.defeated.push(id.clone());
            }
        }
        EffectKind::Healing => {
            life::heal(&name, vitals, amount, |msg| log.push(round, msg));
        }
    }

    if let Some(condition) = template.applies {
        if !vitals.is_defeated() && conditions.insert(condition) {
            log.push(round, format!("[COND][{}] gains {}", name, condition));
        }
    }

    resolution.outcomes.push(TargetOutcome {
        target: id.clone(),
        hit: true,
        amount,
        hp_before,
        hp_after: vitals.hp,
    });
    log.emit(EncounterEvent::CombatantUpdated {
        id: id.clone(),
        vitals: *vitals,
    });
}
