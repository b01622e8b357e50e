//! Adversary Director: picks one (action, target) pair for a directed turn.
//!
//! A combatant with a [`Script`] runs its rules top to bottom and takes the
//! first one whose predicates all hold; with no script, or no match, the
//! generic policy applies. The director only reads state. Its decision goes
//! through the same submission path as a player's.

use serde::{Deserialize, Serialize};

use super::actions::{ActionShape, ActionTemplate, CostClass, EffectKind, Target};
use super::{Roster, combatant_at};
use crate::Dice;
use crate::combatant::Combatant;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Own hp / max hp strictly below the fraction.
    OwnHpBelow(f64),
    /// The selected target's current hp strictly below an absolute value.
    TargetHpBelow(i32),
    /// The named action exists and its cost class is affordable.
    HasAction(String),
    /// Percentile roll. Only rolled once every other predicate holds.
    Chance(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSelector {
    #[default]
    FirstOpponent,
    WeakestOpponent,
    Myself,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleSpec", into = "RuleSpec")]
pub struct Rule {
    pub when: Vec<Predicate>,
    pub action: String,
    pub target: TargetSelector,
}

impl Rule {
    pub fn new(action: impl Into<String>, target: TargetSelector) -> Self {
        Self {
            when: Vec::new(),
            action: action.into(),
            target,
        }
    }

    pub fn when(mut self, predicate: Predicate) -> Self {
        self.when.push(predicate);
        self
    }
}

/// Rule shape in content files: named optional predicates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WhenSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    own_hp_below: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_hp_below: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    has_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleSpec {
    #[serde(default)]
    when: WhenSpec,
    action: String,
    #[serde(default)]
    target: TargetSelector,
}

impl From<RuleSpec> for Rule {
    fn from(spec: RuleSpec) -> Self {
        let WhenSpec {
            own_hp_below,
            target_hp_below,
            has_action,
            chance,
        } = spec.when;
        let when = own_hp_below
            .map(Predicate::OwnHpBelow)
            .into_iter()
            .chain(target_hp_below.map(Predicate::TargetHpBelow))
            .chain(has_action.map(Predicate::HasAction))
            .chain(chance.map(Predicate::Chance))
            .collect();
        Rule {
            when,
            action: spec.action,
            target: spec.target,
        }
    }
}

impl From<Rule> for RuleSpec {
    fn from(rule: Rule) -> Self {
        let mut when = WhenSpec::default();
        for predicate in rule.when {
            match predicate {
                Predicate::OwnHpBelow(f) => when.own_hp_below = Some(f),
                Predicate::TargetHpBelow(n) => when.target_hp_below = Some(n),
                Predicate::HasAction(name) => when.has_action = Some(name),
                Predicate::Chance(p) => when.chance = Some(p),
            }
        }
        RuleSpec {
            when,
            action: rule.action,
            target: rule.target,
        }
    }
}

/// Ordered rule list. First match wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    rules: Vec<Rule>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Larloch, the lich king: finish off a badly hurt foe, ward himself when
    /// low, sometimes open with a fireball, otherwise fire a ray.
    pub fn larloch() -> Self {
        Script::new()
            .rule(
                Rule::new("Power Word Kill", TargetSelector::WeakestOpponent)
                    .when(Predicate::TargetHpBelow(20)),
            )
            .rule(
                Rule::new("Shadow Ward", TargetSelector::Myself)
                    .when(Predicate::OwnHpBelow(0.3)),
            )
            .rule(
                Rule::new("Fireball", TargetSelector::FirstOpponent)
                    .when(Predicate::Chance(0.35)),
            )
            .rule(Rule::new("Ray of Frost", TargetSelector::FirstOpponent))
    }

    /// The action list the Larloch script expects to find.
    pub fn larloch_actions() -> Vec<ActionTemplate> {
        vec![
            ActionTemplate::single_target("Power Word Kill", CostClass::Primary, 13, "10d10", 60),
            ActionTemplate::on_self("Shadow Ward", CostClass::Secondary, "4d10+10"),
            ActionTemplate::area("Fireball", CostClass::Primary, "8d6", 150, 20),
            ActionTemplate::single_target("Ray of Frost", CostClass::Primary, 13, "4d8", 60),
        ]
    }
}

/// Built-in scripts content files can refer to by name.
pub fn builtin_script(name: &str) -> Option<Script> {
    match name.trim().to_lowercase().as_str() {
        "larloch" => Some(Script::larloch()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub action: String,
    pub target: Target,
    /// Index of the rule that fired; `None` for the generic policy.
    pub rule: Option<usize>,
}

/// Pick an action for the combatant at `actor_idx`, or `None` when it has
/// nothing usable or nobody to use it on.
pub fn decide(roster: &Roster, actor_idx: usize, dice: &mut Dice) -> Option<Decision> {
    let actor = combatant_at(roster, actor_idx)?;
    if actor.is_defeated() {
        return None;
    }

    if let Some(script) = actor.script() {
        for (i, rule) in script.rules().iter().enumerate() {
            if let Some(target) = try_rule(roster, actor_idx, actor, rule, dice) {
                tracing::debug!(actor = %actor.id(), rule = i, action = %rule.action, "script rule fired");
                return Some(Decision {
                    action: rule.action.clone(),
                    target,
                    rule: Some(i),
                });
            }
        }
        tracing::debug!(actor = %actor.id(), "no script rule matched; generic policy");
    }

    generic(roster, actor_idx, actor)
}

/// First affordable damage template against the first standing opponent.
fn generic(roster: &Roster, actor_idx: usize, actor: &Combatant) -> Option<Decision> {
    let template = actor.actions().iter().find(|t| {
        t.effect == EffectKind::Damage
            && t.cost != CostClass::Reaction
            && actor.resources().can_afford(t.cost.resource())
    })?;
    let opponent = select(roster, actor_idx, actor, TargetSelector::FirstOpponent)?;
    let decision = Decision {
        action: template.name.clone(),
        target: aim(template, actor, opponent),
        rule: None,
    };
    tracing::debug!(actor = %actor.id(), action = %decision.action, "generic policy");
    Some(decision)
}

fn try_rule(
    roster: &Roster,
    actor_idx: usize,
    actor: &Combatant,
    rule: &Rule,
    dice: &mut Dice,
) -> Option<Target> {
    let template = actor.action(&rule.action)?;
    if !actor.resources().can_afford(template.cost.resource()) {
        return None;
    }
    let chosen = select(roster, actor_idx, actor, rule.target)?;

    let holds = |p: &Predicate| match p {
        Predicate::OwnHpBelow(fraction) => actor.vitals().fraction() < *fraction,
        Predicate::TargetHpBelow(hp) => chosen.hp() < *hp,
        Predicate::HasAction(name) => actor
            .action(name)
            .is_some_and(|t| actor.resources().can_afford(t.cost.resource())),
        Predicate::Chance(_) => true,
    };
    if !rule.when.iter().all(holds) {
        return None;
    }
    for p in &rule.when {
        if let Predicate::Chance(probability) = p {
            if !dice.chance(*probability) {
                return None;
            }
        }
    }
    Some(aim(template, actor, chosen))
}

fn select<'r>(
    roster: &'r Roster,
    actor_idx: usize,
    actor: &Combatant,
    selector: TargetSelector,
) -> Option<&'r Combatant> {
    let opposing = actor.faction().opponent();
    let mut opponents = roster
        .values()
        .filter(move |c| c.faction() == opposing && !c.is_defeated());
    match selector {
        TargetSelector::FirstOpponent => opponents.next(),
        // `min_by_key` keeps the first of equal keys, so ties go to roster order.
        TargetSelector::WeakestOpponent => opponents.min_by_key(|c| c.hp()),
        TargetSelector::Myself => combatant_at(roster, actor_idx),
    }
}

fn aim(template: &ActionTemplate, actor: &Combatant, chosen: &Combatant) -> Target {
    match template.shape {
        ActionShape::SelfTarget => Target::Myself,
        _ if chosen.id() == actor.id() => Target::Myself,
        _ => Target::Combatant(chosen.id().clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_from_content_orders_chance_last() {
        let yaml = "when:\n  chance: 0.5\n  own_hp_below: 0.3\naction: Shadow Ward\ntarget: myself\n";
        let rule: Rule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            rule.when,
            vec![Predicate::OwnHpBelow(0.3), Predicate::Chance(0.5)]
        );
        assert_eq!(rule.target, TargetSelector::Myself);
    }

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        assert_eq!(builtin_script("Larloch"), Some(Script::larloch()));
        assert!(builtin_script("tarrasque").is_none());
    }
}
