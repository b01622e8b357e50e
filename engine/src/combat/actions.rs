use serde::{Deserialize, Serialize};

use crate::combatant::{CombatantId, Position};
use crate::conditions::Condition;
use crate::formula::Formula;
use crate::ledger::ResourceKind;

/// Reach of an action with no declared range.
pub const MELEE_RANGE_FT: u32 = 5;
/// Amount dealt by an action that declares no formula at all.
pub const MINIMUM_AMOUNT: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostClass {
    #[default]
    Primary,
    Secondary,
    Reaction,
}

impl CostClass {
    pub fn resource(self) -> ResourceKind {
        match self {
            CostClass::Primary => ResourceKind::PrimaryAction,
            CostClass::Secondary => ResourceKind::SecondaryAction,
            CostClass::Reaction => ResourceKind::Reaction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    #[default]
    Damage,
    Healing,
}

/// How an action picks what it affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ActionShape {
    SingleTarget { range_ft: u32 },
    Area { range_ft: u32, radius_ft: u32 },
    #[serde(rename = "self")]
    SelfTarget,
}

/// Immutable definition of something a combatant can do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ActionSpec", into = "ActionSpec")]
pub struct ActionTemplate {
    pub name: String,
    pub cost: CostClass,
    pub to_hit: i32,
    pub formula: Option<Formula>,
    pub effect: EffectKind,
    pub shape: ActionShape,
    pub applies: Option<Condition>,
}

impl ActionTemplate {
    pub fn single_target(
        name: impl Into<String>,
        cost: CostClass,
        to_hit: i32,
        formula: &str,
        range_ft: u32,
    ) -> Self {
        Self {
            name: name.into(),
            cost,
            to_hit,
            formula: Some(Formula::parse(formula)),
            effect: EffectKind::Damage,
            shape: ActionShape::SingleTarget { range_ft },
            applies: None,
        }
    }

    pub fn area(
        name: impl Into<String>,
        cost: CostClass,
        formula: &str,
        range_ft: u32,
        radius_ft: u32,
    ) -> Self {
        Self {
            name: name.into(),
            cost,
            to_hit: 0,
            formula: Some(Formula::parse(formula)),
            effect: EffectKind::Damage,
            shape: ActionShape::Area {
                range_ft,
                radius_ft,
            },
            applies: None,
        }
    }

    pub fn on_self(name: impl Into<String>, cost: CostClass, formula: &str) -> Self {
        Self {
            name: name.into(),
            cost,
            to_hit: 0,
            formula: Some(Formula::parse(formula)),
            effect: EffectKind::Healing,
            shape: ActionShape::SelfTarget,
            applies: None,
        }
    }

    pub fn healing(mut self) -> Self {
        self.effect = EffectKind::Healing;
        self
    }

    pub fn applying(mut self, condition: Condition) -> Self {
        self.applies = Some(condition);
        self
    }

    pub fn without_formula(mut self) -> Self {
        self.formula = None;
        self
    }

    pub fn is_area(&self) -> bool {
        matches!(self.shape, ActionShape::Area { .. })
    }
}

/// What an action is aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Combatant(CombatantId),
    Point(Position),
    Myself,
}

impl Target {
    pub fn combatant(id: impl Into<CombatantId>) -> Self {
        Target::Combatant(id.into())
    }
}

/// Range as catalog content writes it: a number of feet or free text
/// such as `"self"`, `"touch"` or `"120 ft"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeSpec {
    Feet(u32),
    Text(String),
}

enum DeclaredRange {
    OnSelf,
    Feet(u32),
}

impl RangeSpec {
    fn declared(&self) -> DeclaredRange {
        match self {
            RangeSpec::Feet(ft) => DeclaredRange::Feet(*ft),
            RangeSpec::Text(text) => {
                let text = text.trim().to_lowercase();
                if text.starts_with("self") {
                    return DeclaredRange::OnSelf;
                }
                let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
                DeclaredRange::Feet(digits.parse().unwrap_or(MELEE_RANGE_FT))
            }
        }
    }
}

/// Loose action declaration from catalog content. Templates serialize back
/// into this shape, so a dumped catalog loads again unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    pub name: String,
    #[serde(default)]
    pub cost: CostClass,
    #[serde(default, alias = "bonus")]
    pub to_hit: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heal: Option<String>,
    /// Only needed for a healing action with no formula.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<EffectKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies: Option<Condition>,
}

impl From<ActionSpec> for ActionTemplate {
    fn from(spec: ActionSpec) -> Self {
        let declared = spec.range.as_ref().map(RangeSpec::declared);
        let shape = match (spec.radius, declared) {
            (Some(radius_ft), Some(DeclaredRange::OnSelf)) => ActionShape::Area {
                range_ft: 0,
                radius_ft,
            },
            (Some(radius_ft), Some(DeclaredRange::Feet(range_ft))) => ActionShape::Area {
                range_ft,
                radius_ft,
            },
            (Some(radius_ft), None) => ActionShape::Area {
                range_ft: MELEE_RANGE_FT,
                radius_ft,
            },
            (None, Some(DeclaredRange::OnSelf)) => ActionShape::SelfTarget,
            (None, Some(DeclaredRange::Feet(range_ft))) => ActionShape::SingleTarget { range_ft },
            (None, None) => ActionShape::SingleTarget {
                range_ft: MELEE_RANGE_FT,
            },
        };
        let (effect, formula) = match (spec.heal, spec.damage) {
            (Some(heal), _) => (EffectKind::Healing, Some(heal)),
            (None, damage) => (spec.effect.unwrap_or_default(), damage),
        };
        ActionTemplate {
            name: spec.name,
            cost: spec.cost,
            to_hit: spec.to_hit,
            formula: formula.map(Formula::from),
            effect,
            shape,
            applies: spec.applies,
        }
    }
}

impl From<ActionTemplate> for ActionSpec {
    fn from(template: ActionTemplate) -> Self {
        let (range, radius) = match template.shape {
            ActionShape::SingleTarget { range_ft } => (RangeSpec::Feet(range_ft), None),
            ActionShape::Area {
                range_ft,
                radius_ft,
            } => (RangeSpec::Feet(range_ft), Some(radius_ft)),
            ActionShape::SelfTarget => (RangeSpec::Text("self".to_string()), None),
        };
        let source = template.formula.map(String::from);
        let (damage, heal, effect) = match (template.effect, source) {
            (EffectKind::Damage, damage) => (damage, None, None),
            (EffectKind::Healing, Some(heal)) => (None, Some(heal), None),
            (EffectKind::Healing, None) => (None, None, Some(EffectKind::Healing)),
        };
        ActionSpec {
            name: template.name,
            cost: template.cost,
            to_hit: template.to_hit,
            damage,
            heal,
            effect,
            range: Some(range),
            radius,
            applies: template.applies,
        }
    }
}
