use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::actions::ActionTemplate;
use crate::combat::director::Script;
use crate::conditions::{Condition, ConditionSet};
use crate::ledger::ResourceLedger;
use crate::life::Vitals;

/// Grid squares are 5 ft on a side.
pub const FEET_PER_SQUARE: u32 = 5;
pub const DEFAULT_SPEED_FT: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantId(String);

impl CombatantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CombatantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CombatantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Player,
    Adversary,
}

impl Faction {
    pub fn opponent(self) -> Faction {
        match self {
            Faction::Player => Faction::Adversary,
            Faction::Adversary => Faction::Player,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Faction::Player => "player",
            Faction::Adversary => "adversary",
        })
    }
}

/// Advisory grid position. Nothing in the engine enforces collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Grid distance in feet (diagonals count as one square).
    pub fn distance_ft(self, other: Position) -> u32 {
        let squares = (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs());
        squares * FEET_PER_SQUARE
    }

    /// Circular area test: Euclidean distance from `centre` at most `radius_ft`.
    pub fn within_radius(self, centre: Position, radius_ft: u32) -> bool {
        let step = FEET_PER_SQUARE as i64;
        let dx = (self.x - centre.x) as i64 * step;
        let dy = (self.y - centre.y) as i64 * step;
        let r = radius_ft as i64;
        dx * dx + dy * dy <= r * r
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A participant in one encounter.
#[derive(Debug, Clone)]
pub struct Combatant {
    id: CombatantId,
    name: String,
    faction: Faction,
    vitals: Vitals,
    initiative_bonus: i32,
    fixed_initiative: Option<i32>,
    initiative: i32,
    conditions: ConditionSet,
    resources: ResourceLedger,
    actions: Vec<ActionTemplate>,
    script: Option<Script>,
    position: Position,
}

impl Combatant {
    pub fn new(
        id: impl Into<CombatantId>,
        name: impl Into<String>,
        faction: Faction,
        max_hp: i32,
        armor: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            faction,
            vitals: Vitals::new(max_hp, armor),
            initiative_bonus: 0,
            fixed_initiative: None,
            initiative: 0,
            conditions: ConditionSet::new(),
            resources: ResourceLedger::new(DEFAULT_SPEED_FT),
            actions: Vec::new(),
            script: None,
            position: Position::default(),
        }
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.vitals = self.vitals.with_current(hp);
        self
    }

    pub fn with_speed(mut self, speed_ft: u32) -> Self {
        self.resources = ResourceLedger::new(speed_ft);
        self
    }

    pub fn with_initiative_bonus(mut self, bonus: i32) -> Self {
        self.initiative_bonus = bonus;
        self
    }

    /// Use a pre-rolled initiative (e.g. rolled at the table) instead of rolling at assembly.
    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.fixed_initiative = Some(initiative);
        self.initiative = initiative;
        self
    }

    pub fn with_action(mut self, action: ActionTemplate) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_actions(mut self, actions: impl IntoIterator<Item = ActionTemplate>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.insert(condition);
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn id(&self) -> &CombatantId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn hp(&self) -> i32 {
        self.vitals.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.vitals.max_hp
    }

    pub fn armor(&self) -> i32 {
        self.vitals.armor
    }

    pub fn is_defeated(&self) -> bool {
        self.vitals.is_defeated()
    }

    pub fn initiative(&self) -> i32 {
        self.initiative
    }

    pub fn initiative_bonus(&self) -> i32 {
        self.initiative_bonus
    }

    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub fn resources(&self) -> &ResourceLedger {
        &self.resources
    }

    pub fn speed(&self) -> u32 {
        self.resources.speed()
    }

    pub fn actions(&self) -> &[ActionTemplate] {
        &self.actions
    }

    /// Look up a capability by name, ignoring ASCII case.
    pub fn action(&self, name: &str) -> Option<&ActionTemplate> {
        self.actions
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn script(&self) -> Option<&Script> {
        self.script.as_ref()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn fixed_initiative(&self) -> Option<i32> {
        self.fixed_initiative
    }

    pub(crate) fn set_initiative(&mut self, initiative: i32) {
        self.initiative = initiative;
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn resources_mut(&mut self) -> &mut ResourceLedger {
        &mut self.resources
    }

    /// Split borrow for the resolver's damage and condition updates.
    pub(crate) fn vitals_and_conditions_mut(&mut self) -> (&mut Vitals, &mut ConditionSet) {
        (&mut self.vitals, &mut self.conditions)
    }
}
