//! Combatant templates, encounter rosters and assembly into live combatants.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ability_mod;
use crate::combat::actions::ActionTemplate;
use crate::combat::director::{Script, builtin_script};
use crate::combatant::{Combatant, CombatantId, DEFAULT_SPEED_FT, Faction, Position};
use crate::conditions::parse_condition_list;
use crate::encounter::AssemblyError;

pub const BUILTIN_BESTIARY: &str = include_str!("../content/bestiary.yaml");

/// Row players line up on when a roster entry gives no position.
pub const PLAYER_ROW: i32 = 18;
pub const PLAYER_FIRST_COLUMN: i32 = 8;
pub const ADVERSARY_ROW: i32 = 8;
pub const GRID_WIDTH: i32 = 20;

pub fn builtin_encounters() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            "goblin_ambush",
            include_str!("../content/encounters/goblin_ambush.yaml"),
        ),
        (
            "crypt_patrol",
            include_str!("../content/encounters/crypt_patrol.yaml"),
        ),
        (
            "larloch_projection",
            include_str!("../content/encounters/larloch_projection.yaml"),
        ),
    ])
}

/// A script given inline as rules, or by the name of a built-in one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptRef {
    Builtin(String),
    Rules(Script),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantTemplate {
    pub name: String,
    #[serde(alias = "max_hp")]
    pub hp: i32,
    #[serde(alias = "ac")]
    pub armor: i32,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default)]
    pub initiative_bonus: Option<i32>,
    /// Used for the initiative bonus when no explicit bonus is given.
    #[serde(default, alias = "dex")]
    pub dexterity: Option<i32>,
    #[serde(default)]
    pub actions: Vec<ActionTemplate>,
    #[serde(default)]
    pub script: Option<ScriptRef>,
}

fn default_speed() -> u32 {
    DEFAULT_SPEED_FT
}

impl CombatantTemplate {
    pub fn initiative_bonus(&self) -> i32 {
        self.initiative_bonus
            .or(self.dexterity.map(ability_mod))
            .unwrap_or(0)
    }

    pub fn script(&self) -> Result<Option<Script>, AssemblyError> {
        match &self.script {
            None => Ok(None),
            Some(ScriptRef::Rules(script)) => Ok(Some(script.clone())),
            Some(ScriptRef::Builtin(name)) => builtin_script(name)
                .map(Some)
                .ok_or_else(|| AssemblyError::UnknownScript(name.clone())),
        }
    }
}

/// Templates keyed by lowercase slug, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    templates: IndexMap<String, CombatantTemplate>,
}

impl Catalog {
    pub fn from_yaml(src: &str) -> Result<Self, serde_yaml::Error> {
        let raw: IndexMap<String, CombatantTemplate> = serde_yaml::from_str(src)?;
        Ok(Self::from_map(raw))
    }

    pub fn from_json(src: &str) -> Result<Self, serde_json::Error> {
        let raw: IndexMap<String, CombatantTemplate> = serde_json::from_str(src)?;
        Ok(Self::from_map(raw))
    }

    pub fn builtin() -> Result<Self, serde_yaml::Error> {
        Self::from_yaml(BUILTIN_BESTIARY)
    }

    fn from_map(raw: IndexMap<String, CombatantTemplate>) -> Self {
        Self {
            templates: raw
                .into_iter()
                .map(|(key, t)| (key.to_lowercase(), t))
                .collect(),
        }
    }

    /// Look up by slug or by display name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&CombatantTemplate> {
        let key = name.trim().to_lowercase();
        self.templates.get(&key).or_else(|| {
            self.templates
                .values()
                .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
        })
    }

    /// Add `other`'s templates, replacing any with the same slug.
    pub fn merge(&mut self, other: Catalog) {
        self.templates.extend(other.templates);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CombatantTemplate)> {
        self.templates.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Hit point multiplier for adversaries, applied once at assembly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncounterScaling {
    pub multiplier: f64,
}

impl Default for EncounterScaling {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

impl EncounterScaling {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// Curse stage: the longer the curse has run, the tougher its creatures.
    pub fn from_curse_days(days: u32) -> Self {
        let multiplier = match days {
            d if d >= 20 => 1.5,
            d if d >= 14 => 1.25,
            d if d >= 7 => 1.1,
            _ => 1.0,
        };
        Self { multiplier }
    }

    pub fn apply(&self, base_hp: i32) -> i32 {
        ((base_hp as f64 * self.multiplier).floor() as i32).max(1)
    }
}

fn one() -> u32 {
    1
}

/// One line of an encounter roster: a template, a side and how many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub template: String,
    pub faction: Faction,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub id: Option<String>,
    /// Starting hp, when the combatant arrives already hurt.
    #[serde(default)]
    pub hp: Option<i32>,
    /// Initiative already rolled at the table.
    #[serde(default)]
    pub initiative: Option<i32>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl RosterEntry {
    pub fn new(template: impl Into<String>, faction: Faction) -> Self {
        Self {
            template: template.into(),
            faction,
            count: 1,
            id: None,
            hp: None,
            initiative: None,
            position: None,
            conditions: Vec::new(),
        }
    }

    pub fn times(mut self, count: u32) -> Self {
        self.count = count;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub curse_days: Option<u32>,
    pub roster: Vec<RosterEntry>,
}

impl EncounterSpec {
    pub fn from_yaml(src: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(src)
    }

    pub fn from_json(src: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(src)
    }
}

/// "A", "B", … "Z", then "AA", "AB", …
pub fn letter_suffix(mut n: u32) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Turn a roster description into combatants ready for [`crate::Encounter::new`].
pub fn assemble(
    spec: &EncounterSpec,
    catalog: &Catalog,
    scaling: EncounterScaling,
) -> Result<Vec<Combatant>, AssemblyError> {
    let mut combatants = Vec::new();
    let mut player_slot = 0i32;
    let mut adversary_slot = 0i32;

    for entry in &spec.roster {
        let template = catalog
            .get(&entry.template)
            .ok_or_else(|| AssemblyError::UnknownTemplate(entry.template.clone()))?;
        let script = template.script()?;
        let conditions = parse_condition_list(&entry.conditions);
        let max_hp = match entry.faction {
            Faction::Adversary => scaling.apply(template.hp),
            Faction::Player => template.hp,
        };

        for n in 0..entry.count {
            let (name, id) = if entry.count > 1 {
                let suffix = letter_suffix(n);
                let name = format!("{} {}", template.name, suffix);
                let id = match &entry.id {
                    Some(id) => format!("{}_{}", id, suffix.to_lowercase()),
                    None => slug(&name),
                };
                (name, id)
            } else {
                let id = entry.id.clone().unwrap_or_else(|| slug(&template.name));
                (template.name.clone(), id)
            };

            let position = match entry.position {
                Some(p) => Position { x: p.x + n as i32, y: p.y },
                None => match entry.faction {
                    Faction::Player => Position {
                        x: PLAYER_FIRST_COLUMN + player_slot,
                        y: PLAYER_ROW,
                    },
                    Faction::Adversary => Position {
                        x: adversary_slot % GRID_WIDTH,
                        y: ADVERSARY_ROW,
                    },
                },
            };
            match entry.faction {
                Faction::Player => player_slot += 1,
                Faction::Adversary => adversary_slot += 1,
            }

            let mut combatant = Combatant::new(
                CombatantId::new(id),
                name,
                entry.faction,
                max_hp,
                template.armor,
            )
            .with_speed(template.speed)
            .with_initiative_bonus(template.initiative_bonus())
            .with_actions(template.actions.iter().cloned())
            .at(position);
            if let Some(script) = &script {
                combatant = combatant.with_script(script.clone());
            }
            if let Some(hp) = entry.hp {
                combatant = combatant.with_hp(hp);
            }
            if let Some(initiative) = entry.initiative {
                combatant = combatant.with_initiative(initiative);
            }
            for &condition in &conditions {
                combatant = combatant.with_condition(condition);
            }
            combatants.push(combatant);
        }
    }

    if combatants.is_empty() {
        return Err(AssemblyError::EmptyRoster);
    }
    Ok(combatants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{ActionShape, EffectKind};

    #[test]
    fn letter_suffixes_roll_over() {
        assert_eq!(letter_suffix(0), "A");
        assert_eq!(letter_suffix(1), "B");
        assert_eq!(letter_suffix(25), "Z");
        assert_eq!(letter_suffix(26), "AA");
        assert_eq!(letter_suffix(27), "AB");
    }

    #[test]
    fn curse_stages() {
        assert_eq!(EncounterScaling::from_curse_days(0).multiplier, 1.0);
        assert_eq!(EncounterScaling::from_curse_days(7).multiplier, 1.1);
        assert_eq!(EncounterScaling::from_curse_days(14).multiplier, 1.25);
        assert_eq!(EncounterScaling::from_curse_days(30).multiplier, 1.5);
        assert_eq!(EncounterScaling::new(1.1).apply(7), 7);
        assert_eq!(EncounterScaling::new(0.01).apply(7), 1);
    }

    #[test]
    fn builtin_bestiary_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.get("goblin").is_some());
        assert!(catalog.get("Larloch the Shadow King").is_some());
        let larloch = catalog.get("larloch").unwrap();
        assert_eq!(larloch.script().unwrap(), Some(Script::larloch()));
    }

    #[test]
    fn dumped_catalog_loads_back_unchanged() {
        let catalog = Catalog::builtin().unwrap();
        let json = serde_json::to_string(&catalog).unwrap();
        assert_eq!(Catalog::from_json(&json).unwrap(), catalog);
        let yaml = serde_yaml::to_string(&catalog).unwrap();
        assert_eq!(Catalog::from_yaml(&yaml).unwrap(), catalog);

        let larloch = catalog.get("larloch").unwrap();
        let ward = larloch.actions.iter().find(|a| a.name == "Shadow Ward").unwrap();
        assert_eq!(ward.shape, ActionShape::SelfTarget);
        assert_eq!(ward.effect, EffectKind::Healing);
    }

    #[test]
    fn builtin_encounters_parse() {
        for (name, src) in builtin_encounters() {
            let spec = EncounterSpec::from_yaml(src)
                .unwrap_or_else(|e| panic!("{} failed to parse: {}", name, e));
            assert!(!spec.roster.is_empty(), "{} has an empty roster", name);
        }
    }
}
