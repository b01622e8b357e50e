use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::content::{self, Catalog, EncounterScaling, EncounterSpec};
use crate::encounter::{CombatantSnapshot, Encounter, Outcome};
use crate::Dice;

pub const DEFAULT_MAX_ROUNDS: u32 = 50;

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

/// What to simulate and how. Either `encounter` (a built-in id) or
/// `encounter_path` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EncounterConfig {
    #[serde(default)]
    pub encounter: Option<String>,
    #[serde(default)]
    pub encounter_path: Option<String>,
    /// Extra templates layered over the built-in bestiary.
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub curse_days: Option<u32>,
    /// Explicit multiplier; wins over any curse stage.
    #[serde(default)]
    pub scaling: Option<f64>,
    /// Harness cap. The engine itself never times out.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            encounter: None,
            encounter_path: None,
            catalog_path: None,
            seed: 0,
            curse_days: None,
            scaling: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl EncounterConfig {
    pub fn builtin(encounter: impl Into<String>, seed: u64) -> Self {
        Self {
            encounter: Some(encounter.into()),
            seed,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EncounterResult {
    pub encounter: String,
    /// `None` when the round cap was hit first.
    pub outcome: Option<Outcome>,
    pub rounds: u32,
    pub combatants: Vec<CombatantSnapshot>,
    pub log: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EncounterStats {
    pub trials: u32,
    pub victories: u32,
    pub defeats: u32,
    pub unresolved: u32,
    pub victory_rate: f64,
    pub avg_rounds: f64,
    pub median_rounds: u32,
}

fn read_text(path: &str, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}: {}", what, path))
}

fn is_json(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// The built-in bestiary, plus the templates in `path` if given.
pub fn load_catalog(path: Option<&str>) -> Result<Catalog> {
    let mut catalog = Catalog::builtin().context("built-in bestiary is invalid")?;
    if let Some(path) = path {
        let text = read_text(path, "catalog")?;
        let extra = if is_json(path) {
            Catalog::from_json(&text)
                .with_context(|| format!("failed to parse catalog JSON: {}", path))?
        } else {
            Catalog::from_yaml(&text)
                .with_context(|| format!("failed to parse catalog YAML: {}", path))?
        };
        tracing::debug!(path, templates = extra.len(), "catalog loaded");
        catalog.merge(extra);
    }
    Ok(catalog)
}

pub fn load_encounter_spec(cfg: &EncounterConfig) -> Result<EncounterSpec> {
    if let Some(path) = &cfg.encounter_path {
        let text = read_text(path, "encounter")?;
        return if is_json(path) {
            EncounterSpec::from_json(&text)
                .with_context(|| format!("failed to parse encounter JSON: {}", path))
        } else {
            EncounterSpec::from_yaml(&text)
                .with_context(|| format!("failed to parse encounter YAML: {}", path))
        };
    }
    let Some(id) = &cfg.encounter else {
        bail!("no encounter given: set `encounter` or `encounter_path`");
    };
    let builtins = content::builtin_encounters();
    let src = builtins
        .get(id.as_str())
        .ok_or_else(|| anyhow::anyhow!("encounter '{}' not found", id))?;
    EncounterSpec::from_yaml(src).with_context(|| format!("built-in encounter '{}' is invalid", id))
}

pub fn scaling_for(cfg: &EncounterConfig, spec: &EncounterSpec) -> EncounterScaling {
    if let Some(m) = cfg.scaling {
        return EncounterScaling::new(m);
    }
    cfg.curse_days
        .or(spec.curse_days)
        .map(EncounterScaling::from_curse_days)
        .unwrap_or_default()
}

/// Assemble the encounter without starting it.
pub fn prepare(spec: &EncounterSpec, catalog: &Catalog, cfg: &EncounterConfig) -> Result<Encounter> {
    let scaling = scaling_for(cfg, spec);
    let combatants = content::assemble(spec, catalog, scaling)
        .with_context(|| format!("failed to assemble encounter '{}'", spec.name))?;
    let encounter = Encounter::new(combatants, Dice::from_seed(cfg.seed))
        .with_context(|| format!("invalid roster for encounter '{}'", spec.name))?;
    Ok(encounter)
}

/// Run every turn through the director until the encounter resolves or the
/// round cap is reached.
pub fn autopilot(encounter: &mut Encounter, max_rounds: u32) -> Result<Option<Outcome>> {
    encounter.start()?;
    while !encounter.is_resolved() && encounter.round() <= max_rounds {
        encounter.play_directed_turn()?;
    }
    if !encounter.is_resolved() {
        tracing::info!(max_rounds, "round cap reached without a result");
    }
    Ok(encounter.outcome())
}

pub fn simulate_spec(
    spec: &EncounterSpec,
    catalog: &Catalog,
    cfg: &EncounterConfig,
) -> Result<EncounterResult> {
    let mut encounter = prepare(spec, catalog, cfg)?;
    let outcome = autopilot(&mut encounter, cfg.max_rounds)?;
    let snapshot = encounter.snapshot();
    Ok(EncounterResult {
        encounter: spec.name.clone(),
        outcome,
        rounds: snapshot.round,
        combatants: snapshot.combatants,
        log: encounter.log().lines().map(str::to_string).collect(),
    })
}

pub fn simulate_encounter(cfg: EncounterConfig) -> Result<EncounterResult> {
    let catalog = load_catalog(cfg.catalog_path.as_deref())?;
    let spec = load_encounter_spec(&cfg)?;
    simulate_spec(&spec, &catalog, &cfg)
}

/// Monte-Carlo run: trial `i` uses seed `cfg.seed + i`.
pub fn simulate_encounter_many(cfg: EncounterConfig, trials: u32) -> Result<EncounterStats> {
    if trials == 0 {
        bail!("trials must be at least 1");
    }
    let catalog = load_catalog(cfg.catalog_path.as_deref())?;
    let spec = load_encounter_spec(&cfg)?;

    let mut stats = EncounterStats {
        trials,
        ..EncounterStats::default()
    };
    let mut rounds: Vec<u32> = Vec::with_capacity(trials as usize);
    for i in 0..trials {
        let trial = EncounterConfig {
            seed: cfg.seed.wrapping_add(i as u64),
            ..cfg.clone()
        };
        let result = simulate_spec(&spec, &catalog, &trial)?;
        match result.outcome {
            Some(Outcome::Victory) => stats.victories += 1,
            Some(Outcome::Defeat) => stats.defeats += 1,
            Some(Outcome::Flee) | None => stats.unresolved += 1,
        }
        rounds.push(result.rounds);
    }

    rounds.sort_unstable();
    stats.victory_rate = stats.victories as f64 / trials as f64;
    stats.avg_rounds = rounds.iter().map(|&r| r as f64).sum::<f64>() / trials as f64;
    let m = rounds.len() / 2;
    stats.median_rounds = if rounds.len() % 2 == 1 {
        rounds[m]
    } else {
        (rounds[m - 1] + rounds[m]) / 2
    };
    Ok(stats)
}
