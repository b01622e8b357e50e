use clap::{Parser, Subcommand};
use engine::api::{self, EncounterConfig, DEFAULT_MAX_ROUNDS};
use engine::formula::Formula;
use engine::{ActionShape, Dice, EffectKind};
use std::path::PathBuf;

#[derive(Subcommand)]
enum Cmd {
    /// Roll a damage/healing formula such as "2d6+3"
    Roll {
        /// Formula to evaluate
        #[arg(long)]
        formula: String,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of rolls
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Run one encounter on autopilot and print its log
    Run {
        /// Built-in encounter id (see `encounters`)
        #[arg(long, default_value = "goblin_ambush")]
        encounter: String,
        /// Encounter file (YAML or JSON); overrides --encounter
        #[arg(long)]
        file: Option<PathBuf>,
        /// Extra bestiary file layered over the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 7)]
        seed: u64,
        /// Days the curse has run (scales adversary hp)
        #[arg(long)]
        curse_days: Option<u32>,
        /// Stop after this many rounds
        #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
        max_rounds: u32,
        /// Print the full result as JSON instead of the log
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List combatant templates
    Bestiary {
        /// Extra bestiary file layered over the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List built-in encounters
    Encounters,
}

#[derive(Parser)]
#[command(name = "encounter-cli")]
#[command(about = "Tactical encounter engine harness")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

fn path_string(p: Option<PathBuf>) -> Option<String> {
    p.map(|p| p.to_string_lossy().into_owned())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Roll {
            formula,
            seed,
            times,
        } => {
            let parsed = Formula::parse(&formula);
            if parsed.is_malformed() {
                anyhow::bail!("no usable terms in formula '{}'", formula);
            }
            let (lo, hi) = parsed.bounds();
            let mut dice = Dice::from_seed(seed);
            for _ in 0..times {
                let roll = parsed.evaluate(&mut dice);
                println!("{} {:?} = {}", parsed, roll.faces, roll.total);
            }
            println!("range {}..={}", lo, hi);
        }
        Cmd::Run {
            encounter,
            file,
            catalog,
            seed,
            curse_days,
            max_rounds,
            json,
        } => {
            let cfg = EncounterConfig {
                encounter: Some(encounter),
                encounter_path: path_string(file),
                catalog_path: path_string(catalog),
                seed,
                curse_days,
                scaling: None,
                max_rounds,
            };
            let res = api::simulate_encounter(cfg)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&res)?);
            } else {
                for line in &res.log {
                    println!("{}", line);
                }
                match res.outcome {
                    Some(outcome) => println!("=> {} after {} round(s)", outcome, res.rounds),
                    None => println!("=> unresolved after {} round(s)", max_rounds),
                }
            }
        }
        Cmd::Bestiary { catalog, json } => {
            let catalog = api::load_catalog(path_string(catalog).as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
                return Ok(());
            }
            for (slug, t) in catalog.iter() {
                println!(
                    "{:<10} {} (HP {}, AC {}, speed {} ft, init {:+})",
                    slug,
                    t.name,
                    t.hp,
                    t.armor,
                    t.speed,
                    t.initiative_bonus()
                );
                for a in &t.actions {
                    let shape = match a.shape {
                        ActionShape::SingleTarget { range_ft } => format!("{} ft", range_ft),
                        ActionShape::Area {
                            range_ft,
                            radius_ft,
                        } => format!("{} ft, {} ft radius", range_ft, radius_ft),
                        ActionShape::SelfTarget => "self".to_string(),
                    };
                    let effect = match a.effect {
                        EffectKind::Damage => "damage",
                        EffectKind::Healing => "heal",
                    };
                    let formula = a
                        .formula
                        .as_ref()
                        .map_or_else(|| "-".to_string(), |f| f.to_string());
                    println!(
                        "    {} [{:?}] {} {} ({})",
                        a.name, a.cost, effect, formula, shape
                    );
                }
            }
        }
        Cmd::Encounters => {
            let builtins = engine::content::builtin_encounters();
            let mut ids: Vec<_> = builtins.keys().copied().collect();
            ids.sort_unstable();
            for id in ids {
                println!("{}", id);
            }
        }
    }
    Ok(())
}
