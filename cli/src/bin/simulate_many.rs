use clap::Parser;
use encoding_rs::Encoding;
use engine::api::{self, EncounterConfig};
use std::{fs, path::PathBuf};

#[derive(Parser)]
#[command(name = "simulate-many")]
#[command(about = "Monte Carlo sim: many autopilot runs of one encounter")]
struct Args {
    /// Built-in encounter id [default: goblin_ambush]
    #[arg(long)]
    encounter: Option<String>,

    /// Encounter file (YAML or JSON); overrides --encounter
    #[arg(long)]
    file: Option<PathBuf>,

    /// Simulation config (JSON); flags given on the command line win
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of trials
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// Safety cap on rounds per trial
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Days the curse has run (scales adversary hp)
    #[arg(long)]
    curse_days: Option<u32>,

    /// RNG base seed (trial i uses seed+i) [default: 12345]
    #[arg(long)]
    seed: Option<u64>,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn read_text_auto(path: &std::path::Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => {
            let text = read_text_auto(path)?;
            serde_json::from_str::<EncounterConfig>(&text)?
        }
        None => EncounterConfig {
            seed: 12345,
            ..EncounterConfig::default()
        },
    };
    if let Some(id) = args.encounter {
        cfg.encounter = Some(id);
    }
    if let Some(path) = &args.file {
        cfg.encounter_path = Some(path.to_string_lossy().into_owned());
    }
    if cfg.encounter.is_none() && cfg.encounter_path.is_none() {
        cfg.encounter = Some("goblin_ambush".to_string());
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(rounds) = args.max_rounds {
        cfg.max_rounds = rounds;
    }
    if args.curse_days.is_some() {
        cfg.curse_days = args.curse_days;
    }

    let stats = api::simulate_encounter_many(cfg.clone(), args.trials)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let name = cfg
        .encounter_path
        .clone()
        .or(cfg.encounter.clone())
        .unwrap_or_default();
    println!("simulate-many results");
    println!("---------------------");
    println!("encounter:          {}", name);
    println!("trials:             {}", stats.trials);
    println!("base seed:          {}", cfg.seed);
    println!();
    println!("victory rate:       {:.1}%", stats.victory_rate * 100.0);
    println!("victories:          {}", stats.victories);
    println!("defeats:            {}", stats.defeats);
    println!("unresolved:         {}", stats.unresolved);
    println!("avg rounds:         {:.2}", stats.avg_rounds);
    println!("median rounds:      {}", stats.median_rounds);

    Ok(())
}
