use clap::Parser;
use notation_dice::{reference::MemoryStore, Engine, Settings};
use rand::{rngs::StdRng, SeedableRng};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Rolls dice notation read from stdin, one notation per line.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML settings file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Seed for reproducible rolls.
    #[arg(long)]
    seed: Option<u64>,
    /// JSON document store that references roll against.
    #[arg(long, value_name = "FILE")]
    store: Option<PathBuf>,
}

fn load_settings(path: Option<&PathBuf>) -> Settings {
    let path = match path {
        Some(path) => path,
        None => return Settings::default(),
    };
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| Settings::from_toml(&s).map_err(|e| e.to_string()));
    match loaded {
        Ok(settings) => settings,
        Err(why) => {
            log::warn!("using default settings, could not load {}: {}", path.display(), why);
            Settings::default()
        }
    }
}

fn load_store(path: Option<&PathBuf>) -> MemoryStore {
    let path = match path {
        Some(path) => path,
        None => return MemoryStore::new(),
    };
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| MemoryStore::from_json(&s).map_err(|e| e.to_string()));
    match loaded {
        Ok(store) => store,
        Err(why) => {
            log::warn!("using an empty store, could not load {}: {}", path.display(), why);
            MemoryStore::new()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let args = Args::parse();

    let engine = Engine::new(load_settings(args.config.as_ref()));
    let store = load_store(args.store.as_ref());
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    print!("> ");
    io::stdout().flush()?;
    while let Some(Ok(line)) = lines.next() {
        if !line.trim().is_empty() {
            match engine.roll(&line, &store, &mut rng) {
                Ok(outcome) => println!("{}", outcome),
                Err(why) => eprintln!("Error: {}", why),
            }
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}
