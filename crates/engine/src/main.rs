use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tripwire_engine::cli::{self, Args, Command};
use tripwire_engine::config::{self, EngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let command = match cli::parse_from(std::env::args().skip(1)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}\n\n{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    match command {
        Command::Version => {
            println!("tripwire {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Help => {
            println!("{}", cli::USAGE);
            Ok(())
        }
        Command::CheckConfig(args) => {
            let config = resolve_config(args)?;
            let rules = tripwire_engine::alert::load_rules(Path::new(&config.rules_path))
                .with_context(|| format!("loading rules from {}", config.rules_path))?;
            println!("ok: {} rules in {}", rules.len(), config.rules_path);
            Ok(())
        }
        Command::Run(args) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .json()
                .init();

            let config = resolve_config(args)?;
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "tripwire starting");
            tripwire_engine::run::run(config).await
        }
    }
}

fn resolve_config(args: Args) -> anyhow::Result<EngineConfig> {
    let path = args
        .config_path
        .or_else(|| std::env::var("TRIPWIRE_CONFIG").ok().map(PathBuf::from));

    let mut cfg = match path {
        Some(p) => config::load_from_file(&p)
            .with_context(|| format!("loading config from {}", p.display()))?,
        None => EngineConfig::default(),
    };
    config::apply_env_overrides(&mut cfg, |k| std::env::var(k).ok())
        .context("applying environment overrides")?;
    Ok(cfg)
}
