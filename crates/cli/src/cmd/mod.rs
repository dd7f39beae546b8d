mod alerts;
mod health;
pub(crate) mod helpers;
mod reload;
pub(crate) mod rules;
mod version;

use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    #[command(subcommand)]
    Rules(rules::RulesCmd),
    Alerts(alerts::AlertsArgs),
    Reload,
    Health(health::HealthArgs),
    Version,
}

pub async fn run(opts: crate::Opts) -> Result<()> {
    let mode = opts.output_mode();
    match opts.cmd {
        Commands::Rules(cmd) => rules::execute(cmd, mode, opts.server, opts.config).await,
        Commands::Alerts(args) => alerts::execute(args, mode, opts.server, opts.config).await,
        Commands::Reload => reload::execute(mode, opts.server, opts.config).await,
        Commands::Health(args) => health::execute(args, mode, opts.server, opts.config).await,
        Commands::Version => {
            version::execute(mode);
            Ok(())
        }
    }
}
