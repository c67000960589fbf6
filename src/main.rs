//! Skipjacker CLI
//!
//! Command-line interface for the Skipjacker pattern renderer.

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use skipjacker::cli::commands::{self, NewRulesArgs};
use skipjacker::cli::{Cli, Commands};
use skipjacker::Result;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Skipjacker v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Skipjacker v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{} ({})", e, e.error_code());
        if let Some(suggestion) = e.recovery_suggestion() {
            eprintln!("{}", suggestion);
        }
        std::process::exit(1);
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Export {
            input,
            rules,
            output,
            sample_rate,
            render,
        } => commands::export(&input, &rules, &output, sample_rate, &render).map(|_| ()),
        Commands::Info { path } => commands::info(&path),
        Commands::Rules { path } => commands::list_rules(&path),
        Commands::NewRules {
            output,
            samples,
            pattern,
            length_secs,
            count,
            factor,
            volume,
            sample_rate,
        } => commands::new_rules(
            &output,
            &NewRulesArgs {
                samples: &samples,
                pattern: &pattern,
                length_secs,
                count,
                factor,
                volume,
                sample_rate,
            },
        ),
        Commands::Preview {
            input,
            rules,
            from,
            to,
            output,
            render,
        } => commands::preview(&input, &rules, from, to, &output, &render).map(|_| ()),
        Commands::Play {
            input,
            rules,
            player,
            render,
        } => commands::play(&input, &rules, &player, &render),
    }
}
