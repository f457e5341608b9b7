//! fieldgraph CLI - infer, edit and apply document transformation engines
//!
//! Engines are exchanged as JSON (or YAML) files in the form produced by
//! `Engine::to_json`, so every command reads its engine from disk and, when
//! it changes one, writes it back.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

fn main() {
    let cli = Cli::parse_args();

    let result = Config::load_with_file(cli.config.as_deref()).and_then(|config| {
        control::set_override(cli.use_color() && config.output.color);
        if let Err(e) = init_logging(&cli, &config) {
            eprintln!("Failed to initialize logging: {}", e);
        }
        run(cli, config)
    });

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let format = cli.output.unwrap_or(config.output.format);
    let mut output = OutputWriter::new(format, control::SHOULD_COLORIZE.should_colorize(), cli.quiet);

    tracing::info!(verbosity = cli.verbosity_level(), format = ?format, "Executing command");

    match cli.command {
        Commands::Infer(args) => handlers::handle_infer(args, &config, &mut output),
        Commands::Transform(args) => handlers::handle_transform(args, &config, &mut output),
        Commands::Fields(args) => handlers::handle_fields(args, &config, &mut output),
        Commands::Rename(args) => handlers::handle_rename(args, &config, &mut output),
        Commands::Join(args) => handlers::handle_join(args, &config, &mut output),
        Commands::Verify(args) => handlers::handle_verify(args, &config, &mut output),
    }
}

/// Logging settings from `-v`, the config file and the environment, in that order
fn logging_config(cli: &Cli, config: &Config) -> LoggingConfig {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.apply_file_config(&config.logging);
    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
    }
    if cli.no_color {
        logging_config.ansi = false;
    }
    logging_config
}

fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    logging::init_logging(logging_config(cli, config))
}
