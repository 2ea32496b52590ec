mod cli;
mod commands;
mod config;
mod error;
mod output;
mod server;

use crate::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    config::AppConfig,
    error::Result,
};
use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use std::process;
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        error!("Application error: {}", e);
        #[cfg(feature = "colored-output")]
        {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        #[cfg(not(feature = "colored-output"))]
        {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(timeout) = args.timeout {
        config.extraction_timeout = timeout;
    }
    if let Some(retries) = args.retries {
        config.retries = retries;
    }

    debug!("Loaded configuration: {:?}", config);

    let executor = if args.proxy.is_some() {
        CommandExecutor::new_with_proxy(
            config,
            args.proxy,
            args.proxy_username,
            args.proxy_password,
        )
    } else {
        CommandExecutor::new(config)
    };

    match args.command {
        Commands::Resolve {
            url,
            kind,
            direct,
            force_extract,
            output,
            output_file,
        } => {
            executor
                .resolve(
                    &url,
                    &kind,
                    direct,
                    force_extract,
                    output,
                    output_file.as_deref(),
                )
                .await?;
        }

        Commands::Channels {
            country,
            search,
            output,
        } => {
            executor
                .channels(country.as_deref(), search.as_deref(), output)
                .await?;
        }

        Commands::Match { name } => {
            executor.match_country(&name).await?;
        }

        Commands::Metadata { url, output_file } => {
            executor.metadata(&url, output_file.as_deref()).await?;
        }

        Commands::Serve { host, port } => {
            executor.serve(host.as_deref(), port).await?;
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Args::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }

        Commands::Config { show, reset } => {
            if reset {
                AppConfig::reset(args.config.as_deref())?;
                println!("✓ Configuration reset to defaults");
            } else if show {
                let config = AppConfig::load(args.config.as_deref())?;
                println!("{}", config.show()?);
            } else {
                println!(
                    "Use --show to display current configuration or --reset to reset to defaults"
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .with(filter)
        .init();
}
