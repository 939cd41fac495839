use clap::Parser;
use prompt_enhancer::cli::commands::{cmd_enhance, cmd_serve, cmd_simulate, cmd_test};
use prompt_enhancer::cli::config::{
    API_KEY_ENV, Cli, Commands, build_gateway_config, load_config, resolve_trace_path,
};
use prompt_enhancer::page::simulation::SimulationOptions;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // stderr keeps stdout free for `serve` replies
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());

    // Resolve gateway settings: CLI > config > env > defaults
    let gateway_config = build_gateway_config(
        &config,
        cli.provider.as_deref(),
        cli.api_key.as_deref(),
        std::env::var(API_KEY_ENV).ok(),
    )?;
    let trace_path = resolve_trace_path(cli.trace.as_deref(), &config);

    match cli.command {
        Commands::Enhance { text } => {
            cmd_enhance(&text, &gateway_config, cli.verbose)?;
        }
        Commands::Test => {
            cmd_test(&gateway_config)?;
        }
        Commands::Serve => {
            cmd_serve(&gateway_config)?;
        }
        Commands::Simulate {
            page,
            scroll,
            click,
        } => {
            cmd_simulate(
                &page,
                SimulationOptions { scroll, click },
                &gateway_config,
                trace_path.as_deref(),
            )?;
        }
    }

    Ok(())
}
