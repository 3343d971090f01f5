//! nbgen - generate configuration from a NetBox inventory
//!
//! This is the main entry point for the nbgen CLI.

mod cli;

use anyhow::{Context, Result};
use cli::output::OutputFormatter;
use cli::Cli;
use nbgen::config::Config;
use nbgen::generate::Generator;
use nbgen::inventory::Inventory;
use nbgen::netbox::NetboxClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = Cli::parse_args();
    init_logging(cli.verbosity());

    let output = OutputFormatter::new(!cli.no_color);

    if let Err(err) = run(&cli, &output) {
        output.error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(cli: &Cli, output: &OutputFormatter) -> Result<()> {
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    cli.apply_to(&mut config);

    if !config.netbox.tls {
        output.warning("disabling TLS!");
    }

    let client = NetboxClient::new(&config.netbox).context("Failed to create API client")?;
    let inventory = Inventory::new(client, config.policy.clone());
    let generator = Generator::new(inventory, config, &cli.out)?;

    let written = generator
        .generate(cli.generate)
        .with_context(|| format!("{} generation failed", cli.generate))?;

    for path in &written {
        output.wrote(path);
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(verbosity >= 3))
        .with(env_filter)
        .init();
}
