use clap::Parser;
use contract_router::cli::{run_cli, Cli};
use contract_router::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env())?;
    run_cli(cli)
}
