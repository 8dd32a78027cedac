use clap::Parser;
use teamfeed::cli::{self, Cli};
use teamfeed::{config, logging};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    logging::init_logging(&cfg.logging)?;
    cli::run(cli, &cfg)
}
