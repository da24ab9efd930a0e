use anyhow::Result;
use clap::Parser;
use netrank::{CLIArguments, rank_main, stat_main};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CLIArguments::parse();

    match args {
        CLIArguments::Stat(args) => stat_main(args),
        CLIArguments::Rank(args) => rank_main(args),
    }
}
