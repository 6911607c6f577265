use clap::Parser;
use variant_engine::cli::{self, Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_ref();

    match cli.command {
        Command::Assign(args) => cli::assign::run(config, args),
        Command::Show => cli::show::run(config),
        Command::Track(args) => cli::track::run(config, args),
        Command::Reset => cli::reset::run(config),
    }
}
