use clap::Parser;

mod cli;
mod run;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    run::run(args)
}
