// attrfind/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // RUST_LOG=debug attrfind run ... to see every iteration
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Logs go to stderr so `--format json` output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dispatch(cli.command) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            rules,
            input,
            format,
        } => commands::run::execute(&rules, &input, format),
        Commands::Compile { rules, output } => commands::compile::execute(&rules, &output),
        Commands::Inspect { blob } => commands::inspect::execute(&blob),
        Commands::List { project_dir } => commands::list::execute(&project_dir),
        Commands::Score {
            input,
            project_dir,
            format,
        } => commands::score::execute(&input, &project_dir, format),
    }
}
