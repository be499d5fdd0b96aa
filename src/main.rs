use clap::Parser;
use std::io;
use std::sync::Arc;

use finwiz::cli::{self, Cli, CliError, Command};
use finwiz::core::QuizEngine;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    finwiz::logging::init_logging(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let catalog = cli::load_catalog(&cli)?;
    match cli.command {
        Command::Serve(args) => finwiz::api::run_http_server(args.addr(), catalog).await?,
        Command::Health(args) => cli::run_health(&args, &mut io::stdout().lock())?,
        Command::Quiz => {
            let mut engine = QuizEngine::new(Arc::new(catalog.quiz));
            cli::run_quiz(&mut engine, io::stdin().lock(), &mut io::stdout().lock())?;
        }
        Command::Directory(args) => {
            cli::run_directory(&catalog, args.all, &mut io::stdout().lock())?
        }
    }
    Ok(())
}
