//! agentic-rag - Main CLI Entry Point

use agentic_rag::{
    bootstrap::{Bootstrap, BootstrapStatus, EXIT_CODE_SETUP_NEEDED},
    cli::{output, Args, Commands},
    config::Config,
    logging,
    types::QueryResponse,
};
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_to(&mut config);
    config.validate()?;

    logging::init(args.verbosity(), &config.logging)?;
    tracing::debug!(verbosity = args.verbosity().as_str(), "configuration loaded");

    match &args.command {
        Commands::Config => show_config(&config)?,
        Commands::Ask { question } => {
            let bootstrap = ready(config).await?;
            let graph = bootstrap.graph()?;

            let pb = output::spinner("Thinking...", args.verbosity());
            let result = graph.ask(question).await;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            print_response(&args, &result?)?;
        }
        Commands::Query { question } => {
            let bootstrap = ready(config).await?;
            let service = bootstrap.service()?;

            let pb = output::spinner("Retrieving and answering...", args.verbosity());
            let result = service.query(question).await;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            print_response(&args, &result?)?;
        }
        Commands::Documents { question, top_k } => {
            let bootstrap = ready(config).await?;
            let service = bootstrap.service()?;

            let pb = output::spinner("Retrieving...", args.verbosity());
            let result = service.documents(question, *top_k).await;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            print_response(&args, &QueryResponse::sources_only(result?))?;
        }
    }

    Ok(())
}

/// Build adapters and exit with setup instructions if Ollama is not ready
async fn ready(config: Config) -> Result<Bootstrap> {
    let bootstrap = Bootstrap::new(config)?;

    match bootstrap.check().await? {
        BootstrapStatus::Ready => Ok(bootstrap),
        BootstrapStatus::OllamaNotRunning => {
            bootstrap.show_ollama_install_instructions();
            std::process::exit(EXIT_CODE_SETUP_NEEDED);
        }
        BootstrapStatus::ModelNotAvailable(model) => {
            Bootstrap::show_model_pull_instructions(&model);
            std::process::exit(EXIT_CODE_SETUP_NEEDED);
        }
    }
}

fn print_response(args: &Args, response: &QueryResponse) -> Result<()> {
    if args.json {
        println!("{}", output::render_json(response)?);
    } else {
        print!("{}", output::render_response(response));
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    if let Ok(path) = Config::default_path() {
        eprintln!("{} {}", "Default location:".dimmed(), path.display());
    }
    println!("{}", toml::to_string_pretty(config).context("Failed to render configuration")?);
    Ok(())
}
