//! repoqa - code Q&A dataset builder
//!
//! Extracts functions and a repository digest from a Python project, then
//! asks an LLM for question/answer or requirement/design samples.

use anyhow::Result;
use repoqa::cli::{
    digest, extract, generate, print_extract_json, print_extract_text, print_generate_json,
    print_generate_text, Cli, Commands, OutputFormat,
};
use repoqa::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(project) = cli.project {
        config.project_dir = project;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    match cli.command {
        Commands::Extract(args) => {
            if args.readme.is_some() {
                config.readme = args.readme;
            }

            let summary = extract(&config)?;

            match cli.format {
                OutputFormat::Json => print_extract_json(&summary)?,
                OutputFormat::Text => print_extract_text(&summary),
            }
        }

        Commands::Digest(args) => {
            if args.readme.is_some() {
                config.readme = args.readme;
            }

            print!("{}", digest(&config)?);
        }

        Commands::Generate(args) => {
            if let Some(attempts) = args.attempts {
                config.generation.attempts = attempts;
            }
            if let Some(endpoint) = args.endpoint {
                config.llm.endpoint = endpoint;
            }
            if let Some(model) = args.model {
                config.llm.model = model;
            }

            let summary = generate(&config, args.task, args.skip_extract)?;

            match cli.format {
                OutputFormat::Json => print_generate_json(&summary)?,
                OutputFormat::Text => print_generate_text(&summary),
            }
        }
    }

    Ok(())
}
