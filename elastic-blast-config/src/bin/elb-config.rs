//! A command line tool to check an ElasticBLAST configuration.
//!
//! The configuration files are loaded, validated for the given task and the
//! resolved configuration is printed as JSON.
#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::Verbosity;
use elastic_blast_config::database::LocalMirror;
use elastic_blast_config::Command;
use elastic_blast_config::Config;
use elastic_blast_config::Sections;
use eyre::Result;
use tracing::error;
use tracing::info;
use tracing_log::AsTrace;
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser)]
struct Args {
    /// The configuration files (INI or TOML).
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// The task to validate the configuration for.
    #[arg(short, long, default_value = "submit")]
    task: Command,

    /// A local directory mirroring the buckets that hold database metadata.
    #[arg(short, long)]
    mirror: Option<PathBuf>,

    /// Only read the given files, skipping the default configuration sources.
    #[arg(long, default_value_t = false)]
    no_defaults: bool,

    #[command(flatten)]
    verbose: Verbosity,
}

fn run(args: &Args) -> elastic_blast_config::Result<Config> {
    let sections = if args.no_defaults {
        Sections::load_files(&args.files)?
    } else {
        Sections::load_with_paths(&args.files)?
    };

    let mut builder = Config::builder().sections(sections).task(args.task);

    match &args.mirror {
        Some(mirror) => builder = builder.databases(LocalMirror::new(mirror)),
        None => info!("no database mirror was given; database metadata will not be checked"),
    }

    let config = builder.try_build()?;
    config.validate(args.task)?;
    Ok(config)
}

pub fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    let config = match run(&args) {
        Ok(config) => config,
        Err(err) => {
            let category = err.category();
            error!("{category}");
            eprintln!("{err}");
            std::process::exit(category.exit_code());
        }
    };

    let summary = serde_json::json!({
        "task": config.task().to_string(),
        "cloud-provider": config.provider(),
        "blast": config.blast(),
        "cluster": config.cluster(),
        "max-concurrent-jobs": config.max_number_of_concurrent_blast_jobs()?,
    });

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
