use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sosreg_core::config::load_app_config_from_env;
use sosreg_core::JurisdictionRegistry;
use sosreg_engine::{RegistryRouter, SearchOptions, StatusFilter};

#[derive(Debug, Parser)]
#[command(name = "sosreg")]
#[command(about = "Business-registry search across state jurisdictions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search a jurisdiction's registry for entities by name.
    Search {
        /// Jurisdiction code (e.g. "fl", "co").
        code: String,
        /// Entity name to search for.
        query: String,
        /// Maximum entities to return.
        #[arg(long, default_value_t = 25)]
        limit: usize,
        /// Filter by status: active, inactive, or any.
        #[arg(long, default_value = "any")]
        status: StatusFilter,
        /// Bypass the result cache.
        #[arg(long)]
        no_cache: bool,
        /// Fetch detail pages to enrich each result.
        #[arg(long)]
        details: bool,
    },
    /// List the configured jurisdictions.
    Jurisdictions,
    /// Validate every built-in jurisdiction config.
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sosreg=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search {
            code,
            query,
            limit,
            status,
            no_cache,
            details,
        } => {
            let app_config = load_app_config_from_env()?;
            let router = RegistryRouter::new(app_config)?;
            let report = router
                .search_entity(
                    &code,
                    &query,
                    SearchOptions {
                        limit,
                        status,
                        skip_cache: no_cache,
                        include_details: details,
                    },
                )
                .await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.success {
                std::process::exit(1);
            }
        }
        Commands::Jurisdictions => {
            let registry = JurisdictionRegistry::builtin()?;
            for config in registry.all() {
                println!(
                    "{:<4} tier {}  {} — {}",
                    config.code,
                    config.tier.as_number(),
                    config.name,
                    config.registry_name
                );
            }
        }
        Commands::Validate => {
            let mut clean = true;
            for config in sosreg_core::jurisdictions::all() {
                let violations = JurisdictionRegistry::validate(&config);
                if violations.is_empty() {
                    println!("{:<4} ok", config.code);
                } else {
                    clean = false;
                    for violation in violations {
                        println!("{:<4} FAIL: {violation}", config.code);
                    }
                }
            }
            if !clean {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
