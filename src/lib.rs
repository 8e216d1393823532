//! # kubesweep
//!
//! A read-only diagnostic sweep over a Kubernetes cluster. Each resource kind
//! has an analyzer that lists its objects and reports the broken ones,
//! attributed to the controller that owns them.
//!
//! ## Features
//!
//! - **Per-kind analyzers**: Pods, Deployments, Services, Ingresses, CronJobs and more
//! - **Owner resolution**: failures are attributed to the topmost owning controller
//! - **Integrations**: optional analyzers for Trivy and Kyverno reports
//! - **Multiple Formats**: text and JSON reports
//!
//! ## Example
//!
//! ```rust,no_run
//! use kubesweep::analyzer::{AnalyzerContext, Report, build_analyzer_map, run_analysis};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kubesweep::cluster::connect(None, None).await?;
//! let outcome = run_analysis(&[], &[], &build_analyzer_map(&[]), &AnalyzerContext::new(client), 10).await;
//! let report = Report::new("", outcome.results, Vec::new());
//! println!("{} problem(s)", report.problem_count);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod handlers;
pub mod integration;

// Re-export commonly used types and functions
pub use analyzer::{AnalysisResult, Failure, Report, Status, run_analysis};
pub use error::{KubeSweepError, Result};
use cli::{Cli, Commands, FilterCommands, IntegrationCommands};

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn run_command(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Analyze {
            filter,
            namespace,
            selector,
            output,
            max_concurrency,
            with_doc,
            context,
            fail_on_problems,
        } => {
            let config = config::load_config(config_path)?;
            let options = handlers::AnalyzeOptions {
                filters: filter,
                namespace,
                selector,
                output,
                max_concurrency,
                with_doc,
                context,
                fail_on_problems,
            };
            handlers::handle_analyze(options, &config).await
        }
        Commands::Filters { command } => match command {
            FilterCommands::List => {
                let config = config::load_config(config_path)?;
                handlers::handle_filters_list(&config);
                Ok(())
            }
            FilterCommands::Add { filters } => handlers::handle_filters_add(&filters, config_path),
            FilterCommands::Remove { filters } => {
                handlers::handle_filters_remove(&filters, config_path)
            }
        },
        Commands::Integration { command } => match command {
            IntegrationCommands::List => {
                let config = config::load_config(config_path)?;
                handlers::handle_integration_list(&config);
                Ok(())
            }
            IntegrationCommands::Activate { name } => {
                handlers::handle_integration_activate(&name, config_path)
            }
            IntegrationCommands::Deactivate { name } => {
                handlers::handle_integration_deactivate(&name, config_path)
            }
        },
    }
}
