use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kubesweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sweep a Kubernetes cluster for broken workloads")]
#[command(long_about = "Runs a set of read-only analyzers against the cluster, one per resource kind, and reports every object that looks broken together with the controller that owns it.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (defaults to ~/.kubesweep.toml)
    #[arg(short, long, global = true, value_name = "FILE", env = "KUBESWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze the cluster and report problems
    Analyze {
        /// Filters to run (comma separated); defaults to the active filters
        #[arg(short, long, value_delimiter = ',')]
        filter: Vec<String>,

        /// Only analyze this namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Only analyze objects matching this label selector
        #[arg(short = 'l', long)]
        selector: Option<String>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_parser = PossibleValuesParser::new(crate::analyzer::list_formats().iter().copied()))]
        output: Option<String>,

        /// Maximum number of analyzers running at once
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Attach field documentation to failures
        #[arg(long)]
        with_doc: bool,

        /// Kubeconfig context to use
        #[arg(long)]
        context: Option<String>,

        /// Exit with a non-zero status when problems are found
        #[arg(long)]
        fail_on_problems: bool,
    },

    /// Manage the filters used by analyze
    Filters {
        #[command(subcommand)]
        command: FilterCommands,
    },

    /// Manage integrations
    Integration {
        #[command(subcommand)]
        command: IntegrationCommands,
    },
}

#[derive(Subcommand)]
pub enum FilterCommands {
    /// List available and active filters
    List,

    /// Add filters to the active list
    Add {
        /// Filter names (comma separated)
        #[arg(value_delimiter = ',', required = true)]
        filters: Vec<String>,
    },

    /// Remove filters from the active list
    Remove {
        /// Filter names (comma separated)
        #[arg(value_delimiter = ',', required = true)]
        filters: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum IntegrationCommands {
    /// List built-in integrations and whether they are active
    List,

    /// Activate an integration and its filters
    Activate {
        name: String,
    },

    /// Deactivate an integration and remove its filters
    Deactivate {
        name: String,
    },
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_flags() {
        let cli = Cli::try_parse_from([
            "kubesweep", "analyze", "-f", "Pod,Service", "-n", "shop", "-o", "json", "--with-doc",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                filter,
                namespace,
                output,
                with_doc,
                ..
            } => {
                assert_eq!(filter, vec!["Pod", "Service"]);
                assert_eq!(namespace.as_deref(), Some("shop"));
                assert_eq!(output.as_deref(), Some("json"));
                assert!(with_doc);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_unknown_output_rejected() {
        assert!(Cli::try_parse_from(["kubesweep", "analyze", "-o", "yaml"]).is_err());
    }

    #[test]
    fn test_filters_add_requires_names() {
        assert!(Cli::try_parse_from(["kubesweep", "filters", "add"]).is_err());
        assert!(Cli::try_parse_from(["kubesweep", "filters", "add", "Pod,Node"]).is_ok());
    }
}
