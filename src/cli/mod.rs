use crate::DocType;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "doc-review",
    about = "Side-by-side review of versioned batch documents"
)]
pub struct Cli {
    /// Config file (default: doc-review.toml in the working directory, if present).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Open the interactive review TUI (default).
    Review,
    /// Print batches, comparison pairs and the active data source.
    Status,
    /// Print the comparison pairs for one batch and document type.
    Pairs(PairsArgs),
    /// Check connectivity to the configured bucket.
    Probe,
    /// List stored objects under a prefix.
    List(ListArgs),
    /// Print a presigned download URL for an object.
    Presign(PresignArgs),
    /// Generate sample PDFs in the bucket key layout.
    DemoPdfs(DemoArgs),
    /// Upload a local BATCH* directory tree to storage.
    Migrate(MigrateArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PairsArgs {
    /// Batch id (e.g., "B001").
    pub batch: String,
    /// Document type: CI or PL.
    pub doc_type: DocType,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Key prefix (e.g., "CI/B001/"). Lists everything when omitted.
    #[arg(default_value = "")]
    pub prefix: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PresignArgs {
    /// Object key relative to the base prefix.
    pub key: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DemoArgs {
    /// Output directory (default: the configured documents directory).
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MigrateArgs {
    /// Directory containing BATCH* folders.
    pub source: PathBuf,
}

/// Parse CLI arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_review() {
        let cli = Cli::try_parse_from(["doc-review"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn pairs_parses_doc_type() {
        let cli = Cli::try_parse_from(["doc-review", "pairs", "B001", "pl"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Pairs(PairsArgs {
                batch: "B001".to_string(),
                doc_type: DocType::PL,
            }))
        );
        assert!(Cli::try_parse_from(["doc-review", "pairs", "B001", "XX"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["doc-review", "list", "CI/", "--config", "other.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("other.toml")));
        assert_eq!(
            cli.command,
            Some(Commands::List(ListArgs {
                prefix: "CI/".to_string(),
            }))
        );
    }
}
