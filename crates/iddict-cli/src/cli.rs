use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "iddict")]
#[command(about = "Inspect and maintain iddict SQLite stores")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file (defaults to ./iddict.toml)
    #[arg(short, long, global = true, env = "IDDICT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database URL (overrides the configuration file)
    #[arg(short, long, global = true, env = "IDDICT_DATABASE_URL")]
    pub database: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count the documents in each collection
    Stats,
    /// List documents of one collection as JSON
    List(ListArgs),
    /// Remove stale tokens and authorizations
    Prune(PruneArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Applications,
    Authorizations,
    Scopes,
    Tokens,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Collection to list
    pub kind: EntityKind,
    /// Maximum number of documents
    #[arg(long)]
    pub count: Option<usize>,
    /// Number of documents to skip
    #[arg(long)]
    pub offset: Option<usize>,
}

#[derive(clap::Args)]
pub struct PruneArgs {
    /// Only entries created more than this many days ago are considered
    #[arg(long, default_value_t = 14)]
    pub older_than_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let cli = Cli::parse_from(["iddict", "list", "tokens", "--count", "5", "--offset", "10"]);
        let Commands::List(args) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(args.kind, EntityKind::Tokens);
        assert_eq!(args.count, Some(5));
        assert_eq!(args.offset, Some(10));
    }

    #[test]
    fn test_prune_defaults_to_fourteen_days() {
        let cli = Cli::parse_from(["iddict", "prune"]);
        let Commands::Prune(args) = cli.command else {
            panic!("expected prune command");
        };
        assert_eq!(args.older_than_days, 14);
    }
}
