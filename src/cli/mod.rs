//! CLI argument definitions and parsing
use clap::Parser;
use std::path::PathBuf;

use crate::config::WriteMode;

#[derive(Parser, Debug)]
#[command(
    name = "findex",
    version,
    author = "neur0map",
    about = "Hybrid lexical and vector document indexer for local file trees",
    long_about = "Indexes the documents under a root directory into a tantivy index. \
                  When a token-vector dictionary is supplied, each document also carries \
                  a dense embedding so the index supports vector search alongside \
                  full-text search."
)]
pub struct Cli {
    /// Directory where the index is stored
    #[arg(long, value_name = "DIR", default_value = "index")]
    pub index: PathBuf,

    /// Root of the document tree to index
    #[arg(long, value_name = "DIR")]
    pub docs: Option<PathBuf>,

    /// Token-vector dictionary source enabling embedding augmentation
    #[arg(long = "knn-dict", value_name = "FILE")]
    pub knn_dict: Option<PathBuf>,

    /// Replace documents already present instead of assuming a fresh index
    #[arg(long, conflicts_with = "create")]
    pub update: bool,

    /// Build a fresh index, discarding any previous contents (default)
    #[arg(long)]
    pub create: bool,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Write discipline selected for this run
    pub fn write_mode(&self) -> WriteMode {
        if self.update {
            WriteMode::Upsert
        } else {
            WriteMode::Create
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_is_the_default_mode() {
        let cli = Cli::try_parse_from(["findex", "--docs", "/tmp/docs"]).unwrap();
        assert_eq!(cli.write_mode(), WriteMode::Create);
        assert_eq!(cli.index, PathBuf::from("index"));
        assert!(cli.knn_dict.is_none());
    }

    #[test]
    fn test_update_selects_upsert() {
        let cli = Cli::try_parse_from(["findex", "--docs", "/tmp/docs", "--update"]).unwrap();
        assert_eq!(cli.write_mode(), WriteMode::Upsert);
    }

    #[test]
    fn test_update_and_create_conflict() {
        assert!(Cli::try_parse_from(["findex", "--docs", "d", "--update", "--create"]).is_err());
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["findex", "--docs", "d", "--bogus"]).is_err());
    }
}
