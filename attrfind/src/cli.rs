// attrfind/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "attrfind")]
#[command(about = "Attribute-finding rule engine: loops, confidence conditions, regex rules and entity scoring", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Debug-level logging (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs a rule set against a document
    Run {
        /// Rule-set definition (YAML)
        #[arg(long, short)]
        rules: PathBuf,

        /// Document to search (.txt, or .json with per-character confidences)
        #[arg(long, short)]
        input: PathBuf,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// 📦 Saves a rule set's finding rule as a binary blob
    Compile {
        #[arg(long, short)]
        rules: PathBuf,

        /// Blob file to write
        #[arg(long, short)]
        output: PathBuf,
    },

    /// 🔍 Loads a rule blob and prints its configuration
    Inspect {
        #[arg(long, short)]
        blob: PathBuf,
    },

    /// 📚 Lists the rule sets found in the project's rule-set directory
    List {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🏷️ Scores Person/Company attributes with the project's word lists
    Score {
        /// JSON array of attributes (e.g. the output of `run --format json`)
        #[arg(long, short)]
        input: PathBuf,

        /// Project directory (holds attrfind.yaml and the data dir)
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_run_defaults() -> Result<()> {
        let args = Cli::parse_from(["attrfind", "run", "--rules", "r.yaml", "--input", "d.txt"]);
        assert!(!args.verbose);
        match args.command {
            Commands::Run {
                rules,
                input,
                format,
            } => {
                assert_eq!(rules.to_string_lossy(), "r.yaml");
                assert_eq!(input.to_string_lossy(), "d.txt");
                assert_eq!(format, OutputFormat::Table);
                Ok(())
            }
            _ => bail!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_json_verbose() -> Result<()> {
        let args = Cli::parse_from([
            "attrfind", "run", "-r", "r.yaml", "-i", "d.json", "--format", "json", "--verbose",
        ]);
        assert!(args.verbose);
        match args.command {
            Commands::Run { format, .. } => {
                assert_eq!(format, OutputFormat::Json);
                Ok(())
            }
            _ => bail!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_score_defaults() -> Result<()> {
        let args = Cli::parse_from(["attrfind", "score", "--input", "attrs.json"]);
        match args.command {
            Commands::Score {
                input,
                project_dir,
                format,
            } => {
                assert_eq!(input.to_string_lossy(), "attrs.json");
                assert_eq!(project_dir.to_string_lossy(), ".");
                assert_eq!(format, OutputFormat::Table);
                Ok(())
            }
            _ => bail!("Expected Score command"),
        }
    }

    #[test]
    fn test_cli_parse_list() -> Result<()> {
        let args = Cli::parse_from(["attrfind", "list", "--project-dir", "/tmp/deeds", "-v"]);
        assert!(args.verbose);
        match args.command {
            Commands::List { project_dir } => {
                assert_eq!(project_dir.to_string_lossy(), "/tmp/deeds");
                Ok(())
            }
            _ => bail!("Expected List command"),
        }
    }

    #[test]
    fn test_cli_parse_compile_requires_output() {
        let res = Cli::try_parse_from(["attrfind", "compile", "--rules", "r.yaml"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        let res = Cli::try_parse_from([
            "attrfind", "run", "-r", "r.yaml", "-i", "d.txt", "--format", "xml",
        ]);
        assert!(res.is_err());
    }
}
