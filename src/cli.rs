use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::engine::ExtractionConfig;

#[derive(Parser, Debug)]
#[command(
    name = "qaam",
    version,
    about = "Dictionary entry extraction from PDF page geometry"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Extract(ExtractArgs),
    Migrate(MigrateArgs),
    Lookup(LookupArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub geometry: PathBuf,

    #[arg(long, default_value = "1-3")]
    pub pages: String,

    #[arg(long, default_value = "data/entries_preview.json")]
    pub out: PathBuf,

    #[arg(long, default_value_t = false)]
    pub debug: bool,

    #[arg(long, default_value = "data/debug")]
    pub debug_dir: PathBuf,

    #[command(flatten)]
    pub layout: LayoutArgs,
}

#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    #[arg(long, default_value_t = 20.0)]
    pub min_column_gap: f32,

    #[arg(long, default_value_t = 3)]
    pub max_columns: usize,

    #[arg(long, default_value_t = 0.06)]
    pub margin_band_ratio: f32,

    #[arg(long, default_value_t = 8.0)]
    pub headword_tolerance: f32,

    #[arg(long, default_value_t = 10.0)]
    pub promotion_tolerance: f32,
}

impl LayoutArgs {
    pub fn to_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            min_column_gap: self.min_column_gap,
            max_columns: self.max_columns.max(1),
            margin_band_ratio: self.margin_band_ratio,
            headword_tolerance: self.headword_tolerance,
            promotion_tolerance: self.promotion_tolerance,
            ..ExtractionConfig::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    #[arg(long, default_value = "data/entries_preview.json")]
    pub input: PathBuf,

    #[arg(long, env = "QAAM_DB", default_value = "dictionary.db")]
    pub db_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    #[arg(long)]
    pub word: String,

    #[arg(long, env = "QAAM_DB", default_value = "dictionary.db")]
    pub db_path: PathBuf,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, env = "QAAM_DB", default_value = "dictionary.db")]
    pub db_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_defaults_match_layout_defaults() {
        let cli = Cli::try_parse_from(["qaam", "extract", "--geometry", "dump.json"])
            .expect("parse extract");
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract command");
        };

        assert_eq!(args.pages, "1-3");
        assert_eq!(args.out, PathBuf::from("data/entries_preview.json"));
        assert!(!args.debug);

        let config = args.layout.to_config();
        let defaults = ExtractionConfig::default();
        assert_eq!(config.min_column_gap, defaults.min_column_gap);
        assert_eq!(config.max_columns, defaults.max_columns);
        assert_eq!(config.headword_tolerance, defaults.headword_tolerance);
    }

    #[test]
    fn lookup_requires_word() {
        assert!(Cli::try_parse_from(["qaam", "lookup"]).is_err());
    }
}
