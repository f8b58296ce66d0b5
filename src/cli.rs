//! Command-line surface (§10): wraps [`Config`] in a `clap::Parser`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, LogVerbosity};

/// Reconstructs a threaded corpus from a wiki talk page's revision history.
#[derive(Parser, Debug)]
#[command(name = "wikithread")]
#[command(about = "Reconstructs threaded discussions from a wiki talk page's revision history")]
pub struct Cli {
    /// Talk page title, with or without the "Talk:" prefix.
    pub title: String,

    /// Directory holding cached intermediate documents.
    #[arg(long, default_value = "./intermediate_format")]
    pub cache_folder: PathBuf,

    /// Skip writing the intermediate document back to disk after this run.
    #[arg(long)]
    pub no_persist: bool,

    /// Assemble the corpus in rough mode instead of structured mode.
    #[arg(long)]
    pub rough: bool,

    /// Logging verbosity.
    #[arg(long, value_enum, default_value = "warn")]
    pub log_verbosity: LogVerbosity,

    /// Write the corpus JSON here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl Cli {
    pub fn into_parts(self) -> (Config, Option<PathBuf>) {
        (
            Config {
                title: self.title,
                cache_folder: self.cache_folder,
                persist: !self.no_persist,
                rough: self.rough,
                log_verbosity: self.log_verbosity,
            },
            self.out,
        )
    }
}
