//! Configuration exposed to callers (§6).

use std::path::PathBuf;

use clap::ValueEnum;

/// Desired logging verbosity, mapped to a `tracing` [`tracing_subscriber::EnvFilter`]
/// directive by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogVerbosity {
    None,
    Warn,
    Info,
    Debug,
}

impl LogVerbosity {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogVerbosity::None => "off",
            LogVerbosity::Warn => "warn",
            LogVerbosity::Info => "info",
            LogVerbosity::Debug => "debug",
        }
    }
}

/// Configuration for one pipeline run over a single talk page.
#[derive(Debug, Clone)]
pub struct Config {
    /// Page title; may include the "Talk:" prefix, which is normalized on.
    pub title: String,
    /// Directory holding cached intermediate documents.
    pub cache_folder: PathBuf,
    /// Whether to write the intermediate back to disk after processing.
    pub persist: bool,
    /// Select rough vs. structured corpus assembly.
    pub rough: bool,
    pub log_verbosity: LogVerbosity,
}

impl Config {
    /// Normalizes `title` to always carry the "Talk:" prefix, matching the
    /// wiki API's expectations.
    pub fn talk_title(&self) -> String {
        if self.title.len() >= 5 && self.title[..5].eq_ignore_ascii_case("talk:") {
            self.title.clone()
        } else {
            format!("Talk:{}", self.title)
        }
    }

    /// The filename under which this page's intermediate document is cached.
    pub fn intermediate_filename(&self) -> String {
        let stripped = if self.title.len() >= 5 && self.title[..5].eq_ignore_ascii_case("talk:") {
            &self.title[5..]
        } else {
            &self.title[..]
        };
        format!("{stripped}.json")
    }

    pub fn intermediate_path(&self) -> PathBuf {
        self.cache_folder.join(self.intermediate_filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(title: &str) -> Config {
        Config {
            title: title.to_string(),
            cache_folder: PathBuf::from("./intermediate_format"),
            persist: true,
            rough: false,
            log_verbosity: LogVerbosity::Warn,
        }
    }

    #[test]
    fn talk_title_adds_prefix_when_missing() {
        assert_eq!(config("Guy Fieri").talk_title(), "Talk:Guy Fieri");
    }

    #[test]
    fn talk_title_is_idempotent() {
        assert_eq!(config("Talk:Guy Fieri").talk_title(), "Talk:Guy Fieri");
    }

    #[test]
    fn intermediate_filename_strips_talk_prefix() {
        assert_eq!(
            config("Talk:Guy Fieri").intermediate_filename(),
            "Guy Fieri.json"
        );
        assert_eq!(config("Guy Fieri").intermediate_filename(), "Guy Fieri.json");
    }
}
