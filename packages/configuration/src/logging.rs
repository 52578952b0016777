use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Logging {
    /// Logging level. Possible values are: `Off`, `Error`, `Warn`, `Info`,
    /// `Debug` and `Trace`. Default is `Info`.
    #[serde(default = "Logging::default_threshold")]
    pub threshold: Threshold,

    /// Output format of the log lines. Possible values are: `full`,
    /// `pretty`, `pretty_with_paths`, `pretty_without_paths`, `compact` and
    /// `json`. Default is `full`.
    #[serde(default = "Logging::default_style")]
    pub style: Style,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            threshold: Self::default_threshold(),
            style: Self::default_style(),
        }
    }
}

impl Logging {
    fn default_threshold() -> Threshold {
        Threshold::Info
    }

    fn default_style() -> Style {
        Style::Full
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Clone)]
#[serde(rename_all = "lowercase")]
pub enum Threshold {
    /// A threshold lower than all security levels.
    Off,
    /// Corresponds to the `Error` security level.
    Error,
    /// Corresponds to the `Warn` security level.
    Warn,
    /// Corresponds to the `Info` security level.
    Info,
    /// Corresponds to the `Debug` security level.
    Debug,
    /// Corresponds to the `Trace` security level.
    Trace,
}

/// Output format for the log lines.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    /// The default formatter, one line per event.
    Full,
    /// Multi-line excerpt output. File paths are shown when the threshold
    /// is `Debug` or `Trace`.
    Pretty,
    /// Like `Pretty`, with file paths always shown.
    PrettyWithPaths,
    /// Like `Pretty`, with file paths never shown.
    PrettyWithoutPaths,
    /// Single-line output with the least decoration.
    Compact,
    /// One JSON object per line, for log collectors.
    Json,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self {
            Style::Full => "full",
            Style::Pretty => "pretty",
            Style::PrettyWithPaths => "pretty_with_paths",
            Style::PrettyWithoutPaths => "pretty_without_paths",
            Style::Compact => "compact",
            Style::Json => "json",
        };

        f.write_str(style)
    }
}
