use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// `reconcile` was called with an empty source list.
    NoSources,
    /// Two sources in one run share a name.
    DuplicateSource(String),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (no sources, empty rule pattern, etc.).
    ConfigValidation(String),
    /// A configured source color is not `#RRGGBB`.
    InvalidColor { source: String, value: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSources => write!(f, "at least one source is required"),
            Self::DuplicateSource(name) => write!(f, "duplicate source name: '{name}'"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidColor { source, value } => {
                write!(f, "source '{source}': invalid color '{value}' (expected #RRGGBB)")
            }
        }
    }
}

impl std::error::Error for ReconError {}
