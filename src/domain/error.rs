//! Domain error types.

/// Top-level error type for eqindex.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data: {reason}")]
    NoData { reason: String },

    #[error("fetch failed for {ticker}: {reason}")]
    Fetch { ticker: String, reason: String },

    #[error("no shares outstanding figure for {ticker}")]
    MissingShares { ticker: String },

    #[error("export error for {path}: {reason}")]
    Export { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IndexError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        IndexError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        IndexError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&IndexError> for std::process::ExitCode {
    fn from(err: &IndexError) -> Self {
        let code: u8 = match err {
            IndexError::Io(_) | IndexError::Export { .. } => 1,
            IndexError::ConfigParse { .. }
            | IndexError::ConfigMissing { .. }
            | IndexError::ConfigInvalid { .. } => 2,
            IndexError::Database { .. } | IndexError::DatabaseQuery { .. } => 3,
            IndexError::NoData { .. } => 5,
            IndexError::Fetch { .. } | IndexError::MissingShares { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
