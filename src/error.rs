//! Error types shared by the parser, tables, exporters and cleanup.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading instances or producing artifacts.
///
/// Sampling never fails on infeasibility; it only produces fewer routes.
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed instance {path:?} (line {line}): {reason}")]
    MalformedInstance {
        path: PathBuf,
        /// 1-based line number, 0 when the problem concerns the whole file
        line: usize,
        reason: String,
    },
    #[error("lookup failed: {0}")]
    Lookup(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read or write JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read or write CSV table: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn malformed(
        path: impl Into<PathBuf>,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        Error::MalformedInstance {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_show_their_cause() {
        let io = Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "stream did not contain valid UTF-8",
        ));
        assert_eq!(io.to_string(), "I/O error: stream did not contain valid UTF-8");

        let json = Error::from(serde_json::from_str::<u32>("x").unwrap_err());
        assert!(json.to_string().starts_with("failed to read or write JSON: expected value"));

        let pattern = Error::from(glob::Pattern::new("[").unwrap_err());
        assert!(pattern.to_string().starts_with("invalid file pattern: "));
        assert!(pattern.to_string().len() > "invalid file pattern: ".len());
    }
}
