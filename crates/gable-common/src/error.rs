//! Configuration errors shared across the workspace.
//!
//! Store- and editor-specific failures live with their crates; only the
//! configuration taxonomy is common to every binary entry point.

use miette::Diagnostic;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing required environment variable {var}")]
    #[diagnostic(
        code(gable::config::missing_env),
        help("set {var} in the environment or in a .env file")
    )]
    MissingEnv { var: &'static str },

    #[error("invalid URL in {var}: {url}")]
    #[diagnostic(code(gable::config::url_parse))]
    UrlParse {
        var: &'static str,
        url: String,
        #[source]
        source: url::ParseError,
    },
}
