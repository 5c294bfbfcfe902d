//! Miette diagnostics for configuration files.
//!
//! Parse errors from `toml` carry a byte span; rendering them against the file
//! contents points the operator at the offending line.

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::error::{ConfigError, Error};

/// Configuration error with source location context.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(futarchy_liquidity::config))]
pub struct ConfigDiagnostic {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: SourceSpan,

    #[help]
    pub help: Option<String>,
}

impl ConfigDiagnostic {
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        src: NamedSource<String>,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            message: message.into(),
            src,
            span: (offset, len).into(),
            help: None,
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Build a located diagnostic for a TOML parse failure in `path`.
///
/// Returns `None` for errors that carry no span, or when the file cannot be
/// re-read.
pub fn locate(error: &Error, path: &Path) -> Option<ConfigDiagnostic> {
    let Error::Config(ConfigError::Parse(parse)) = error else {
        return None;
    };
    let span = parse.span()?;
    let content = std::fs::read_to_string(path).ok()?;
    let source = NamedSource::new(path.display().to_string(), content);
    Some(
        ConfigDiagnostic::new(parse.message().to_string(), source, span.start, span.len())
            .with_help("check the TOML syntax and field types at the marked location"),
    )
}

/// Render a diagnostic with miette's graphical handler.
pub fn render(diagnostic: ConfigDiagnostic) -> String {
    format!("{:?}", miette::Report::new(diagnostic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn locates_toml_syntax_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chain]\nrpc_url = = \"x\"").unwrap();
        let err: Error = ConfigError::Parse(
            toml::from_str::<toml::Value>("[chain]\nrpc_url = = \"x\"").unwrap_err(),
        )
        .into();

        let diagnostic = locate(&err, file.path()).unwrap();
        assert!(diagnostic.help.is_some());
        assert!(diagnostic.span.offset() > 0);
    }

    #[test]
    fn ignores_errors_without_location() {
        let err: Error = ConfigError::MissingField { field: "rpc_url" }.into();
        assert!(locate(&err, Path::new("missing.toml")).is_none());
    }
}
