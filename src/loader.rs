//! Reading wire documents from storage.
//!
//! A source that does not exist is not an error for a batch load: it is
//! reported as a `MISSING_SOURCE` finding and the other sources still load.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::diagnostics::{Finding, Findings, codes};
use crate::transform::WireDocument;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode '{path}': {message}")]
    Decode { path: PathBuf, message: String },
}

impl LoadError {
    pub fn decode(path: &Path, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The finding a batch load reports in place of this error.
    pub fn to_finding(&self) -> Finding {
        let code = if self.is_missing() {
            codes::MISSING_SOURCE
        } else {
            codes::LOAD_FAILED
        };
        Finding::error(code, self.to_string())
    }
}

/// Produces wire documents from a location.
pub trait Loader: Send + Sync {
    fn load(&self, source: &Path) -> Result<WireDocument, LoadError>;
}

/// A document together with where it came from.
#[derive(Clone, Debug)]
pub struct LoadedDocument {
    pub source: PathBuf,
    pub document: WireDocument,
}

/// Load every source, turning failures into findings.
pub fn load_all(loader: &dyn Loader, sources: &[PathBuf]) -> (Vec<LoadedDocument>, Findings) {
    let mut documents = Vec::with_capacity(sources.len());
    let mut findings = Findings::new();
    for source in sources {
        match loader.load(source) {
            Ok(document) => documents.push(LoadedDocument {
                source: source.clone(),
                document,
            }),
            Err(err) => {
                tracing::debug!("[LOAD] {}", err);
                findings.add(err.to_finding());
            }
        }
    }
    (documents, findings)
}

/// Reads dialect-tagged JSON documents (YAML with the `yaml` feature).
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonLoader;

impl JsonLoader {
    pub fn parse(&self, source: &Path, text: &str) -> Result<WireDocument, LoadError> {
        if is_yaml(source) {
            return parse_yaml(source, text);
        }
        WireDocument::from_json(text).map_err(|e| LoadError::decode(source, e))
    }
}

impl Loader for JsonLoader {
    fn load(&self, source: &Path) -> Result<WireDocument, LoadError> {
        let text = std::fs::read_to_string(source).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(source.to_path_buf()),
            _ => LoadError::Io {
                path: source.to_path_buf(),
                source: err,
            },
        })?;
        let document = self.parse(source, &text)?;
        tracing::trace!("[LOAD] {} ({})", source.display(), document.dialect());
        Ok(document)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

#[cfg(feature = "yaml")]
fn parse_yaml(source: &Path, text: &str) -> Result<WireDocument, LoadError> {
    serde_yaml::from_str(text).map_err(|e| LoadError::decode(source, e))
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(source: &Path, _text: &str) -> Result<WireDocument, LoadError> {
    Err(LoadError::decode(source, "YAML input requires the `yaml` feature"))
}
