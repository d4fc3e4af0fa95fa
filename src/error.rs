//! Error taxonomy shared by the context loader and the renderer.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The YAML parsed, but does not have the shape of a context mapping.
    #[error("unable to decode {}: {reason}", path.display())]
    Shape { path: PathBuf, reason: String },

    #[error("unable to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to list template directory {}: {source}", path.display())]
    ListDir {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("unable to create output file {}: {source}", path.display())]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("template path has no file name: {}", path.display())]
    InvalidTemplatePath { path: PathBuf },

    #[error("unable to parse template {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: minijinja::Error,
    },

    #[error("template {} references undefined key `{key}`", path.display())]
    MissingKey { path: PathBuf, key: String },

    /// Strict-undefined failure raised by the engine while executing.
    #[error("template {} references an undefined value: {source}", path.display())]
    Undefined {
        path: PathBuf,
        source: minijinja::Error,
    },

    #[error("unable to execute template {}: {source}", path.display())]
    Execute {
        path: PathBuf,
        source: minijinja::Error,
    },

    #[error("unable to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// True for both the static key check and the engine's runtime
    /// undefined-value failure.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey { .. } | Self::Undefined { .. })
    }
}
