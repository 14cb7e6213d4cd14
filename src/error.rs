use std::path::PathBuf;

use crate::wg::config::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("invalid interface spec {spec:?}: {source}")]
    InterfaceSpec { spec: String, source: ParseError },

    #[error("invalid config {path}: {source}")]
    Config { path: PathBuf, source: ParseError },

    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("wg cmd fail: {0:?}: {1}")]
    WgCommandFail(Option<i32>, String),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("notification failed: {0}")]
    Notify(String),
}
