use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::Dimension;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("{dimension} not found: {name}")]
    UnknownName { dimension: Dimension, name: String },

    #[error("image {image_id} references missing {dimension} id {id}")]
    DanglingReference {
        dimension: Dimension,
        image_id: i64,
        id: i64,
    },

    #[error("catalog store error: {0}")]
    Store(String),

    #[error("http server error: {0}")]
    Http(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("catalog already contains data; seeding is a one-time operation")]
    AlreadySeeded,
}
