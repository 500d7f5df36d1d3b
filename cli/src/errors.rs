use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Packaging(#[from] stage_packaging::Error),

    #[error("unable to import {path}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: stage_vfs::Error,
    },

    #[error("unable to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
