use stage_vfs::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by planning, packaging and verifying artifacts.
#[derive(Debug, Error)]
pub enum Error {
    /// The bytes of a source could not be read at packaging time.
    /// The affected artifact keeps its last-known-good output.
    #[error("unable to read source {path}: {reason}")]
    UnreadableSource { path: PathBuf, reason: String },

    #[error("unknown artifact '{0}'")]
    UnknownArtifact(String),

    #[error("artifact inclusion cycle: {}", .0.join(" -> "))]
    ArtifactCycle(Vec<String>),

    #[error("artifact '{0}' already exists")]
    DuplicateArtifact(String),

    /// Two slots of one container produce an entry with the same name.
    #[error("{artifact}: duplicate output entry '{path}'")]
    DuplicateEntry { artifact: String, path: PathBuf },

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("{artifact}: unable to encode archive '{path}': {source}")]
    Archive {
        artifact: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output mismatch at '{path}':\n{detail}")]
    StructuralMismatch { path: String, detail: String },

    #[error("i/o error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Manifest(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<std::path::PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }

    pub(crate) fn unreadable(node: &stage_vfs::SourceNode) -> impl FnOnce(stage_vfs::Error) -> Self + '_ {
        move |e| Error::UnreadableSource {
            path: node.path(),
            reason: e.to_string(),
        }
    }
}
