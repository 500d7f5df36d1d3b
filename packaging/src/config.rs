use serde::{Deserialize, Serialize};
use stage_archive::Compression;
use std::path::PathBuf;

/// Configuration of a [crate::Packager].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackagerConfig {
    /// Compression applied to every produced archive.
    pub compression: Compression,
    /// If set, each updated artifact is synced to `<output_dir>/<artifact>/`.
    pub output_dir: Option<PathBuf>,
}

impl PackagerConfig {
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }
}
