//! Artifact packaging.
//!
//! An [ArtifactRegistry] maps names to [plan::Plan]s, describing the output
//! layout of each artifact. The [Packager] builds that output, either in
//! full ([Packager::compile_project], [Packager::make_project]) or
//! incrementally for a single changed source ([Packager::package_file]).
//! [verify] compares the result against an expected tree.

mod config;
mod digest;
mod errors;
pub mod fixtures;
pub mod manifest;
mod nesting;
pub mod output;
mod packager;
pub mod plan;
mod registry;
mod slots;
mod sync;
pub mod verify;

pub use config::PackagerConfig;
pub use digest::{B3Digest, B3_LEN};
pub use errors::Error;
pub use manifest::Manifest;
pub use output::OutputEntry;
pub use packager::{PackageReport, Packager};
pub use registry::{Artifact, ArtifactRegistry};
