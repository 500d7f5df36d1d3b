use rustc_hash::FxHashMap;
use stage_archive::{Compression, Member};
use stage_vfs::path::{Path, PathComponent};
use stage_vfs::SourceNode;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::output::{directory_digest, OutputEntry};
use crate::registry::{Artifact, ArtifactRegistry};
use crate::slots::{Chain, Contents, Expander, Slot};
use crate::{sync, Error, PackagerConfig};

/// Summary of a packager run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageReport {
    /// Artifacts whose output changed, in name order.
    pub updated: Vec<String>,
    /// Artifacts whose output stayed the same.
    pub unchanged: Vec<String>,
    /// Source files read.
    pub files_read: usize,
    /// Source files whose previous output was reused based on their stamp.
    pub files_reused: usize,
    /// Archives serialized.
    pub archives_encoded: usize,
    /// Files written to the output directory.
    pub files_written: usize,
}

#[derive(Debug, Clone)]
struct ArtifactOutput {
    /// Revision of the plan this output was built from.
    revision: u64,
    entries: Vec<OutputEntry>,
}

/// Which parts of the plans get (re)built.
#[derive(Debug, Clone, Copy)]
enum Mode<'r> {
    /// Everything, from scratch.
    Full,
    /// Everything, but files whose source stamp didn't change are reused.
    Stamps,
    /// Only what depends on the given node.
    Changed(&'r SourceNode),
}

/// Builds artifact output and keeps it up to date.
///
/// Output is kept in memory per artifact name, and optionally synced to
/// disk. Taking `&mut self` serializes all runs, so at most one walk writes
/// an artifact's output at any time.
#[derive(Debug, Default)]
pub struct Packager {
    config: PackagerConfig,
    outputs: BTreeMap<String, ArtifactOutput>,
    /// Artifacts whose output directory may not match their output, after
    /// a sync failed halfway.
    unsynced: BTreeSet<String>,
}

impl Packager {
    pub fn new(config: PackagerConfig) -> Self {
        Self {
            config,
            outputs: BTreeMap::new(),
            unsynced: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    /// The current output of an artifact, if it was built.
    pub fn output(&self, artifact: &str) -> Option<&[OutputEntry]> {
        self.outputs.get(artifact).map(|o| &o.entries[..])
    }

    /// Names of all artifacts with output.
    pub fn artifacts(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    /// Builds all artifacts from scratch.
    #[instrument(skip_all, fields(indicatif.pb_show = 1), err)]
    pub fn compile_project(&mut self, registry: &ArtifactRegistry) -> Result<PackageReport, Error> {
        self.run(registry, Mode::Full)
    }

    /// Builds all artifacts, reusing the output of files whose modification
    /// stamp is still the one recorded when they were last read.
    #[instrument(skip_all, fields(indicatif.pb_show = 1), err)]
    pub fn make_project(&mut self, registry: &ArtifactRegistry) -> Result<PackageReport, Error> {
        self.run(registry, Mode::Stamps)
    }

    /// Updates the output entries depending on `source`, in every artifact.
    ///
    /// Only the entries on the way from `source` to each artifact root are
    /// touched: files are re-read, archives containing them re-serialized.
    /// Everything else is kept as is. Output missing because the artifact
    /// was never built is created along that way only.
    #[instrument(skip_all, fields(source = %source.path(), indicatif.pb_show = 1), err)]
    pub fn package_file(
        &mut self,
        source: &SourceNode,
        registry: &ArtifactRegistry,
    ) -> Result<PackageReport, Error> {
        self.run(registry, Mode::Changed(source))
    }

    fn run(&mut self, registry: &ArtifactRegistry, mode: Mode<'_>) -> Result<PackageReport, Error> {
        let span = Span::current();
        span.pb_set_length(registry.len() as u64);
        span.pb_set_message("packaging artifacts");

        let mut report = PackageReport::default();
        let mut first_err = None;

        for artifact in registry.iter() {
            if let Err(e) = self.run_artifact(registry, artifact, mode, &mut report) {
                warn!(artifact = artifact.name(), err = %e, "packaging failed, keeping previous output");
                first_err.get_or_insert(e);
            }
            span.pb_inc(1);
        }

        self.outputs
            .retain(|name, _| registry.get(name).is_some());
        self.unsynced.retain(|name| registry.get(name).is_some());

        match first_err {
            Some(e) => Err(e),
            None => {
                info!(
                    updated = report.updated.len(),
                    unchanged = report.unchanged.len(),
                    "packaging done"
                );
                Ok(report)
            }
        }
    }

    /// Builds a single artifact. Its output is only replaced once the walk
    /// (and the sync to disk) succeeded.
    fn run_artifact(
        &mut self,
        registry: &ArtifactRegistry,
        artifact: &Artifact,
        mode: Mode<'_>,
        report: &mut PackageReport,
    ) -> Result<(), Error> {
        let name = artifact.name();
        // output built from an older plan is discarded.
        let previous = self
            .outputs
            .get(name)
            .filter(|o| o.revision == artifact.revision())
            .map(|o| &o.entries[..]);

        let mut walk = Walk {
            expander: Expander::new(registry, name),
            mode,
            compression: self.config.compression,
            report: PackageReport::default(),
        };
        let root = Contents::Plan {
            nodes: artifact.plan().root(),
            chain: Chain::root(name),
        };
        let entries = walk.container(
            &root,
            Path::ROOT,
            previous.map(<[_]>::to_vec).unwrap_or_default(),
            previous.is_some(),
        )?;

        if previous.is_none() && entries.is_empty() && matches!(mode, Mode::Changed(_)) {
            // nothing reached in an artifact that was never built
            return Ok(());
        }

        let unchanged = previous.is_some_and(|p| directory_digest(p) == directory_digest(&entries));
        if let Some(output_dir) = &self.config.output_dir {
            let resync = self.unsynced.contains(name);
            if !unchanged || resync {
                // after a failed sync the disk can't be diffed against `previous`.
                let on_disk = if resync { None } else { previous };
                match sync::sync_dir(&output_dir.join(name), &entries, on_disk) {
                    Ok(written) => {
                        walk.report.files_written += written;
                        self.unsynced.remove(name);
                    }
                    Err(e) => {
                        self.unsynced.insert(name.to_owned());
                        return Err(e);
                    }
                }
            }
        }

        report.files_read += walk.report.files_read;
        report.files_reused += walk.report.files_reused;
        report.archives_encoded += walk.report.archives_encoded;
        report.files_written += walk.report.files_written;
        if unchanged {
            debug!(artifact = name, "output unchanged");
            report.unchanged.push(name.to_owned());
        } else {
            debug!(artifact = name, "output updated");
            report.updated.push(name.to_owned());
        }

        self.outputs.insert(
            name.to_owned(),
            ArtifactOutput {
                revision: artifact.revision(),
                entries,
            },
        );
        Ok(())
    }
}

/// One walk over the plan of a single artifact.
struct Walk<'a, 'r> {
    expander: Expander<'a>,
    mode: Mode<'r>,
    compression: Compression,
    report: PackageReport,
}

impl<'a> Walk<'a, '_> {
    /// Produces the entries of a container, given its previous entries.
    /// `built` tells whether the container had output before, in which case
    /// every slot must end up with an entry.
    fn container(
        &mut self,
        contents: &Contents<'a>,
        path: &Path,
        previous: Vec<OutputEntry>,
        built: bool,
    ) -> Result<Vec<OutputEntry>, Error> {
        let slots = self.expander.expand(contents, path)?;

        let mut previous: FxHashMap<PathComponent, OutputEntry> = previous
            .into_iter()
            .map(|e| (e.name().clone(), e))
            .collect();

        let mut entries = Vec::with_capacity(slots.len());
        for slot in slots {
            let prev = previous.remove(slot.name());
            let reached = match self.mode {
                Mode::Full | Mode::Stamps => true,
                Mode::Changed(changed) => self.expander.reaches(&slot, changed)?,
            };

            if !reached {
                match prev {
                    Some(prev) => entries.push(prev),
                    // renamed since the last build, its old entry is stale.
                    None if built => entries.push(self.rebuild(slot, path)?),
                    // never built, and not on the way to the change.
                    None => {}
                }
                continue;
            }

            entries.push(self.slot(slot, path, prev)?);
        }

        for name in previous.keys() {
            debug!(path = %path.join(name), "dropping stale entry");
        }

        Ok(entries)
    }

    /// Builds a slot from scratch, whatever the mode.
    fn rebuild(&mut self, slot: Slot<'a>, parent: &Path) -> Result<OutputEntry, Error> {
        let mode = self.mode;
        self.mode = Mode::Full;
        let entry = self.slot(slot, parent, None);
        self.mode = mode;
        entry
    }

    fn slot(
        &mut self,
        slot: Slot<'a>,
        parent: &Path,
        prev: Option<OutputEntry>,
    ) -> Result<OutputEntry, Error> {
        let path = parent.join(slot.name());
        let prev = match self.mode {
            Mode::Full => None,
            _ => prev,
        };

        match slot {
            Slot::File { name, source } => match prev {
                Some(prev @ OutputEntry::File { source_stamp, .. })
                    if matches!(self.mode, Mode::Stamps)
                        && source.is_valid()
                        && source_stamp == source.modification_stamp() =>
                {
                    self.report.files_reused += 1;
                    Ok(prev)
                }
                _ => {
                    // read the stamp first, a concurrent write only makes it older.
                    let stamp = source.modification_stamp();
                    let content = source.content().map_err(Error::unreadable(&source))?;
                    self.report.files_read += 1;
                    debug!(path = %path, source = %source.path(), "copied file");
                    Ok(OutputEntry::file(name, content, stamp))
                }
            },
            Slot::Directory { name, contents } => {
                let (previous, built) = match prev {
                    Some(OutputEntry::Directory { children, .. }) => (children, true),
                    _ => (vec![], false),
                };
                let children = self.container(&contents, &path, previous, built)?;
                Ok(OutputEntry::directory(name, children))
            }
            Slot::Archive { name, contents } => {
                let (previous, prev_bytes) = match prev {
                    Some(OutputEntry::Archive { members, bytes, .. }) => (members, Some(bytes)),
                    _ => (vec![], None),
                };
                let prev_digest = directory_digest(&previous);
                let members = self.container(&contents, &path, previous, prev_bytes.is_some())?;

                match prev_bytes {
                    Some(bytes) if directory_digest(&members) == prev_digest => {
                        Ok(OutputEntry::archive(name, members, bytes))
                    }
                    _ => {
                        let bytes = self.encode(&path, &members)?;
                        Ok(OutputEntry::archive(name, members, bytes))
                    }
                }
            }
        }
    }

    fn encode(&mut self, path: &Path, members: &[OutputEntry]) -> Result<bytes::Bytes, Error> {
        let members: Vec<Member> = members.iter().map(OutputEntry::to_member).collect();
        let bytes = stage_archive::encode(&members, self.compression).map_err(|source| {
            Error::Archive {
                artifact: self.expander.artifact().to_owned(),
                path: path.to_owned(),
                source,
            }
        })?;
        self.report.archives_encoded += 1;
        debug!(path = %path, len = bytes.len(), "encoded archive");
        Ok(bytes)
    }
}
