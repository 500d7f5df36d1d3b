//! JSON description of a project's artifacts.
//!
//! ```json
//! {
//!   "config": { "compression": { "type": "zstd", "level": 3 } },
//!   "artifacts": {
//!     "web": [
//!       { "type": "archive", "name": "web.war", "children": [
//!         { "type": "dir", "name": "WEB-INF", "children": [
//!           { "type": "file", "path": "conf/web.xml" }
//!         ] },
//!         { "type": "dir_copy", "path": "static" }
//!       ] }
//!     ],
//!     "app": [{ "type": "artifact", "name": "web" }]
//!   }
//! }
//! ```
//!
//! Source paths are relative to the root of the [VirtualFileSystem] the
//! manifest is resolved against.

use serde::{Deserialize, Serialize};
use stage_vfs::path::PathComponent;
use stage_vfs::{SourceNode, VirtualFileSystem};
use std::collections::BTreeMap;

use crate::plan::{Plan, PlanNode};
use crate::{ArtifactRegistry, Error, PackagerConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub config: PackagerConfig,
    pub artifacts: BTreeMap<String, Vec<ManifestNode>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ManifestNode {
    File {
        path: String,
    },
    Dir {
        name: String,
        #[serde(default)]
        children: Vec<ManifestNode>,
    },
    Archive {
        name: String,
        #[serde(default)]
        children: Vec<ManifestNode>,
    },
    Artifact {
        name: String,
    },
    DirCopy {
        path: String,
    },
}

impl Manifest {
    pub fn from_json(data: &str) -> Result<Self, Error> {
        serde_json::from_str(data).map_err(|e| Error::Manifest(e.to_string()))
    }

    pub fn load(path: &std::path::Path) -> Result<Self, Error> {
        let data = std::fs::read_to_string(path).map_err(Error::io(path))?;
        Self::from_json(&data)
    }

    /// Resolves all source paths against `fs`, producing the registry.
    /// Artifact references are only checked when packaging.
    pub fn registry(&self, fs: &VirtualFileSystem) -> Result<ArtifactRegistry, Error> {
        let mut registry = ArtifactRegistry::new();
        for (name, nodes) in &self.artifacts {
            let nodes = nodes
                .iter()
                .map(|n| plan_node(n, fs))
                .collect::<Result<Vec<_>, _>>()?;
            registry.add(name.clone(), Plan::new(nodes))?;
        }
        Ok(registry)
    }
}

fn plan_node(node: &ManifestNode, fs: &VirtualFileSystem) -> Result<PlanNode, Error> {
    Ok(match node {
        ManifestNode::File { path } => {
            let source = source(fs, path)?;
            if source.is_directory() {
                return Err(Error::Manifest(format!(
                    "{path} is a directory, use dir_copy"
                )));
            }
            PlanNode::File(source)
        }
        ManifestNode::Dir { name, children } => PlanNode::Directory {
            name: entry_name(name)?,
            children: children
                .iter()
                .map(|n| plan_node(n, fs))
                .collect::<Result<_, _>>()?,
        },
        ManifestNode::Archive { name, children } => PlanNode::Archive {
            name: entry_name(name)?,
            children: children
                .iter()
                .map(|n| plan_node(n, fs))
                .collect::<Result<_, _>>()?,
        },
        ManifestNode::Artifact { name } => PlanNode::ArtifactRef(name.clone()),
        ManifestNode::DirCopy { path } => PlanNode::DirCopy(source(fs, path)?),
    })
}

fn source(fs: &VirtualFileSystem, path: &str) -> Result<SourceNode, Error> {
    fs.find(path)
        .ok_or_else(|| Error::Manifest(format!("source {path:?} does not exist")))
}

fn entry_name(name: &str) -> Result<PathComponent, Error> {
    PathComponent::try_from(name)
        .map_err(|e| Error::Manifest(format!("invalid entry name {name:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::{Manifest, ManifestNode};
    use crate::fixtures::MANIFEST_JSON;
    use crate::plan::PlanNode;
    use crate::Error;
    use stage_archive::Compression;
    use stage_vfs::{NoopEventSink, VirtualFileSystem};

    #[test]
    fn parse() {
        let manifest = Manifest::from_json(MANIFEST_JSON).unwrap();
        assert_eq!(Compression::Zstd { level: 3 }, manifest.config.compression);
        assert_eq!(
            vec![ManifestNode::Artifact { name: "web".into() }],
            manifest.artifacts["app"]
        );
    }

    #[test]
    fn registry() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        let web_xml = fs.create_file("conf/web.xml", "<web/>").unwrap();
        let static_dir = fs.create_dir("static").unwrap();

        let registry = Manifest::from_json(MANIFEST_JSON)
            .unwrap()
            .registry(&fs)
            .unwrap();

        assert_eq!(vec!["app", "web"], registry.names().collect::<Vec<_>>());
        assert_eq!(
            &[PlanNode::Archive {
                name: "web.war".try_into().unwrap(),
                children: vec![
                    PlanNode::Directory {
                        name: "WEB-INF".try_into().unwrap(),
                        children: vec![PlanNode::File(web_xml)],
                    },
                    PlanNode::DirCopy(static_dir),
                ],
            }][..],
            registry.get("web").unwrap().plan().root()
        );
    }

    #[test]
    fn missing_source() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        assert!(matches!(
            Manifest::from_json(MANIFEST_JSON).unwrap().registry(&fs),
            Err(Error::Manifest(_))
        ));
    }

    #[test]
    fn invalid_json() {
        assert!(matches!(
            Manifest::from_json(r#"{"artifacts": {"a": [{"type": "symlink"}]}}"#),
            Err(Error::Manifest(_))
        ));
    }
}
