use std::collections::BTreeMap;
use tracing::debug;

use crate::plan::Plan;
use crate::Error;

/// A named packaging plan.
#[derive(Debug, Clone)]
pub struct Artifact {
    name: String,
    plan: Plan,
    /// Bumped whenever the plan is replaced, invalidating previous output.
    revision: u64,
}

impl Artifact {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Holds all artifacts of a project, one plan per name.
/// Iteration is in name order.
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<String, Artifact>,
    next_revision: u64,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn revision(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    /// Registers a new artifact. Fails if the name is already taken.
    pub fn add(&mut self, name: impl Into<String>, plan: Plan) -> Result<&Artifact, Error> {
        let name = name.into();
        if self.artifacts.contains_key(&name) {
            return Err(Error::DuplicateArtifact(name));
        }

        let revision = self.revision();
        debug!(artifact = %name, "added artifact");
        Ok(self.artifacts.entry(name.clone()).or_insert(Artifact {
            name,
            plan,
            revision,
        }))
    }

    /// Replaces the plan of an artifact (or adds it), returning the previous
    /// plan. Output built from the previous plan is discarded on the next
    /// packager run.
    pub fn replace(&mut self, name: impl Into<String>, plan: Plan) -> Option<Plan> {
        let name = name.into();
        let revision = self.revision();
        debug!(artifact = %name, revision, "replaced artifact plan");
        self.artifacts
            .insert(
                name.clone(),
                Artifact {
                    name,
                    plan,
                    revision,
                },
            )
            .map(|a| a.plan)
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    pub fn remove(&mut self, name: &str) -> Option<Plan> {
        self.artifacts.remove(name).map(|a| a.plan)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ArtifactRegistry;
    use crate::{plan, Error};

    #[test]
    fn add_get_remove() {
        let mut registry = ArtifactRegistry::new();
        registry.add("b", plan::root().build().unwrap()).unwrap();
        registry.add("a", plan::root().build().unwrap()).unwrap();

        assert_eq!(vec!["a", "b"], registry.names().collect::<Vec<_>>());
        assert_eq!("a", registry.get("a").unwrap().name());
        assert!(registry.remove("a").is_some());
        assert!(registry.get("a").is_none());
        assert_eq!(1, registry.len());
    }

    #[test]
    fn duplicate() {
        let mut registry = ArtifactRegistry::new();
        registry.add("a", plan::root().build().unwrap()).unwrap();
        assert!(matches!(
            registry.add("a", plan::root().build().unwrap()),
            Err(Error::DuplicateArtifact(name)) if name == "a"
        ));
    }

    #[test]
    fn replace_bumps_revision() {
        let mut registry = ArtifactRegistry::new();
        let rev = registry.add("a", plan::root().build().unwrap()).unwrap().revision();
        assert!(registry
            .replace("a", plan::root().dir("d").build().unwrap())
            .is_some());
        assert!(registry.get("a").unwrap().revision() > rev);
        assert!(registry.replace("new", plan::root().build().unwrap()).is_none());
    }
}
