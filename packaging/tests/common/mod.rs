use stage_packaging::plan::PlanBuilder;
use stage_packaging::verify::{assert_output, ExpectedTree};
use stage_packaging::{ArtifactRegistry, PackageReport, Packager, PackagerConfig};
use stage_vfs::{NoopEventSink, SourceNode, VirtualFileSystem};
use std::io::Write;

/// A project with a source file system, artifacts and a packager.
pub struct Project {
    pub fs: VirtualFileSystem,
    pub registry: ArtifactRegistry,
    pub packager: Packager,
}

#[allow(dead_code)]
impl Project {
    pub fn new() -> Self {
        Self::with_config(PackagerConfig::default())
    }

    pub fn with_config(config: PackagerConfig) -> Self {
        Self {
            fs: VirtualFileSystem::new(NoopEventSink),
            registry: ArtifactRegistry::new(),
            packager: Packager::new(config),
        }
    }

    pub fn create_file(&self, path: &str, content: &str) -> SourceNode {
        self.fs
            .create_file(path, content.to_owned())
            .expect("create file")
    }

    pub fn add_artifact(&mut self, name: &str, plan: PlanBuilder) -> String {
        self.registry
            .add(name, plan.build().expect("valid plan"))
            .expect("add artifact");
        name.to_owned()
    }

    /// Rewrites the file through an output stream, bumping its stamp.
    pub fn change_file(&self, file: &SourceNode, content: &str) {
        let mut stream = file
            .output_stream("test", self.fs.next_stamp())
            .expect("open stream");
        stream.write_all(content.as_bytes()).expect("write");
        stream.close().expect("commit");
    }

    pub fn compile_project(&mut self) -> PackageReport {
        self.packager
            .compile_project(&self.registry)
            .expect("compile project")
    }

    pub fn package_file(&mut self, file: &SourceNode) -> PackageReport {
        self.packager
            .package_file(file, &self.registry)
            .expect("package file")
    }

    pub fn compile_and_update(&mut self, file: &SourceNode, content: &str) -> PackageReport {
        self.compile_project();
        self.change_file(file, content);
        self.package_file(file)
    }

    #[track_caller]
    pub fn assert_output(&self, artifact: &str, expected: ExpectedTree) {
        assert_output(&self.packager, artifact, expected)
    }
}
