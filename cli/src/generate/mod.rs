//! # Generation Engine
//!
//! File: cli/src/generate/mod.rs
//!
//! ## Overview
//!
//! Runs one generation request end to end:
//!
//! 1. load the blueprint (cached)
//! 2. resolve and validate the configuration payload
//! 3. filter file mappings and dependency entries by their conditions
//! 4. merge the active dependencies into the final manifest
//! 5. render ordinary files, then manifest files (which see the merged
//!    dependency list)
//! 6. dry-run the assembly to catch destination conflicts
//!
//! Validation and render errors are collected in full and returned as one
//! `ForgeError`; a request with any error yields no project at all.
//!
//! ## Architecture
//!
//! `Generator` holds nothing mutable: the blueprint loader behind an `Arc`
//! and an optional progress handle. Independent requests run fully in
//! parallel. Packaging and storing the result are separate steps
//! ([`Generator::package`] and the session store), so a caller that gives up
//! halfway simply drops the value and nothing is left behind. For the same
//! reason a successful run leaves the final `complete` progress event to
//! the caller, who sends it once the project can actually be downloaded.
//!
//! ## Examples
//!
//! ```rust
//! use forge::blueprint::{BlueprintLoader, MemorySource};
//! use forge::generate::{GenerationRequest, Generator};
//! use std::sync::Arc;
//!
//! let source = MemorySource::new().with_blueprint(
//!     "hello",
//!     "[[variables]]\nname = \"Name\"\nkind = \"string\"\nrequired = true\n\n[[files]]\nsource = \"hello.txt.tera\"\n",
//!     [("hello.txt.tera", "Hello, {{ Name }}!")],
//! );
//! let generator = Generator::new(Arc::new(BlueprintLoader::new(source)));
//!
//! let mut request = GenerationRequest::new("hello");
//! request.config.insert("Name".into(), "world".into());
//! let project = generator.generate(request).unwrap();
//! assert_eq!(project.files[0].content, b"Hello, world!");
//! ```
//!
pub mod assembler;
pub mod render;

pub use assembler::{assemble, Assembled, AssemblyMode, ProjectTree};
pub use render::{ContentKind, RenderedFile};

use crate::blueprint::condition;
use crate::blueprint::dependencies::{self, ResolvedDependency};
use crate::blueprint::schema::Hook;
use crate::blueprint::variables::{self, RawConfig, ResolvedVariables};
use crate::blueprint::BlueprintLoader;
use crate::common::archive;
use crate::core::error::{ForgeError, ForgeResult};
use crate::core::id::GenerationId;
use crate::progress::{BroadcasterHandle, ProgressEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub blueprint_id: String,
    pub config: RawConfig,
    /// Caller-chosen id, e.g. so a progress listener can subscribe first.
    pub generation_id: Option<GenerationId>,
}

impl GenerationRequest {
    pub fn new(blueprint_id: impl Into<String>) -> Self {
        Self {
            blueprint_id: blueprint_id.into(),
            config: RawConfig::new(),
            generation_id: None,
        }
    }
}

/// The successful result of the pipeline, before packaging.
#[derive(Debug, Clone)]
pub struct GeneratedProject {
    pub id: GenerationId,
    pub blueprint_id: String,
    pub variables: ResolvedVariables,
    pub files: Vec<RenderedFile>,
    pub dependencies: Vec<ResolvedDependency>,
    pub hooks: Vec<Hook>,
}

impl GeneratedProject {
    pub fn tree(&self) -> ForgeResult<ProjectTree> {
        assembler::plan(&self.files)
    }
}

/// A generated project together with its downloadable archive.
#[derive(Debug, Clone)]
pub struct PackagedProject {
    pub project: GeneratedProject,
    pub archive: Vec<u8>,
}

pub struct Generator {
    loader: Arc<BlueprintLoader>,
    progress: Option<BroadcasterHandle>,
}

impl Generator {
    pub fn new(loader: Arc<BlueprintLoader>) -> Self {
        Self {
            loader,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: BroadcasterHandle) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn loader(&self) -> &Arc<BlueprintLoader> {
        &self.loader
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            progress.broadcast(event);
        }
    }

    /// Resolves `config` against a blueprint without rendering anything.
    pub fn validate(&self, blueprint_id: &str, config: &RawConfig) -> ForgeResult<ResolvedVariables> {
        let blueprint = self.loader.load(blueprint_id)?;
        variables::resolve(&blueprint.schema, config).map_err(ForgeError::Validation)
    }

    /// # Generate Project (`generate`)
    ///
    /// Runs the full pipeline for `request`.
    ///
    /// ## Progress
    ///
    /// Every rendered file is announced as it is produced. A failure ends
    /// the event stream with `complete { success: false }`. A success does
    /// not: the result is not downloadable yet, so the caller sends the
    /// terminal event with [`Generator::complete`] once it has published
    /// the project (or [`Generator::fail`] if publishing goes wrong).
    ///
    /// ## Errors
    ///
    /// Returns the first fatal error (`SchemaNotFound`, `SchemaMalformed`,
    /// `DestinationConflict`) or the full batch of validation or render
    /// errors.
    pub fn generate(&self, request: GenerationRequest) -> ForgeResult<GeneratedProject> {
        let id = request.generation_id.unwrap_or_default();
        info!(generation_id = %id, blueprint = %request.blueprint_id, "Generating project");

        match self.run(id, &request) {
            Ok(project) => {
                info!(
                    generation_id = %id,
                    "Generated {} file(s)",
                    project.files.len()
                );
                Ok(project)
            }
            Err(err) => {
                warn!(generation_id = %id, "Generation failed: {}", err);
                self.fail(id, &err);
                Err(err)
            }
        }
    }

    /// Ends the event stream of `id` with a successful `complete` event.
    pub fn complete(&self, id: GenerationId, file_count: usize) {
        self.emit(ProgressEvent::succeeded(id, file_count));
    }

    /// Announces `err` and ends the event stream of `id` as failed.
    pub fn fail(&self, id: GenerationId, err: &ForgeError) {
        let reported = self.report_failure(id, err);
        self.emit(ProgressEvent::failed(id, reported));
    }

    fn report_failure(&self, id: GenerationId, err: &ForgeError) -> usize {
        match err {
            ForgeError::Validation(errors) => {
                for e in errors {
                    self.emit(ProgressEvent::error(id, None, &e.to_string()));
                }
                errors.len()
            }
            // Render errors were already announced as they happened.
            ForgeError::Render(errors) => errors.len(),
            other => {
                self.emit(ProgressEvent::error(id, None, &other.to_string()));
                1
            }
        }
    }

    fn run(&self, id: GenerationId, request: &GenerationRequest) -> ForgeResult<GeneratedProject> {
        let blueprint = self.loader.load(&request.blueprint_id)?;
        let schema = &blueprint.schema;

        let vars = variables::resolve(schema, &request.config).map_err(ForgeError::Validation)?;

        let (manifests, regular): (Vec<_>, Vec<_>) = schema
            .files
            .iter()
            .enumerate()
            .filter(|(_, mapping)| condition::is_active(mapping.condition.as_ref(), &vars))
            .partition(|(_, mapping)| mapping.manifest);
        debug!(
            generation_id = %id,
            "{} of {} file mapping(s) active",
            manifests.len() + regular.len(),
            schema.files.len()
        );

        let deps = dependencies::merge(&schema.dependencies, &vars);
        let context = render::build_context(schema, &vars, &deps);

        let mut files = Vec::new();
        let mut errors = Vec::new();
        for (batch, is_manifest) in [(regular, false), (manifests, true)] {
            for (index, mapping) in batch {
                match render::render_file(&blueprint, index, mapping, &context) {
                    Ok(file) => {
                        self.emit(if is_manifest {
                            ProgressEvent::file_updated(id, &file.path)
                        } else {
                            ProgressEvent::file_added(id, &file.path)
                        });
                        files.push(file);
                    }
                    Err(e) => {
                        self.emit(ProgressEvent::error(id, Some(e.file.as_str()), &e.message));
                        errors.push(e);
                    }
                }
            }
        }
        if !errors.is_empty() {
            return Err(ForgeError::Render(errors));
        }

        assembler::plan(&files)?;

        Ok(GeneratedProject {
            id,
            blueprint_id: schema.id.clone(),
            variables: vars,
            files,
            dependencies: deps,
            hooks: schema.hooks.clone(),
        })
    }

    /// Assembles the project in memory and packs it into an archive.
    pub fn package(&self, project: GeneratedProject) -> ForgeResult<PackagedProject> {
        let tree = project.tree()?;
        let archive = archive::tar::pack_tree(tree.as_map())?;
        debug!(
            generation_id = %project.id,
            "Packed {} file(s) into {} bytes",
            tree.len(),
            archive.len()
        );
        Ok(PackagedProject { project, archive })
    }

    /// Writes the project below `root`.
    pub fn write_to_disk(
        &self,
        project: &GeneratedProject,
        root: PathBuf,
        overwrite: bool,
    ) -> ForgeResult<Assembled> {
        assemble(&project.files, AssemblyMode::Disk { root, overwrite })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::MemorySource;
    use crate::progress::{Broadcaster, ProgressKind};
    use serde_json::json;

    const MANIFEST: &str = r#"
        [[variables]]
        name = "ProjectName"
        kind = "string"
        required = true

        [[variables]]
        name = "UseDocker"
        kind = "bool"
        default = false

        [[files]]
        source = "main.go.tera"
        destination = "cmd/{{ ProjectName }}/main.go"

        [[files]]
        source = "Dockerfile.tera"
        condition = "UseDocker"

        [[files]]
        source = "go.mod.tera"
        manifest = true

        [[dependencies]]
        module = "github.com/spf13/cobra"
        version = "v1.8.0"

        [[hooks]]
        command = "go mod tidy"
    "#;

    fn generator() -> Generator {
        let source = MemorySource::new().with_blueprint(
            "go",
            MANIFEST,
            [
                ("main.go.tera", "package main // {{ ProjectName }}"),
                ("Dockerfile.tera", "FROM golang"),
                (
                    "go.mod.tera",
                    "module {{ ProjectName }}\n{% for d in dependencies %}require {{ d.module }} {{ d.version }}\n{% endfor %}",
                ),
            ],
        );
        Generator::new(Arc::new(BlueprintLoader::new(source)))
    }

    fn request(config: serde_json::Value) -> GenerationRequest {
        GenerationRequest {
            blueprint_id: "go".into(),
            config: serde_json::from_value(config).unwrap(),
            generation_id: None,
        }
    }

    #[test]
    fn test_conditional_file_excluded() {
        let project = generator().generate(request(json!({ "ProjectName": "api" }))).unwrap();
        let paths: Vec<&str> = project.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["cmd/api/main.go", "go.mod"]);
        assert_eq!(
            String::from_utf8(project.files[1].content.clone()).unwrap(),
            "module api\nrequire github.com/spf13/cobra v1.8.0\n"
        );
        assert_eq!(project.hooks[0].command, "go mod tidy");
    }

    #[test]
    fn test_validation_failure_renders_nothing() {
        let err = generator().generate(request(json!({}))).unwrap_err();
        match err {
            ForgeError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "ProjectName");
            }
            other => panic!("expected validation error, got {}", other),
        }
    }

    #[test]
    fn test_validate_only() {
        let vars = generator()
            .validate("go", &serde_json::from_value(json!({ "ProjectName": "x" })).unwrap())
            .unwrap();
        assert_eq!(vars.len(), 2);
        assert!(matches!(
            generator().validate("missing", &RawConfig::new()),
            Err(ForgeError::SchemaNotFound { .. })
        ));
    }

    #[test]
    fn test_same_input_same_bytes() {
        let gen = generator();
        let config = json!({ "ProjectName": "api", "UseDocker": true });
        let first = gen.package(gen.generate(request(config.clone())).unwrap()).unwrap();
        let second = gen.package(gen.generate(request(config)).unwrap()).unwrap();
        assert_ne!(first.project.id, second.project.id);
        assert_eq!(first.archive, second.archive);
    }

    #[tokio::test]
    async fn test_progress_events_in_order() {
        let hub = Broadcaster::spawn(16);
        let gen = generator().with_progress(hub.clone());
        let id = GenerationId::new();
        let mut sub = hub.register(id);

        let mut req = request(json!({ "ProjectName": "api" }));
        req.generation_id = Some(id);
        let project = gen.generate(req).unwrap();
        assert_eq!(project.id, id);
        gen.complete(id, project.files.len());

        let mut kinds = Vec::new();
        while let Some(event) = sub.recv().await {
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds,
            vec![
                ProgressKind::FileAdded,
                ProgressKind::FileUpdated,
                ProgressKind::Complete
            ]
        );
    }

    #[tokio::test]
    async fn test_late_failure_ends_stream() {
        let hub = Broadcaster::spawn(16);
        let gen = generator().with_progress(hub.clone());
        let id = GenerationId::new();
        let mut sub = hub.register(id);

        let mut req = request(json!({ "ProjectName": "api" }));
        req.generation_id = Some(id);
        gen.generate(req).unwrap();
        gen.fail(id, &ForgeError::GenerationIdInUse { id: id.to_string() });

        let mut events = Vec::new();
        while let Some(event) = sub.recv().await {
            events.push(event);
        }
        let kinds: Vec<ProgressKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ProgressKind::FileAdded,
                ProgressKind::FileUpdated,
                ProgressKind::Error,
                ProgressKind::Complete
            ]
        );
        assert_eq!(events[3].payload, json!({ "success": false, "error_count": 1 }));
    }
}
