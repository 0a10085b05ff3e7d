//! # Blueprint Schema Loader
//!
//! File: cli/src/blueprint/loader.rs
//!
//! ## Overview
//!
//! Turns a blueprint id into a fully checked, immutable [`Blueprint`]:
//! parses `blueprint.toml`, types every default, compiles patterns, parses
//! every condition and compiles every template. Anything wrong surfaces
//! here as `SchemaMalformed` with the offending field path
//! (`variables[1].default`, `files[2].condition`, `templates/main.go.tera`),
//! never later during a generation request.
//!
//! ## Architecture
//!
//! The loader owns a [`BlueprintSource`] and a cache of loaded blueprints
//! behind a reader/writer lock. Blueprint storage is treated as immutable
//! for the life of the process, so the same id always yields the same
//! `Arc<Blueprint>` until [`BlueprintLoader::invalidate`] drops it.
//!
//! ## Examples
//!
//! ```rust
//! use forge::blueprint::{BlueprintLoader, MemorySource};
//!
//! let source = MemorySource::new().with_blueprint(
//!     "hello",
//!     r#"
//!     [[variables]]
//!     name = "Name"
//!     kind = "string"
//!     default = "world"
//!
//!     [[files]]
//!     source = "hello.txt.tera"
//!     "#,
//!     [("hello.txt.tera", "Hello, {{ Name }}!")],
//! );
//! let loader = BlueprintLoader::new(source);
//! let blueprint = loader.load("hello").unwrap();
//! assert_eq!(blueprint.schema.files[0].destination, "hello.txt");
//! ```
//!
use crate::blueprint::condition::Condition;
use crate::blueprint::schema::{
    BlueprintDocument, BlueprintSchema, BlueprintSummary, DependencySpec, FileMapping, Pattern,
    VariableDocument, VariableKind, VariableSpec, RESERVED_NAMES,
};
use crate::blueprint::source::{BlueprintSource, DirectorySource, TEMPLATES_DIRNAME};
use crate::blueprint::variables::{check_constraints, coerce};
use crate::blueprint::Blueprint;
use crate::core::error::{ForgeError, ForgeResult};
use crate::core::templating::{references, TemplateSet};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Extensions stripped from a source identifier to derive a default destination.
const TEMPLATE_EXTENSIONS: &[&str] = &[".tera", ".tmpl", ".template"];

pub struct BlueprintLoader {
    source: Box<dyn BlueprintSource>,
    cache: RwLock<HashMap<String, Arc<Blueprint>>>,
}

impl BlueprintLoader {
    pub fn new(source: impl BlueprintSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_directory(root: impl Into<PathBuf>) -> Self {
        Self::new(DirectorySource::new(root))
    }

    /// Loads `id`, serving repeated calls from the cache.
    pub fn load(&self, id: &str) -> ForgeResult<Arc<Blueprint>> {
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
        {
            return Ok(Arc::clone(hit));
        }

        let manifest = self
            .source
            .manifest(id)?
            .ok_or_else(|| ForgeError::SchemaNotFound { id: id.to_string() })?;
        let templates = self.source.templates(id)?;
        let blueprint = Arc::new(build(id, &manifest, templates)?);
        info!(
            blueprint = %id,
            "Loaded blueprint with {} variable(s), {} file(s), {} dependency entries",
            blueprint.schema.variables.len(),
            blueprint.schema.files.len(),
            blueprint.schema.dependencies.len()
        );

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            cache.entry(id.to_string()).or_insert(blueprint),
        ))
    }

    /// Summaries of every loadable blueprint, sorted by id.
    ///
    /// A blueprint that fails to load is left out of the catalogue and
    /// logged; it still reports its error when loaded directly.
    pub fn list(&self) -> ForgeResult<Vec<BlueprintSummary>> {
        let mut summaries = Vec::new();
        for id in self.source.ids()? {
            match self.load(&id) {
                Ok(blueprint) => summaries.push(blueprint.schema.summary()),
                Err(e) => warn!(blueprint = %id, "Skipping blueprint: {}", e),
            }
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    /// Drops `id` from the cache. Returns whether it was cached.
    pub fn invalidate(&self, id: &str) -> bool {
        let removed = self
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if removed {
            debug!(blueprint = %id, "Invalidated cached blueprint");
        }
        removed
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_destination(source: &str) -> String {
    let lower = source.to_ascii_lowercase();
    TEMPLATE_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext) && lower.len() > ext.len())
        .map(|ext| source[..source.len() - ext.len()].to_string())
        .unwrap_or_else(|| source.to_string())
}

fn parse_condition(
    field: String,
    raw: Option<&str>,
    variables: &[VariableSpec],
) -> ForgeResult<Option<Condition>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let condition = Condition::parse(raw).map_err(|e| ForgeError::malformed(&field, e.to_string()))?;
    condition
        .check(variables)
        .map_err(|reason| ForgeError::malformed(&field, reason))?;
    Ok(Some(condition))
}

fn build_variable(field: &str, doc: VariableDocument) -> ForgeResult<VariableSpec> {
    match doc.kind {
        VariableKind::Choice if doc.choices.is_empty() => {
            return Err(ForgeError::malformed(
                format!("{}.choices", field),
                "a choice variable needs at least one choice",
            ));
        }
        VariableKind::Choice => {}
        _ if !doc.choices.is_empty() => {
            return Err(ForgeError::malformed(
                format!("{}.choices", field),
                "choices are only allowed on choice variables",
            ));
        }
        _ => {}
    }

    let pattern = match doc.pattern {
        Some(_) if doc.kind != VariableKind::String => {
            return Err(ForgeError::malformed(
                format!("{}.pattern", field),
                "patterns are only allowed on string variables",
            ));
        }
        Some(raw) => Some(
            Pattern::new(&raw)
                .map_err(|e| ForgeError::malformed(format!("{}.pattern", field), e.to_string()))?,
        ),
        None => None,
    };

    let mut spec = VariableSpec {
        name: doc.name,
        kind: doc.kind,
        default: None,
        required: doc.required,
        pattern,
        choices: doc.choices,
        description: doc.description,
    };

    if let Some(raw) = doc.default {
        let value = coerce(spec.kind, &raw).ok_or_else(|| {
            ForgeError::malformed(
                format!("{}.default", field),
                format!("expected a {} value, got {}", spec.kind, raw),
            )
        })?;
        if spec.required && value.is_empty() {
            return Err(ForgeError::malformed(
                format!("{}.default", field),
                "a required variable cannot default to an empty value",
            ));
        }
        if let Some(violation) = check_constraints(&spec, &value) {
            return Err(ForgeError::malformed(
                format!("{}.default", field),
                violation.to_string(),
            ));
        }
        spec.default = Some(value);
    }
    Ok(spec)
}

/// Builds and checks a blueprint from its raw parts.
pub(crate) fn build(
    id: &str,
    manifest: &str,
    templates: BTreeMap<String, String>,
) -> ForgeResult<Blueprint> {
    let doc: BlueprintDocument = toml::from_str(manifest)
        .map_err(|e| ForgeError::malformed("blueprint.toml", e.to_string()))?;

    let mut variables: Vec<VariableSpec> = Vec::with_capacity(doc.variables.len());
    for (i, raw) in doc.variables.into_iter().enumerate() {
        let field = format!("variables[{}]", i);
        if !is_identifier(&raw.name) {
            return Err(ForgeError::malformed(
                format!("{}.name", field),
                format!("'{}' is not a valid identifier", raw.name),
            ));
        }
        if RESERVED_NAMES.contains(&raw.name.as_str()) {
            return Err(ForgeError::malformed(
                format!("{}.name", field),
                format!("'{}' is reserved", raw.name),
            ));
        }
        if variables.iter().any(|v| v.name == raw.name) {
            return Err(ForgeError::malformed(
                format!("{}.name", field),
                format!("duplicate variable '{}'", raw.name),
            ));
        }
        variables.push(build_variable(&field, raw)?);
    }

    let mut files = Vec::with_capacity(doc.files.len());
    for (i, raw) in doc.files.into_iter().enumerate() {
        if !templates.contains_key(&raw.source) {
            return Err(ForgeError::malformed(
                format!("files[{}].source", i),
                format!("no template '{}' under {}/", raw.source, TEMPLATES_DIRNAME),
            ));
        }
        let condition = parse_condition(
            format!("files[{}].condition", i),
            raw.condition.as_deref(),
            &variables,
        )?;
        files.push(FileMapping {
            destination: raw
                .destination
                .unwrap_or_else(|| default_destination(&raw.source)),
            source: raw.source,
            condition,
            manifest: raw.manifest,
        });
    }

    let mut dependencies = Vec::with_capacity(doc.dependencies.len());
    for (i, raw) in doc.dependencies.into_iter().enumerate() {
        if raw.module.trim().is_empty() {
            return Err(ForgeError::malformed(
                format!("dependencies[{}].module", i),
                "module must not be empty",
            ));
        }
        if raw.version.trim().is_empty() {
            return Err(ForgeError::malformed(
                format!("dependencies[{}].version", i),
                "version must not be empty",
            ));
        }
        let condition = parse_condition(
            format!("dependencies[{}].condition", i),
            raw.condition.as_deref(),
            &variables,
        )?;
        dependencies.push(DependencySpec {
            module: raw.module,
            version: raw.version,
            condition,
        });
    }

    for (i, hook) in doc.hooks.iter().enumerate() {
        if hook.command.trim().is_empty() {
            return Err(ForgeError::malformed(
                format!("hooks[{}].command", i),
                "command must not be empty",
            ));
        }
    }

    let declared: BTreeSet<&str> = variables
        .iter()
        .map(|v| v.name.as_str())
        .chain(RESERVED_NAMES.iter().copied())
        .collect();
    let undeclared = |body: &str| {
        references::free_variables(body)
            .into_iter()
            .find(|name| !declared.contains(name.as_str()))
    };
    for (name, body) in &templates {
        if let Some(unknown) = undeclared(body) {
            return Err(ForgeError::malformed(
                format!("{}/{}", TEMPLATES_DIRNAME, name),
                format!("references undeclared variable '{}'", unknown),
            ));
        }
    }
    for (i, file) in files.iter().enumerate() {
        if let Some(unknown) = undeclared(&file.destination) {
            return Err(ForgeError::malformed(
                format!("files[{}].destination", i),
                format!("references undeclared variable '{}'", unknown),
            ));
        }
    }

    let destinations: Vec<String> = files.iter().map(|f| f.destination.clone()).collect();
    let compiled = TemplateSet::compile(&templates, &destinations)?;

    let schema = BlueprintSchema {
        id: id.to_string(),
        name: doc.blueprint.name.unwrap_or_else(|| id.to_string()),
        kind: doc.blueprint.kind,
        architecture: doc.blueprint.architecture,
        description: doc.blueprint.description,
        variables,
        files,
        dependencies,
        hooks: doc.hooks,
    };
    Ok(Blueprint {
        schema,
        templates: compiled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::source::MemorySource;
    use crate::blueprint::variables::VariableValue;

    const MANIFEST: &str = r#"
        [blueprint]
        name = "Go API"
        type = "web-api"
        architecture = "layered"

        [[variables]]
        name = "ProjectName"
        kind = "string"
        required = true
        pattern = "^[a-z][a-z0-9-]*$"

        [[variables]]
        name = "Database"
        kind = "choice"
        choices = ["postgres", "sqlite", "none"]
        default = "none"

        [[variables]]
        name = "Port"
        kind = "number"
        default = 8080

        [[files]]
        source = "main.go.tera"
        destination = "cmd/{{ ProjectName }}/main.go"

        [[files]]
        source = "db.go.tmpl"
        condition = "Database != 'none'"

        [[dependencies]]
        module = "github.com/lib/pq"
        version = "v1.10.9"
        condition = "Database == 'postgres'"
    "#;

    fn loader_with(manifest: &str, templates: &[(&str, &str)]) -> BlueprintLoader {
        BlueprintLoader::new(MemorySource::new().with_blueprint(
            "go-api",
            manifest,
            templates.iter().copied(),
        ))
    }

    fn valid_templates() -> Vec<(&'static str, &'static str)> {
        vec![
            ("main.go.tera", "package main // {{ ProjectName }} :{{ Port }}"),
            ("db.go.tmpl", "package db // {{ Database }}"),
        ]
    }

    fn malformed_field(result: ForgeResult<Arc<Blueprint>>) -> String {
        match result {
            Err(ForgeError::SchemaMalformed { field, .. }) => field,
            other => panic!("expected SchemaMalformed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_loads_typed_schema() {
        let loader = loader_with(MANIFEST, &valid_templates());
        let blueprint = loader.load("go-api").unwrap();
        let schema = &blueprint.schema;

        assert_eq!(schema.name, "Go API");
        assert_eq!(schema.kind, "web-api");
        assert_eq!(
            schema.variable("Port").unwrap().default,
            Some(VariableValue::Number(8080.0))
        );
        assert_eq!(schema.files[1].destination, "db.go");
        assert_eq!(
            schema.files[1].condition.as_ref().unwrap().as_str(),
            "Database != 'none'"
        );
        assert!(blueprint.templates.contains("main.go.tera"));
    }

    #[test]
    fn test_cache_returns_same_instance_until_invalidated() {
        let loader = loader_with(MANIFEST, &valid_templates());
        let first = loader.load("go-api").unwrap();
        let second = loader.load("go-api").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(loader.invalidate("go-api"));
        assert!(!loader.invalidate("go-api"));
        let third = loader.load("go-api").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let loader = loader_with(MANIFEST, &valid_templates());
        assert!(matches!(
            loader.load("nope"),
            Err(ForgeError::SchemaNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_conditions_fail_at_load() {
        let broken = MANIFEST.replace("Database != 'none'", "Database != ");
        assert_eq!(
            malformed_field(loader_with(&broken, &valid_templates()).load("go-api")),
            "files[1].condition"
        );

        let undeclared = MANIFEST.replace("Database == 'postgres'", "UseKafka");
        assert_eq!(
            malformed_field(loader_with(&undeclared, &valid_templates()).load("go-api")),
            "dependencies[0].condition"
        );
    }

    #[test]
    fn test_bad_defaults_and_declarations() {
        let wrong_type = MANIFEST.replace("default = 8080", "default = \"eighty\"");
        assert_eq!(
            malformed_field(loader_with(&wrong_type, &valid_templates()).load("go-api")),
            "variables[2].default"
        );

        let bad_choice = MANIFEST.replace("default = \"none\"", "default = \"mysql\"");
        assert_eq!(
            malformed_field(loader_with(&bad_choice, &valid_templates()).load("go-api")),
            "variables[1].default"
        );

        let reserved = MANIFEST.replace("name = \"Port\"", "name = \"dependencies\"");
        assert_eq!(
            malformed_field(loader_with(&reserved, &valid_templates()).load("go-api")),
            "variables[2].name"
        );

        let duplicate = MANIFEST.replace("name = \"Port\"", "name = \"Database\"");
        assert_eq!(
            malformed_field(loader_with(&duplicate, &valid_templates()).load("go-api")),
            "variables[2].name"
        );

        let empty_required = MANIFEST.replace(
            "required = true",
            "required = true\n        default = \"  \"",
        );
        assert_eq!(
            malformed_field(loader_with(&empty_required, &valid_templates()).load("go-api")),
            "variables[0].default"
        );

        let bad_pattern = MANIFEST.replace("^[a-z][a-z0-9-]*$", "([");
        assert_eq!(
            malformed_field(loader_with(&bad_pattern, &valid_templates()).load("go-api")),
            "variables[0].pattern"
        );
    }

    #[test]
    fn test_template_problems_fail_at_load() {
        let missing = loader_with(MANIFEST, &valid_templates()[..1]);
        assert_eq!(malformed_field(missing.load("go-api")), "files[1].source");

        let typo = loader_with(
            MANIFEST,
            &[
                ("main.go.tera", "{% if Port %}{{ ProjectNmae }}{% endif %}"),
                ("db.go.tmpl", ""),
            ],
        );
        assert_eq!(malformed_field(typo.load("go-api")), "templates/main.go.tera");

        let bad_dest = MANIFEST.replace("cmd/{{ ProjectName }}", "cmd/{{ Project }}");
        assert_eq!(
            malformed_field(loader_with(&bad_dest, &valid_templates()).load("go-api")),
            "files[0].destination"
        );

        let unparsable = loader_with(
            MANIFEST,
            &[("main.go.tera", "{% if Port %}"), ("db.go.tmpl", "")],
        );
        assert_eq!(malformed_field(unparsable.load("go-api")), "templates");
    }

    #[test]
    fn test_list_skips_broken_blueprints() {
        let source = MemorySource::new()
            .with_blueprint("ok", "[blueprint]\ntype = \"cli\"", Vec::<(&str, &str)>::new())
            .with_blueprint("broken", "not toml = = =", Vec::<(&str, &str)>::new());
        let loader = BlueprintLoader::new(source);
        let summaries = loader.list().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, "ok");
        assert_eq!(summaries[0].name, "ok");
        assert_eq!(summaries[0].kind, "cli");
    }

    #[test]
    fn test_default_destination_strips_template_extension() {
        assert_eq!(default_destination("src/main.rs.tera"), "src/main.rs");
        assert_eq!(default_destination("README.md.TEMPLATE"), "README.md");
        assert_eq!(default_destination(".gitignore"), ".gitignore");
        assert_eq!(default_destination(".tera"), ".tera");
    }
}
