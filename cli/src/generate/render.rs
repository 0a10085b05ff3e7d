//! # Template Renderer
//!
//! File: cli/src/generate/render.rs
//!
//! ## Overview
//!
//! Renders active file mappings into [`RenderedFile`]s: the destination path
//! template first, then the body. A failure becomes a [`RenderError`] naming
//! the mapping's template; the generator renders every mapping regardless
//! and voids the request if any of them failed.
//!
//! The context every template sees:
//! - each resolved variable under its own name (unset optionals are absent,
//!   so `{% if Author %}` and `Author | default(value="..")` both work)
//! - `blueprint`: `{ id, name, type, architecture }`
//! - `choices`: choice variable name → its declared choices
//! - `dependencies`: the merged manifest, `[{ module, version }]`
//!
//! The context holds no clock or random values, so identical inputs render
//! identical bytes.
//!
use crate::blueprint::dependencies::ResolvedDependency;
use crate::blueprint::schema::{BlueprintSchema, FileMapping, VariableKind};
use crate::blueprint::variables::ResolvedVariables;
use crate::blueprint::Blueprint;
use crate::core::error::RenderError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path};
use tera::Context;
use tracing::debug;

/// What a file is, judged from its destination name. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Source,
    Config,
    Documentation,
    Script,
    Other,
}

impl ContentKind {
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        match name {
            "Dockerfile" | "Makefile" | "Justfile" | "Procfile" | ".gitignore" | ".dockerignore"
            | ".editorconfig" | ".env" | ".env.example" => return Self::Config,
            "LICENSE" | "README" | "CHANGELOG" | "AUTHORS" => return Self::Documentation,
            _ => {}
        }
        let extension = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => return Self::Other,
        };
        match extension.as_str() {
            "rs" | "go" | "py" | "js" | "mjs" | "ts" | "jsx" | "tsx" | "java" | "kt" | "c"
            | "h" | "cc" | "cpp" | "hpp" | "cs" | "rb" | "php" | "swift" | "scala" | "proto"
            | "sql" | "html" | "css" | "scss" | "vue" | "svelte" => Self::Source,
            "toml" | "yaml" | "yml" | "json" | "ini" | "cfg" | "conf" | "env" | "mod" | "sum"
            | "lock" | "xml" | "properties" => Self::Config,
            "md" | "markdown" | "txt" | "rst" | "adoc" => Self::Documentation,
            "sh" | "bash" | "zsh" | "fish" | "ps1" | "bat" | "cmd" => Self::Script,
            _ => Self::Other,
        }
    }
}

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFile {
    pub path: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub kind: ContentKind,
}

impl RenderedFile {
    pub fn new(path: String, content: Vec<u8>) -> Self {
        let kind = ContentKind::from_path(&path);
        Self {
            path,
            content,
            kind,
        }
    }
}

#[derive(Serialize)]
struct BlueprintInfo<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    architecture: &'a str,
}

/// Builds the template context for one request.
pub fn build_context(
    schema: &BlueprintSchema,
    vars: &ResolvedVariables,
    dependencies: &[ResolvedDependency],
) -> Context {
    let mut context = Context::new();
    for (name, value) in vars.iter() {
        context.insert(name.as_str(), value);
    }

    let choices: BTreeMap<&str, &[String]> = schema
        .variables
        .iter()
        .filter(|v| v.kind == VariableKind::Choice)
        .map(|v| (v.name.as_str(), v.choices.as_slice()))
        .collect();

    context.insert(
        "blueprint",
        &BlueprintInfo {
            id: &schema.id,
            name: &schema.name,
            kind: &schema.kind,
            architecture: &schema.architecture,
        },
    );
    context.insert("choices", &choices);
    context.insert("dependencies", dependencies);
    context
}

/// Checks and normalizes a rendered destination into a relative `a/b/c` path.
pub fn normalize_destination(raw: &str) -> Result<String, String> {
    let unified = raw.trim().replace('\\', "/");
    if unified.is_empty() {
        return Err("destination renders to an empty path".to_string());
    }
    if unified.starts_with('/') || Path::new(&unified).is_absolute() {
        return Err(format!("destination '{}' is absolute", unified));
    }

    let mut segments = Vec::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("destination '{}' leaves the project root", unified));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("destination '{}' is absolute", unified));
            }
        }
    }
    if segments.is_empty() {
        return Err(format!("destination '{}' names no file", unified));
    }
    Ok(segments.join("/"))
}

/// Renders one mapping (by its index in the schema) against `context`.
pub fn render_file(
    blueprint: &Blueprint,
    index: usize,
    mapping: &FileMapping,
    context: &Context,
) -> Result<RenderedFile, RenderError> {
    let fail = |message: String| RenderError::new(&mapping.source, message);

    let path = blueprint
        .templates
        .render_path(index, context)
        .map_err(|e| fail(format!("destination: {}", e)))
        .and_then(|raw| normalize_destination(&raw).map_err(fail))?;
    let body = blueprint
        .templates
        .render_file(&mapping.source, context)
        .map_err(fail)?;

    debug!(source = %mapping.source, "Rendered to '{}'", path);
    Ok(RenderedFile::new(path, body.into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::loader;
    use crate::blueprint::variables::VariableValue;

    fn blueprint(manifest: &str, templates: &[(&str, &str)]) -> Blueprint {
        loader::build(
            "demo",
            manifest,
            templates
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_content_kinds() {
        assert_eq!(ContentKind::from_path("src/main.rs"), ContentKind::Source);
        assert_eq!(ContentKind::from_path("go.mod"), ContentKind::Config);
        assert_eq!(ContentKind::from_path("Dockerfile"), ContentKind::Config);
        assert_eq!(ContentKind::from_path("docs/README.md"), ContentKind::Documentation);
        assert_eq!(ContentKind::from_path("scripts/run.sh"), ContentKind::Script);
        assert_eq!(ContentKind::from_path("logo.png"), ContentKind::Other);
        assert_eq!(ContentKind::from_path(".hidden"), ContentKind::Other);
    }

    #[test]
    fn test_normalize_destination() {
        assert_eq!(normalize_destination("./src//main.rs").unwrap(), "src/main.rs");
        assert_eq!(normalize_destination("a\\b.txt").unwrap(), "a/b.txt");
        assert!(normalize_destination("  ").is_err());
        assert!(normalize_destination("/etc/passwd").is_err());
        assert!(normalize_destination("src/../../x").is_err());
        assert!(normalize_destination("./").is_err());
    }

    #[test]
    fn test_context_exposes_choices_and_dependencies() {
        let bp = blueprint(
            r#"
            [blueprint]
            type = "web-api"

            [[variables]]
            name = "Database"
            kind = "choice"
            choices = ["postgres", "sqlite"]
            default = "sqlite"

            [[files]]
            source = "out.txt.tera"
            "#,
            &[(
                "out.txt.tera",
                "{{ blueprint.type }}:{% for c in choices.Database %}{{ c }},{% endfor %}{% for d in dependencies %}{{ d.module }}@{{ d.version }}{% endfor %}",
            )],
        );
        let vars: ResolvedVariables = [("Database".to_string(), VariableValue::Choice("sqlite".into()))]
            .into_iter()
            .collect();
        let deps = vec![ResolvedDependency {
            module: "m".into(),
            version: "1.0.0".into(),
        }];
        let ctx = build_context(&bp.schema, &vars, &deps);
        let file = render_file(&bp, 0, &bp.schema.files[0], &ctx).unwrap();
        assert_eq!(file.path, "out.txt");
        assert_eq!(
            String::from_utf8(file.content).unwrap(),
            "web-api:postgres,sqlite,m@1.0.0"
        );
    }

    #[test]
    fn test_each_failure_names_its_template() {
        let bp = blueprint(
            r#"
            [[variables]]
            name = "Name"
            kind = "string"

            [[files]]
            source = "a.tera"
            destination = "{{ Name }}/a.txt"

            [[files]]
            source = "b.tera"

            [[files]]
            source = "c.tera"
            destination = "../escape.txt"
            "#,
            &[
                ("a.tera", "a"),
                ("b.tera", "{{ Name | upper }}"),
                ("c.tera", "c"),
            ],
        );
        let ctx = build_context(&bp.schema, &ResolvedVariables::default(), &[]);
        let errors: Vec<RenderError> = bp
            .schema
            .files
            .iter()
            .enumerate()
            .filter_map(|(i, mapping)| render_file(&bp, i, mapping, &ctx).err())
            .collect();

        let failed: Vec<&str> = errors.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(failed, vec!["a.tera", "b.tera", "c.tera"]);
        assert!(errors[2].message.contains("leaves the project root"));
    }
}
