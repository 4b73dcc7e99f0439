//! Generator pipeline driver.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::classify::{FieldDescriptor, classify_fields};
use crate::error::{GenerateError, Result};
use crate::postprocess::{PostProcessor, ToolCommand};
use crate::render::{RenderContext, render};
use crate::scanner::{locate, read_source};

/// Builder for configuring and running the accessor generator.
pub struct AccessorGenerator {
    type_name: String,
    source_file: PathBuf,
    package: Option<String>,
    util_path: String,
    output_file: Option<PathBuf>,
    post_processor: Option<PostProcessor>,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct Generated {
    pub type_name: String,
    pub source_file: PathBuf,
    pub output_file: PathBuf,
    pub package: String,
    pub fields: Vec<GeneratedField>,
    pub post_processed: bool,
}

/// One accessor pair in the generated file.
#[derive(Debug, Clone)]
pub struct GeneratedField {
    pub name: String,
    pub declared_type: String,
    pub composite: bool,
    pub param_name: Option<String>,
}

impl From<&FieldDescriptor> for GeneratedField {
    fn from(field: &FieldDescriptor) -> Self {
        Self {
            name: field.name.clone(),
            declared_type: field.type_text(),
            composite: field.is_composite,
            param_name: field.param_name.clone(),
        }
    }
}

impl AccessorGenerator {
    /// Create a generator for `type_name` declared in `source_file`.
    pub fn new(type_name: impl Into<String>, source_file: impl Into<PathBuf>) -> Self {
        Self {
            type_name: type_name.into(),
            source_file: source_file.into(),
            package: None,
            util_path: crate::DEFAULT_UTIL_PATH.to_string(),
            output_file: None,
            post_processor: Some(PostProcessor::default()),
        }
    }

    /// Module path the generated module uses to reach the source module.
    ///
    /// Default: derived from the source file name, see [`default_package`].
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Path of the runtime module providing `changed` and `to_params`.
    ///
    /// Default: `crate::util`
    pub fn util_path(mut self, path: impl Into<String>) -> Self {
        self.util_path = path.into();
        self
    }

    /// Set the output file path.
    ///
    /// Default: next to the source file, see [`output_file_name`].
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Replace the formatting command run on the written file.
    ///
    /// Re-enables post-processing if it was turned off.
    pub fn formatter(mut self, command: ToolCommand) -> Self {
        self.post_processor.get_or_insert_with(PostProcessor::default).formatter = command;
        self
    }

    /// Replace the import organising command run after the formatter.
    pub fn import_fixer(mut self, command: ToolCommand) -> Self {
        self.post_processor.get_or_insert_with(PostProcessor::default).import_fixer = command;
        self
    }

    /// Enable or disable the external post-processing tools.
    ///
    /// Default: enabled
    pub fn post_process(mut self, enabled: bool) -> Self {
        if !enabled {
            self.post_processor = None;
        } else if self.post_processor.is_none() {
            self.post_processor = Some(PostProcessor::default());
        }
        self
    }

    /// Run the generator.
    ///
    /// Nothing is written unless the struct was found and rendered. A
    /// post-processing failure leaves the written file in place.
    pub fn run(self) -> Result<Generated> {
        debug!("loading {}", self.source_file.display());
        let source = read_source(&self.source_file)?;
        debug!("parsed {} item(s) from {}", source.syntax.items.len(), source.path.display());

        debug!("locating `{}`", self.type_name);
        let located = locate(&source.syntax, &self.type_name)?;
        let fields = classify_fields(located.item, &located.records)?;
        let summary: Vec<GeneratedField> = fields.iter().map(GeneratedField::from).collect();

        let package = self
            .package
            .clone()
            .unwrap_or_else(|| default_package(&self.source_file));

        debug!("rendering `{}` with package `{package}`", self.type_name);
        let ctx = RenderContext::new(&source, &located, fields, &package, &self.util_path)?;
        let code = render(&ctx)?;

        let output_file = self
            .output_file
            .clone()
            .unwrap_or_else(|| output_file_name(&self.source_file, &self.type_name));

        write_output(&output_file, &code)?;
        info!(
            "generated {} with {} accessor pair(s)",
            output_file.display(),
            summary.len()
        );

        let post_processed = match &self.post_processor {
            Some(processor) => {
                debug!("formatting {}", output_file.display());
                processor.run(&output_file)?;
                true
            }
            None => false,
        };

        Ok(Generated {
            type_name: self.type_name,
            source_file: self.source_file,
            output_file,
            package,
            fields: summary,
            post_processed,
        })
    }
}

/// The handle is dropped, and the file closed, before this returns.
fn write_output(path: &Path, code: &str) -> Result<()> {
    let mut file = File::create(path).map_err(|e| GenerateError::io(path, e))?;
    file.write_all(code.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| GenerateError::io(path, e))
}

/// Output path for `type_name` generated from `source`.
///
/// e.g. `src/bindings/containers.rs` + `ListOptions` ->
/// `src/bindings/containers_list_options.rs`
pub fn output_file_name(source: &Path, type_name: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = type_name.to_lowercase().replacen("options", "_options", 1);
    source.with_file_name(format!("{stem}_{suffix}.rs"))
}

/// Module path from a sibling generated module back to `source`.
///
/// e.g. `containers.rs` -> `super::containers`, `mod.rs` -> `super`
pub fn default_package(source: &Path) -> String {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    match stem {
        "" | "mod" | "lib" | "main" => "super".to_string(),
        stem => format!("super::{stem}"),
    }
}
