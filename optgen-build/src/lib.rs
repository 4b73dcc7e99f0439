//! Build-time generator for fluent option accessors.
//!
//! Given a source file and the name of a struct declared in it, this crate
//! writes a companion module with a `with_<field>`/`get_<field>` pair per
//! field plus `changed` and `to_params`, then runs `rustfmt` over it.
//!
//! Scalar fields must be declared as `Option<T>` so that "never set" and
//! "set to the default" stay distinguishable; the setter wraps the value in
//! `Some`. Maps, sequences, tuples and structs declared in the same file are
//! stored directly.
//!
//! The generated code expects a runtime module (by default `crate::util`)
//! exposing `changed(&T) -> bool`, `to_params(&[(&str, &dyn ToParam)])`,
//! `Params`, `ParamsError` and the `ToParam` trait.
//!
//! # Example
//!
//! In your `build.rs`:
//!
//! ```ignore
//! fn main() {
//!     optgen_build::generate_accessors("ListOptions", "src/bindings/containers.rs")
//!         .util_path("crate::bindings::util")
//!         .run()
//!         .expect("Failed to generate ListOptions accessors");
//!
//!     println!("cargo:rerun-if-changed=src/bindings/containers.rs");
//! }
//! ```

mod classify;
mod error;
mod generator;
mod postprocess;
mod render;
mod scanner;

use std::path::Path;

pub use error::{GenerateError, Result};
pub use generator::{AccessorGenerator, Generated, GeneratedField, default_package, output_file_name};
pub use postprocess::ToolCommand;

/// Runtime module path used when none is configured.
pub const DEFAULT_UTIL_PATH: &str = "crate::util";

/// Create a generator for `type_name` declared in `source_file`.
///
/// # Example
///
/// ```ignore
/// optgen_build::generate_accessors("ListOptions", "src/bindings/containers.rs")
///     .post_process(false)
///     .run()
///     .expect("Failed to generate ListOptions accessors");
/// ```
pub fn generate_accessors(type_name: impl Into<String>, source_file: impl Into<std::path::PathBuf>) -> AccessorGenerator {
    AccessorGenerator::new(type_name, source_file)
}

/// Render the accessor module for `type_name` from in-memory source, without
/// touching the filesystem or running any external tool.
pub fn render_source(content: &str, type_name: &str, package: &str, util_path: &str) -> Result<String> {
    let source = scanner::parse_source(Path::new("<memory>"), content)?;
    let located = scanner::locate(&source.syntax, type_name)?;
    let fields = classify::classify_fields(located.item, &located.records)?;
    let ctx = render::RenderContext::new(&source, &located, fields, package, util_path)?;
    render::render(&ctx)
}
