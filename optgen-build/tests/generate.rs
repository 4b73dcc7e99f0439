use std::fs;
use std::io::ErrorKind;

use optgen_build::{GenerateError, ToolCommand, generate_accessors};
use tempfile::TempDir;

const CONTAINERS: &str = r#"
use std::collections::HashMap;

/// ListOptions are optional options for listing containers
#[derive(Debug, Default, Clone)]
pub struct ListOptions {
    /// All lists every container, running or not
    pub all: Option<bool>,
    pub filters: HashMap<String, Vec<String>>,
    pub last: Option<i32>,
    pub namespace: Option<bool>,
}
"#;

fn write_source(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn writes_companion_file_next_to_source() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "containers.rs", CONTAINERS);

    let generated = generate_accessors("ListOptions", &source)
        .post_process(false)
        .run()
        .unwrap();

    assert_eq!(generated.output_file, dir.path().join("containers_list_options.rs"));
    assert_eq!(generated.package, "super::containers");
    assert!(!generated.post_processed);

    let names: Vec<&str> = generated.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["all", "filters", "last", "namespace"]);
    assert!(generated.fields[1].composite);
    assert!(!generated.fields[0].composite);

    let code = fs::read_to_string(&generated.output_file).unwrap();
    assert!(code.starts_with("//! Code generated by optgen; DO NOT EDIT."));
    assert!(code.contains("use super::containers::*;"));
    assert!(code.contains("use crate::util;"));
    assert!(code.contains("use std::collections::HashMap;"));
    assert!(code.contains("impl ListOptions {"));
    assert!(code.contains("/// Set all lists every container, running or not"));
    assert!(code.contains("self.filters = value;"));
    assert!(code.contains("self.last = Some(value);"));
    assert_eq!(code.matches("pub fn with_").count(), 4);
    assert_eq!(code.matches("pub fn get_").count(), 4);

    syn::parse_file(&code).expect("generated file should parse");
}

#[test]
fn regenerating_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "containers.rs", CONTAINERS);

    let first = generate_accessors("ListOptions", &source)
        .post_process(false)
        .run()
        .unwrap();
    let first_code = fs::read_to_string(&first.output_file).unwrap();

    let second = generate_accessors("ListOptions", &source)
        .post_process(false)
        .run()
        .unwrap();
    let second_code = fs::read_to_string(&second.output_file).unwrap();

    assert_eq!(first_code, second_code);
}

#[test]
fn overrides_package_util_and_output() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "containers.rs", CONTAINERS);
    let output = dir.path().join("generated.rs");

    let generated = generate_accessors("ListOptions", &source)
        .package("crate::bindings::containers")
        .util_path("crate::bindings::internal::helpers")
        .output_file(&output)
        .post_process(false)
        .run()
        .unwrap();

    assert_eq!(generated.output_file, output);
    let code = fs::read_to_string(&output).unwrap();
    assert!(code.contains("use crate::bindings::containers::*;"));
    assert!(code.contains("use crate::bindings::internal::helpers as util;"));
}

#[test]
fn unknown_type_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "containers.rs", CONTAINERS);

    let err = generate_accessors("InspectOptions", &source)
        .post_process(false)
        .run()
        .unwrap_err();

    assert!(matches!(err, GenerateError::TypeNotFound { ref name } if name == "InspectOptions"));
    assert!(!dir.path().join("containers_inspect_options.rs").exists());
}

#[test]
fn non_struct_target_is_a_type_mismatch() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "modes.rs", "pub enum PullOptions { Always, Never }");

    let err = generate_accessors("PullOptions", &source)
        .post_process(false)
        .run()
        .unwrap_err();

    assert!(matches!(err, GenerateError::TypeMismatch { found: "enum", .. }));
    assert_eq!(err.to_string(), "type `PullOptions` is declared as enum, not a struct");
}

#[test]
fn unreadable_source_is_io_error() {
    let dir = TempDir::new().unwrap();

    let err = generate_accessors("ListOptions", dir.path().join("missing.rs"))
        .post_process(false)
        .run()
        .unwrap_err();

    assert!(matches!(err, GenerateError::Io { .. }));
}

#[test]
fn non_utf8_source_is_invalid_data() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("bad.rs");
    fs::write(&source, [0xff, 0xfe]).unwrap();

    let err = generate_accessors("ListOptions", &source)
        .post_process(false)
        .run()
        .unwrap_err();

    match err {
        GenerateError::Io { path, source: io } => {
            assert_eq!(path, source);
            assert_eq!(io.kind(), ErrorKind::InvalidData);
        }
        other => panic!("expected Io error, got {other:?}"),
    }
    assert!(!dir.path().join("bad_list_options.rs").exists());
}

#[test]
fn private_field_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "pods.rs", "pub struct Opts { name: Option<String> }");

    let err = generate_accessors("Opts", &source)
        .post_process(false)
        .run()
        .unwrap_err();

    assert!(matches!(err, GenerateError::PrivateField { ref field } if field == "name"));
    assert!(!dir.path().join("pods_opts.rs").exists());
}

#[test]
fn malformed_source_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "broken.rs", "pub struct ListOptions { all: Option<bool>");

    let err = generate_accessors("ListOptions", &source)
        .post_process(false)
        .run()
        .unwrap_err();

    assert!(matches!(err, GenerateError::Parse { .. }));
    assert!(!dir.path().join("broken_list_options.rs").exists());
}

#[test]
fn missing_formatter_leaves_written_file() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "containers.rs", CONTAINERS);

    let err = generate_accessors("ListOptions", &source)
        .formatter(ToolCommand::new("optgen-no-such-formatter", Vec::<String>::new()))
        .run()
        .unwrap_err();

    assert!(matches!(err, GenerateError::Tool { .. }));
    assert!(dir.path().join("containers_list_options.rs").exists());
}

#[cfg(unix)]
#[test]
fn post_processing_runs_both_tools() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "containers.rs", CONTAINERS);

    let log = dir.path().join("tools.log");
    let append = |mark: &str| {
        ToolCommand::new(
            "sh",
            [
                "-c".to_string(),
                format!("echo {mark} \"$1\" >> '{}'", log.display()),
                "--".to_string(),
            ],
        )
    };

    let generated = generate_accessors("ListOptions", &source)
        .formatter(append("format"))
        .import_fixer(append("imports"))
        .run()
        .unwrap();

    assert!(generated.post_processed);
    let output = generated.output_file.display().to_string();
    assert_eq!(
        fs::read_to_string(&log).unwrap(),
        format!("format {output}\nimports {output}\n")
    );
}
