//! Loading, parsing and locating the target struct in a source file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use syn::visit::{self, Visit};
use syn::{Item, ItemEnum, ItemStruct, ItemTrait, ItemType, ItemUnion, ItemUse};

use crate::error::{GenerateError, Result};

/// A parsed source file.
pub struct SourceFile {
    pub path: PathBuf,
    pub syntax: syn::File,
}

impl SourceFile {
    /// Top-level `use` items, in source order.
    pub fn imports(&self) -> Vec<ItemUse> {
        self.syntax
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Use(item_use) => Some(item_use.clone()),
                _ => None,
            })
            .collect()
    }
}

/// The struct selected for generation, plus the names of every struct in the file.
pub struct Located<'ast> {
    pub item: &'ast ItemStruct,
    pub records: HashSet<String>,
}

/// Read the raw contents of `path`.
pub fn load_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| GenerateError::io(path, e))?;
    String::from_utf8(bytes).map_err(|e| {
        GenerateError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Parse `content` as a Rust file. Doc comments stay attached to their items as `#[doc]`.
pub fn parse_source(path: &Path, content: &str) -> Result<SourceFile> {
    let syntax = syn::parse_file(content).map_err(|e| GenerateError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(SourceFile {
        path: path.to_path_buf(),
        syntax,
    })
}

/// Load and parse in one step.
pub fn read_source(path: &Path) -> Result<SourceFile> {
    let content = load_source(path)?;
    parse_source(path, &content)
}

/// Find the first declaration named `type_name`, which must be a struct.
pub fn locate<'ast>(file: &'ast syn::File, type_name: &str) -> Result<Located<'ast>> {
    let mut locator = Locator {
        target: type_name,
        first: None,
        ignored: 0,
        records: HashSet::new(),
    };
    locator.visit_file(file);

    if locator.ignored > 0 {
        warn!(
            "{} further declaration(s) named `{type_name}` ignored, using the first one",
            locator.ignored
        );
    }

    match locator.first {
        Some(Declaration::Struct(item)) => {
            debug!("located struct `{type_name}` with {} field(s)", item.fields.len());
            Ok(Located {
                item,
                records: locator.records,
            })
        }
        Some(Declaration::Other(found)) => Err(GenerateError::TypeMismatch {
            name: type_name.to_string(),
            found,
        }),
        None => Err(GenerateError::TypeNotFound {
            name: type_name.to_string(),
        }),
    }
}

enum Declaration<'ast> {
    Struct(&'ast ItemStruct),
    Other(&'static str),
}

struct Locator<'a, 'ast> {
    target: &'a str,
    first: Option<Declaration<'ast>>,
    ignored: usize,
    records: HashSet<String>,
}

impl<'ast> Locator<'_, 'ast> {
    fn offer(&mut self, ident: &syn::Ident, declaration: Declaration<'ast>) {
        if ident != self.target {
            return;
        }
        if self.first.is_none() {
            self.first = Some(declaration);
        } else {
            self.ignored += 1;
        }
    }
}

impl<'ast> Visit<'ast> for Locator<'_, 'ast> {
    fn visit_item_struct(&mut self, node: &'ast ItemStruct) {
        self.records.insert(node.ident.to_string());
        self.offer(&node.ident, Declaration::Struct(node));
        visit::visit_item_struct(self, node);
    }

    fn visit_item_enum(&mut self, node: &'ast ItemEnum) {
        self.offer(&node.ident, Declaration::Other("enum"));
        visit::visit_item_enum(self, node);
    }

    fn visit_item_union(&mut self, node: &'ast ItemUnion) {
        self.offer(&node.ident, Declaration::Other("union"));
        visit::visit_item_union(self, node);
    }

    fn visit_item_type(&mut self, node: &'ast ItemType) {
        self.offer(&node.ident, Declaration::Other("type alias"));
        visit::visit_item_type(self, node);
    }

    fn visit_item_trait(&mut self, node: &'ast ItemTrait) {
        self.offer(&node.ident, Declaration::Other("trait"));
        visit::visit_item_trait(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str) -> syn::File {
        syn::parse_file(code).unwrap()
    }

    #[test]
    fn test_locate_top_level_struct() {
        let file = parse(
            r#"
            pub struct Other { a: Option<u8> }
            pub struct ListOptions { all: Option<bool>, last: Option<i32> }
            "#,
        );

        let located = locate(&file, "ListOptions").unwrap();
        assert_eq!(located.item.ident, "ListOptions");
        assert_eq!(located.item.fields.len(), 2);
        assert!(located.records.contains("Other"));
        assert!(located.records.contains("ListOptions"));
    }

    #[test]
    fn test_locate_inside_inline_module() {
        let file = parse(
            r#"
            mod inner {
                pub struct Opts { name: Option<String> }
            }
            "#,
        );

        let located = locate(&file, "Opts").unwrap();
        assert_eq!(located.item.fields.len(), 1);
    }

    #[test]
    fn test_locate_first_match_wins() {
        let file = parse(
            r#"
            #[cfg(unix)]
            pub struct Opts { a: Option<u8> }
            #[cfg(windows)]
            pub struct Opts { a: Option<u8>, b: Option<u8> }
            "#,
        );

        let located = locate(&file, "Opts").unwrap();
        assert_eq!(located.item.fields.len(), 1);
    }

    #[test]
    fn test_locate_missing_type() {
        let file = parse("pub struct Present { a: Option<u8> }");

        let err = locate(&file, "Absent").err().unwrap();
        assert!(matches!(err, GenerateError::TypeNotFound { ref name } if name == "Absent"));
    }

    #[test]
    fn test_locate_enum_is_mismatch() {
        let file = parse("pub enum Mode { Fast, Slow }");

        let err = locate(&file, "Mode").err().unwrap();
        assert!(matches!(err, GenerateError::TypeMismatch { found: "enum", .. }));
    }

    #[test]
    fn test_imports_in_source_order() {
        let file = parse(
            r#"
            use std::collections::HashMap;
            use crate::bindings::Mount;
            mod nested { use std::fmt; }
            "#,
        );
        let source = SourceFile {
            path: PathBuf::from("containers.rs"),
            syntax: file,
        };

        let imports = source.imports();
        assert_eq!(imports.len(), 2);
        let first = &imports[0];
        assert_eq!(quote::quote!(#first).to_string(), "use std :: collections :: HashMap ;");
    }

    #[test]
    fn test_parse_error_reports_path() {
        let err = parse_source(Path::new("broken.rs"), "pub struct {").err().unwrap();
        match err {
            GenerateError::Parse { path, .. } => assert_eq!(path, PathBuf::from("broken.rs")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
