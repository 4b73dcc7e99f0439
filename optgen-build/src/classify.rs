//! Per-field metadata extraction.

use std::collections::HashSet;

use log::debug;
use quote::ToTokens;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{
    Attribute, Expr, ExprLit, Field, Fields, GenericArgument, Ident, ItemStruct, Lit, LitStr, Meta, PathArguments, Type,
    Visibility,
};

use crate::error::{GenerateError, Result};

const MAPPING_TYPES: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];
const SEQUENCE_TYPES: &[&str] = &["Vec", "VecDeque", "HashSet", "BTreeSet", "IndexSet"];

/// An indirection layer peeled off the outermost level of a field type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indirection {
    /// `Option<T>`: distinguishes "never set" from "set to the default".
    Option,
    /// `Box<T>`: owning pointer, no effect on set-tracking.
    Boxed,
}

/// Everything the renderer needs to know about one struct field.
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Identifier as written, so `r#type` stays a valid field access.
    pub ident: Ident,
    /// Unraw name used for method names and the default param key.
    pub name: String,
    /// Field type with outermost indirections removed.
    pub declared_type: Type,
    /// Removed indirections, outermost first.
    pub layers: Vec<Indirection>,
    pub is_composite: bool,
    pub doc_comment: Option<String>,
    /// Request parameter key; `None` when serde skips the field.
    pub param_name: Option<String>,
    /// `#[cfg(...)]` attributes, repeated on everything generated for the field.
    pub cfg_attrs: Vec<Attribute>,
}

impl FieldDescriptor {
    /// Token text of the declared type, e.g. `HashMap < String , String >`.
    pub fn type_text(&self) -> String {
        self.declared_type.to_token_stream().to_string()
    }
}

/// Classify every field of `item`, in declaration order.
///
/// `records` holds the names of all structs declared in the same file; a field
/// whose type names one of them has record storage.
pub fn classify_fields(item: &ItemStruct, records: &HashSet<String>) -> Result<Vec<FieldDescriptor>> {
    let fields = match &item.fields {
        Fields::Named(named) => &named.named,
        Fields::Unnamed(unnamed) => {
            if unnamed.unnamed.is_empty() {
                return Ok(Vec::new());
            }
            return Err(GenerateError::UnnamedField {
                type_name: item.ident.to_string(),
                index: 0,
            });
        }
        Fields::Unit => return Ok(Vec::new()),
    };

    fields
        .iter()
        .enumerate()
        .map(|(index, field)| classify_field(item, index, field, records))
        .collect()
}

fn classify_field(item: &ItemStruct, index: usize, field: &Field, records: &HashSet<String>) -> Result<FieldDescriptor> {
    let ident = field.ident.clone().ok_or_else(|| GenerateError::UnnamedField {
        type_name: item.ident.to_string(),
        index,
    })?;
    let name = ident.unraw().to_string();
    if name.is_empty() {
        return Err(GenerateError::UnnamedField {
            type_name: item.ident.to_string(),
            index,
        });
    }

    if !reachable_from_sibling(&field.vis) {
        return Err(GenerateError::PrivateField { field: name });
    }

    let (declared_type, layers) = strip_indirections(&field.ty);
    let optional = layers.contains(&Indirection::Option);
    let is_composite = !optional && is_composite_storage(&declared_type, records);

    if !is_composite && !optional {
        return Err(GenerateError::MissingIndirection { field: name });
    }

    let descriptor = FieldDescriptor {
        param_name: param_name(&field.attrs, &name),
        doc_comment: doc_comment(&field.attrs),
        cfg_attrs: field.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).cloned().collect(),
        ident,
        name,
        declared_type,
        layers,
        is_composite,
    };

    debug!(
        "field `{}`: type `{}`, composite = {}",
        descriptor.name,
        descriptor.type_text(),
        descriptor.is_composite
    );

    Ok(descriptor)
}

/// The generated module sits next to the source module, so private fields are out of reach.
fn reachable_from_sibling(vis: &Visibility) -> bool {
    match vis {
        Visibility::Inherited => false,
        Visibility::Restricted(restricted) => !restricted.path.is_ident("self"),
        Visibility::Public(_) => true,
    }
}

/// Peel `Option<…>` and `Box<…>` wrappers off the outermost level of `ty`.
pub fn strip_indirections(ty: &Type) -> (Type, Vec<Indirection>) {
    let mut layers = Vec::new();
    let mut current = ty;

    loop {
        if let Some(inner) = single_type_argument(current, "Option") {
            layers.push(Indirection::Option);
            current = inner;
        } else if let Some(inner) = single_type_argument(current, "Box") {
            layers.push(Indirection::Boxed);
            current = inner;
        } else {
            break;
        }
    }

    (current.clone(), layers)
}

fn is_composite_storage(ty: &Type, records: &HashSet<String>) -> bool {
    match ty {
        Type::Array(_) | Type::Slice(_) => true,
        Type::Tuple(tuple) => !tuple.elems.is_empty(),
        Type::Paren(paren) => is_composite_storage(&paren.elem, records),
        Type::Path(path) if path.qself.is_none() => path.path.segments.last().is_some_and(|segment| {
            let ident = segment.ident.to_string();
            MAPPING_TYPES.contains(&ident.as_str())
                || SEQUENCE_TYPES.contains(&ident.as_str())
                || records.contains(&ident)
        }),
        _ => false,
    }
}

fn single_type_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// Joined `///` text with the first letter lower-cased.
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').map(str::to_string).unwrap_or(line))
        .collect();

    format_comment(&lines.join("\n"))
}

pub(crate) fn format_comment(comment: &str) -> Option<String> {
    let trimmed = comment.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

fn param_name(attrs: &[Attribute], name: &str) -> Option<String> {
    let mut rename = None;
    let mut skip = false;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                skip = true;
            } else if meta.path.is_ident("rename") {
                if meta.input.peek(syn::Token![=]) {
                    let lit: LitStr = meta.value()?.parse()?;
                    rename = Some(lit.value());
                } else {
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("serialize") {
                            let lit: LitStr = inner.value()?.parse()?;
                            rename = Some(lit.value());
                            Ok(())
                        } else {
                            skip_meta_value(&inner)
                        }
                    })?;
                }
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        });

        if let Err(err) = parsed {
            debug!("ignoring unreadable serde attribute on `{name}`: {err}");
        }
    }

    if skip {
        None
    } else {
        Some(rename.unwrap_or_else(|| name.to_string()))
    }
}

fn skip_meta_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta_value(&inner))?;
    }
    Ok(())
}
