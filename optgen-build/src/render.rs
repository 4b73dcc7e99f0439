//! Accessor template.

use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Generics, Ident, ItemUse, parse_quote};

use crate::classify::{FieldDescriptor, Indirection};
use crate::error::{GenerateError, Result};
use crate::scanner::{Located, SourceFile};

/// Inputs of one template execution.
pub struct RenderContext {
    /// Module path that reaches the source module from the generated one.
    pub package: syn::Path,
    /// Two fixed entries, then every other top-level `use` of the source file.
    pub imports: Vec<ItemUse>,
    pub target: Ident,
    pub generics: Generics,
    pub fields: Vec<FieldDescriptor>,
}

impl RenderContext {
    pub fn new(
        source: &SourceFile,
        located: &Located<'_>,
        fields: Vec<FieldDescriptor>,
        package: &str,
        util_path: &str,
    ) -> Result<Self> {
        let package: syn::Path = syn::parse_str(package)
            .map_err(|e| GenerateError::render(format!("invalid package path `{package}`: {e}")))?;
        let util: syn::Path = syn::parse_str(util_path)
            .map_err(|e| GenerateError::render(format!("invalid util path `{util_path}`: {e}")))?;

        let util_import: ItemUse = if util.segments.last().is_some_and(|s| s.ident == "util") {
            parse_quote!(use #util;)
        } else {
            parse_quote!(use #util as util;)
        };

        let mut imports = vec![parse_quote!(use #package::*;), util_import];
        let fixed: Vec<String> = imports.iter().map(|item| item.to_token_stream().to_string()).collect();
        imports.extend(
            source
                .imports()
                .into_iter()
                .filter(|item| !fixed.contains(&item.to_token_stream().to_string())),
        );

        Ok(Self {
            package,
            imports,
            target: located.item.ident.clone(),
            generics: located.item.generics.clone(),
            fields,
        })
    }
}

/// Execute the template and return the formatted source text.
pub fn render(ctx: &RenderContext) -> Result<String> {
    let target = &ctx.target;
    let imports = &ctx.imports;
    let (impl_generics, ty_generics, where_clause) = ctx.generics.split_for_impl();

    let package = ctx
        .package
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::");
    let header = format!(" Fluent accessors for `{target}` from `{package}`.");
    let changed_body = render_changed(&ctx.fields);
    let to_params_body = render_to_params(&ctx.fields);
    let accessors: Vec<TokenStream> = ctx.fields.iter().map(render_accessors).collect();

    let output = quote! {
        //! Code generated by optgen; DO NOT EDIT.
        //!
        #![doc = #header]

        #![allow(unused_imports)]

        #(#imports)*

        impl #impl_generics #target #ty_generics #where_clause {
            /// Returns true if the named field has been set.
            pub fn changed(&self, field_name: &str) -> bool {
                #changed_body
            }

            /// Formats the set fields as request parameters, in declaration order.
            pub fn to_params(&self) -> ::std::result::Result<util::Params, util::ParamsError> {
                #to_params_body
            }

            #(#accessors)*
        }
    };

    let syntax_tree: syn::File =
        syn::parse2(output).map_err(|e| GenerateError::render(format!("generated code does not parse: {e}")))?;
    Ok(prettyplease::unparse(&syntax_tree))
}

fn render_changed(fields: &[FieldDescriptor]) -> TokenStream {
    if fields.is_empty() {
        return quote! {
            let _ = field_name;
            false
        };
    }

    let arms = fields.iter().map(|field| {
        let ident = &field.ident;
        let name = &field.name;
        let cfg = &field.cfg_attrs;
        quote! {
            #(#cfg)*
            #name => util::changed(&self.#ident),
        }
    });

    quote! {
        match field_name {
            #(#arms)*
            _ => false,
        }
    }
}

/// A slice literal, or a `push` sequence once any entry is cfg-gated.
fn render_to_params(fields: &[FieldDescriptor]) -> TokenStream {
    let params: Vec<(&FieldDescriptor, &String)> = fields
        .iter()
        .filter_map(|field| field.param_name.as_ref().map(|key| (field, key)))
        .collect();

    if params.iter().all(|(field, _)| field.cfg_attrs.is_empty()) {
        let entries = params.iter().map(|(field, key)| {
            let ident = &field.ident;
            quote!((#key, &self.#ident as &dyn util::ToParam))
        });
        return quote!(util::to_params(&[#(#entries),*]));
    }

    let pushes = params.iter().map(|(field, key)| {
        let ident = &field.ident;
        let cfg = &field.cfg_attrs;
        quote! {
            #(#cfg)*
            params.push((#key, &self.#ident as &dyn util::ToParam));
        }
    });

    quote! {
        let mut params: ::std::vec::Vec<(&str, &dyn util::ToParam)> = ::std::vec::Vec::new();
        #(#pushes)*
        util::to_params(&params)
    }
}

fn render_accessors(field: &FieldDescriptor) -> TokenStream {
    let ident = &field.ident;
    let cfg = &field.cfg_attrs;
    let ty = &field.declared_type;
    let with = format_ident!("with_{}", field.name);
    let get = format_ident!("get_{}", field.name);

    let (with_doc, get_doc) = match &field.doc_comment {
        Some(comment) => (format!("Set {comment}"), format!("Returns value of {comment}")),
        None => (
            format!("Set field `{}` to given value", field.name),
            format!("Returns value of field `{}`", field.name),
        ),
    };
    let with_doc = doc_lines(&with_doc);
    let get_doc = doc_lines(&get_doc);

    let stored = wrap_value(&field.layers);
    let read = read_value(ident, &field.layers);

    quote! {
        #(#[doc = #with_doc])*
        #(#cfg)*
        pub fn #with(mut self, value: #ty) -> Self {
            self.#ident = #stored;
            self
        }

        #(#[doc = #get_doc])*
        #(#cfg)*
        pub fn #get(&self) -> #ty {
            #read
        }
    }
}

fn doc_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| format!(" {line}")).collect()
}

/// `value` rewrapped in the stripped layers. Only `Option` layers add set-tracking.
fn wrap_value(layers: &[Indirection]) -> TokenStream {
    layers.iter().rev().fold(quote!(value), |inner, layer| match layer {
        Indirection::Option => quote!(Some(#inner)),
        Indirection::Boxed => quote!(Box::new(#inner)),
    })
}

/// A clone of the stored value with every layer unwrapped; unset yields the default.
fn read_value(ident: &Ident, layers: &[Indirection]) -> TokenStream {
    let last = layers.len().saturating_sub(1);
    layers
        .iter()
        .enumerate()
        .fold(quote!(self.#ident.clone()), |inner, (index, layer)| match layer {
            Indirection::Option => quote!(#inner.unwrap_or_default()),
            Indirection::Boxed if index == last => quote!(*#inner),
            Indirection::Boxed => quote!((*#inner)),
        })
}
