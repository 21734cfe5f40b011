//! Entity derive macro implementation

use proc_macro2::{Span, TokenStream};
use quote::quote;
use std::collections::HashSet;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, LitStr, Result};

#[derive(Default)]
struct Flags {
    autoincrement: bool,
    omitted: bool,
    json: bool,
    jsonb: bool,
}

struct FieldMapping {
    ident: syn::Ident,
    name: String,
    column: String,
    flags: Flags,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let mut mappings = Vec::with_capacity(fields.len());
    let mut seen = HashSet::new();
    for field in fields {
        let mapping = parse_field(field)?;
        if !seen.insert(mapping.column.clone()) {
            return Err(syn::Error::new_spanned(
                field,
                format!("column `{}` is mapped more than once", mapping.column),
            ));
        }
        mappings.push(mapping);
    }

    let count = mappings.len();

    let descriptors = mappings.iter().map(|m| {
        let field_name = &m.name;
        let column = &m.column;
        let mut d = quote! { pgdal::FieldDescriptor::new(#field_name, #column) };
        if m.flags.autoincrement {
            d = quote! { #d.autoincrement() };
        }
        if m.flags.omitted {
            d = quote! { #d.omitted() };
        }
        if m.flags.json {
            d = quote! { #d.json() };
        }
        if m.flags.jsonb {
            d = quote! { #d.jsonb() };
        }
        d
    });

    let encode_arms = mappings.iter().enumerate().map(|(i, m)| {
        let ident = &m.ident;
        let column = &m.column;
        if m.flags.json || m.flags.jsonb {
            quote! { #i => pgdal::entity::encode_json(#column, &self.#ident), }
        } else {
            quote! { #i => pgdal::entity::encode(&self.#ident), }
        }
    });

    let decode_arms = mappings.iter().enumerate().map(|(i, m)| {
        let ident = &m.ident;
        let column = &m.column;
        if m.flags.json || m.flags.jsonb {
            quote! { #i => self.#ident = pgdal::entity::decode_json(#column, value)?, }
        } else {
            quote! { #i => self.#ident = pgdal::entity::decode(#column, value)?, }
        }
    });

    Ok(quote! {
        impl #impl_generics pgdal::Entity for #name #ty_generics #where_clause {
            fn fields() -> &'static [pgdal::FieldDescriptor] {
                static FIELDS: [pgdal::FieldDescriptor; #count] = [#(#descriptors),*];
                &FIELDS
            }

            fn field_value(
                &self,
                index: usize,
            ) -> pgdal::OrmResult<::core::option::Option<pgdal::Value>> {
                match index {
                    #(#encode_arms)*
                    _ => ::core::result::Result::Ok(::core::option::Option::None),
                }
            }

            fn set_field(&mut self, index: usize, value: pgdal::Value) -> pgdal::OrmResult<()> {
                match index {
                    #(#decode_arms)*
                    _ => {
                        let _ = value;
                    }
                }
                ::core::result::Result::Ok(())
            }
        }
    })
}

fn parse_field(field: &syn::Field) -> Result<FieldMapping> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
    let name = ident.unraw().to_string();

    let mut tag: Option<LitStr> = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("dal") {
            continue;
        }
        if tag.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[dal] attribute"));
        }
        tag = Some(attr.parse_args::<LitStr>()?);
    }

    let Some(tag) = tag else {
        return Ok(FieldMapping {
            ident,
            column: name.clone(),
            name,
            flags: Flags::default(),
        });
    };

    let (column, flags) = parse_tag(&tag.value(), tag.span())?;
    Ok(FieldMapping {
        ident,
        column: column.unwrap_or_else(|| name.clone()),
        name,
        flags,
    })
}

/// `column[,flag...]`; whitespace is ignored.
///
/// Compile-time twin of `pgdal::FieldDescriptor::from_tag`; the two must
/// accept the same tags and produce the same descriptors.
fn parse_tag(tag: &str, span: Span) -> Result<(Option<String>, Flags)> {
    let mut segments = tag.split(',').map(str::trim);
    let column = segments
        .next()
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let mut flags = Flags::default();
    for flag in segments {
        match flag {
            "" => {}
            "autoincrement" => flags.autoincrement = true,
            "omitted" => flags.omitted = true,
            "json" => flags.json = true,
            "jsonb" => flags.jsonb = true,
            other => {
                return Err(syn::Error::new(
                    span,
                    format!(
                        "unknown flag `{other}`; expected autoincrement, omitted, json or jsonb"
                    ),
                ));
            }
        }
    }
    Ok((column, flags))
}
