//! Derive macros for pgdal
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod entity;

/// Derive the `Entity` column mapping for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use pgdal::Entity;
///
/// #[derive(Entity, Default)]
/// struct Order {
///     #[dal("id, autoincrement")]
///     id: i64,
///     #[dal("customer_name")]
///     customer: String,
///     #[dal("lines, jsonb")]
///     lines: Vec<Line>,
///     #[dal(",omitted")]
///     dirty: bool,
///     note: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[dal("column[,autoincrement][,omitted][,json|jsonb]")]` on a field.
///   An empty column name, or no attribute at all, maps the field to a
///   column named like the field.
///
/// Plain fields need `pgdal::ToValue` and `pgdal::FromValue`; `json` /
/// `jsonb` fields need `serde::Serialize` and `serde::Deserialize`.
#[proc_macro_derive(Entity, attributes(dal))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
