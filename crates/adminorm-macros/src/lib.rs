//! Procedural macros for adminorm.
//!
//! `#[derive(Model)]` turns a struct into a model the integrator can work
//! with: a static field table carrying each field's naming metadata and SQL
//! type, conversions to and from rows, and the table name.

use proc_macro::TokenStream;

mod parse;
mod validate;

use parse::{ModelDef, parse_model};

/// Derive macro for the `Model` trait.
///
/// # Attributes
///
/// - `#[adminorm(table = "name")]` - Override table name (defaults to the
///   pluralized snake_case struct name)
/// - `#[adminorm(tag = "column:x;primaryKey")]` - Raw naming metadata
/// - `#[adminorm(column = "name")]` - Override column name
/// - `#[adminorm(primary_key)]` - Mark field as primary key
/// - `#[adminorm(skip)]` - Leave this field out of the database mapping
///
/// Fields must implement `TypeInfo`, `FromValue`, `Default` and `Clone`, and
/// `Value: From<T>`. Columns absent from a row (projected fetches) hydrate
/// to the field's default.
///
/// # Example
///
/// ```ignore
/// use adminorm::Model;
///
/// #[derive(Model, Default)]
/// #[adminorm(table = "users")]
/// struct User {
///     #[adminorm(primary_key)]
///     id: Option<i64>,
///
///     #[adminorm(column = "name_col")]
///     name: String,
///
///     #[adminorm(tag = "column:email_col;size:255")]
///     email: String,
/// }
/// ```
#[proc_macro_derive(Model, attributes(adminorm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    let model = match parse_model(&input) {
        Ok(m) => m,
        Err(e) => return e.to_compile_error().into(),
    };

    if let Err(e) = validate::validate_model(&model) {
        return e.to_compile_error().into();
    }

    generate_model_impl(&model).into()
}

fn generate_model_impl(model: &ModelDef) -> proc_macro2::TokenStream {
    let name = &model.name;
    let table_name = &model.table_name;

    let field_infos = generate_field_infos(model);
    let to_row_body = generate_to_row(model);
    let from_row_body = generate_from_row(model);

    quote::quote! {
        impl adminorm_core::Model for #name {
            const TABLE_NAME: &'static str = #table_name;

            fn fields() -> &'static [adminorm_core::FieldInfo] {
                static FIELDS: &[adminorm_core::FieldInfo] = &[
                    #field_infos
                ];
                FIELDS
            }

            fn to_row(&self) -> Vec<(&'static str, adminorm_core::Value)> {
                #to_row_body
            }

            fn from_row(row: &adminorm_core::Row) -> adminorm_core::Result<Self> {
                #from_row_body
            }
        }
    }
}

fn generate_field_infos(model: &ModelDef) -> proc_macro2::TokenStream {
    let infos = model.data_fields().map(|field| {
        let field_name = field.name.to_string();
        let ty = &field.ty;
        let tag_ts = match &field.tag {
            Some(tag) => quote::quote! { Some(#tag) },
            None => quote::quote! { None },
        };

        quote::quote! {
            adminorm_core::FieldInfo::new(
                #field_name,
                <#ty as adminorm_core::TypeInfo>::SQL_TYPE,
            )
            .tag_opt(#tag_ts)
            .nullable(<#ty as adminorm_core::TypeInfo>::NULLABLE)
        }
    });

    quote::quote! { #(#infos),* }
}

/// Values are keyed by logical field name.
fn generate_to_row(model: &ModelDef) -> proc_macro2::TokenStream {
    let conversions = model.data_fields().map(|field| {
        let field_ident = &field.name;
        let field_name = field.name.to_string();
        quote::quote! {
            (#field_name, adminorm_core::Value::from(::core::clone::Clone::clone(&self.#field_ident)))
        }
    });

    quote::quote! {
        vec![#(#conversions),*]
    }
}

/// Rows are keyed by column name.
fn generate_from_row(model: &ModelDef) -> proc_macro2::TokenStream {
    let assignments = model.fields.iter().map(|field| {
        let field_ident = &field.name;
        if field.skip {
            quote::quote! { #field_ident: ::core::default::Default::default() }
        } else {
            let ty = &field.ty;
            let column = &field.column_name;
            quote::quote! { #field_ident: row.get_or_default::<#ty>(#column)? }
        }
    });

    quote::quote! {
        Ok(Self {
            #(#assignments,)*
        })
    }
}
