//! Parsing logic for the Model derive macro.
//!
//! Struct-level `#[adminorm(table = "...")]` and field-level
//! `#[adminorm(...)]` attributes are folded into a `ModelDef`. Field
//! attributes all end up in one canonical naming-metadata string, the same
//! format a hand-written `FieldInfo::tag` would carry.

use proc_macro2::Span;
use syn::{Attribute, Data, DeriveInput, Error, Field, Fields, Ident, Lit, Result, Type};

/// Parsed model definition from a struct with `#[derive(Model)]`.
#[derive(Debug)]
pub struct ModelDef {
    pub name: Ident,
    pub table_name: String,
    pub fields: Vec<FieldDef>,
}

/// Parsed field definition from a struct field.
#[derive(Debug)]
pub struct FieldDef {
    /// The Rust field name, also the logical name.
    pub name: Ident,
    /// Column the field maps to (override or field name).
    pub column_name: String,
    pub ty: Type,
    /// Canonical naming metadata, `None` when the field has none.
    pub tag: Option<String>,
    /// Whether the tag marks this field as a primary key candidate.
    pub primary_key: bool,
    /// Excluded from the field table and row conversion.
    pub skip: bool,
}

impl ModelDef {
    /// Fields that take part in the field table.
    pub fn data_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.skip)
    }
}

pub fn parse_model(input: &DeriveInput) -> Result<ModelDef> {
    let name = input.ident.clone();

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic structs",
        ));
    }

    let table_name = parse_struct_attrs(&input.attrs)?
        .unwrap_or_else(|| derive_table_name(&name.to_string()));

    let fields = match &input.data {
        Data::Struct(data) => parse_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not unions",
            ));
        }
    };

    Ok(ModelDef {
        name,
        table_name,
        fields,
    })
}

/// Parse struct-level `#[adminorm(table = "name")]`.
fn parse_struct_attrs(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut table_name: Option<String> = None;

    for attr in attrs {
        if !attr.path().is_ident("adminorm") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value = string_value(&meta, "table name")?;
                if table_name.is_some() {
                    return Err(meta.error("duplicate adminorm attribute: table"));
                }
                if value.is_empty() {
                    return Err(meta.error("table name cannot be empty"));
                }
                table_name = Some(value);
                Ok(())
            } else {
                Err(meta.error("unknown adminorm struct attribute; expected `table`"))
            }
        })?;
    }

    Ok(table_name)
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>, what: &str) -> Result<String> {
    let value: Lit = meta.value()?.parse()?;
    if let Lit::Str(lit_str) = value {
        Ok(lit_str.value())
    } else {
        Err(Error::new_spanned(
            value,
            format!("expected string literal for {}", what),
        ))
    }
}

/// Default table name: snake_case of the struct name, pluralized.
///
/// - `User` -> `users`
/// - `AuditEntry` -> `audit_entries`
/// - `HTTPLog` -> `http_logs`
fn derive_table_name(struct_name: &str) -> String {
    pluralize(&to_snake_case(struct_name))
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                // word boundary, or the last capital of an acronym
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
                {
                    result.push('_');
                }
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

fn pluralize(word: &str) -> String {
    match word {
        "person" => return "people".to_string(),
        "child" => return "children".to_string(),
        "" => return String::new(),
        _ => {}
    }

    if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh")
    {
        return format!("{word}es");
    }

    if let Some(stem) = word.strip_suffix('y') {
        let after_consonant = stem
            .chars()
            .last()
            .is_some_and(|c| !"aeiou".contains(c));
        if after_consonant {
            return format!("{stem}ies");
        }
    }

    format!("{word}s")
}

fn parse_fields(fields: &Fields) -> Result<Vec<FieldDef>> {
    match fields {
        Fields::Named(named) => named.named.iter().map(parse_field).collect(),
        Fields::Unnamed(_) => Err(Error::new(
            Span::call_site(),
            "Model requires a struct with named fields, not a tuple struct",
        )),
        Fields::Unit => Err(Error::new(
            Span::call_site(),
            "Model requires a struct with fields, not a unit struct",
        )),
    }
}

/// Raw field attributes before folding.
#[derive(Default)]
struct FieldAttrs {
    tag: Option<String>,
    column: Option<String>,
    primary_key: bool,
    skip: bool,
}

fn parse_field(field: &Field) -> Result<FieldDef> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;
    let attrs = parse_field_attrs(&field.attrs)?;

    let folded = crate::validate::fold_tag(
        attrs.tag.as_deref(),
        attrs.column.as_deref(),
        attrs.primary_key,
    )
    .map_err(|msg| Error::new_spanned(&name, msg))?;

    let column_name = folded.column.unwrap_or_else(|| name.to_string());

    Ok(FieldDef {
        name,
        column_name,
        ty: field.ty.clone(),
        tag: folded.tag,
        primary_key: folded.primary_key,
        skip: attrs.skip,
    })
}

/// Parse all `#[adminorm(...)]` attributes on a field.
fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("adminorm") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;

            if path.is_ident("primary_key") {
                result.primary_key = true;
            } else if path.is_ident("skip") {
                result.skip = true;
            } else if path.is_ident("column") {
                if result.column.is_some() {
                    return Err(meta.error("duplicate adminorm attribute: column"));
                }
                result.column = Some(string_value(&meta, "column name")?);
            } else if path.is_ident("tag") {
                if result.tag.is_some() {
                    return Err(meta.error("duplicate adminorm attribute: tag"));
                }
                result.tag = Some(string_value(&meta, "tag")?);
            } else {
                return Err(meta.error(
                    "unknown adminorm field attribute; expected `tag`, `column`, `primary_key` or `skip`",
                ));
            }
            Ok(())
        })?;
    }

    Ok(result)
}
