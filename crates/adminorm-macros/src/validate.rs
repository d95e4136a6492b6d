//! Compile-time validation for the Model derive macro.
//!
//! Naming metadata is checked here with the same grammar the runtime
//! descriptor parser uses, so a derived model never fails to parse at
//! runtime because of its own attributes.

use std::collections::HashMap;

use proc_macro2::Span;
use syn::{Error, GenericArgument, PathArguments, Type};

use crate::parse::{FieldDef, ModelDef};

/// Field attributes folded into one canonical tag.
#[derive(Debug, PartialEq, Eq)]
pub struct FoldedTag {
    pub tag: Option<String>,
    pub column: Option<String>,
    pub primary_key: bool,
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Merge a raw `tag`, a `column` override and a `primary_key` flag.
pub fn fold_tag(
    tag: Option<&str>,
    column_attr: Option<&str>,
    primary_key_attr: bool,
) -> Result<FoldedTag, String> {
    let mut segments: Vec<String> = Vec::new();
    let mut column: Option<String> = None;
    let mut primary_key: Option<bool> = None;

    for segment in tag.unwrap_or_default().split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (key, value) = match segment.split_once(':') {
            Some((k, v)) => (k.trim(), Some(v.trim())),
            None => (segment, None),
        };

        if key.eq_ignore_ascii_case("column") {
            let name = value.unwrap_or_default();
            if !is_identifier(name) {
                return Err(format!(
                    "column override '{}' must be a plain SQL identifier",
                    name
                ));
            }
            column = Some(name.to_string());
        } else if key.eq_ignore_ascii_case("primarykey") || key.eq_ignore_ascii_case("primary_key")
        {
            primary_key = Some(match value {
                None => true,
                Some(v) if v.eq_ignore_ascii_case("true") => true,
                Some(v) if v.eq_ignore_ascii_case("false") => false,
                Some(v) => return Err(format!("invalid primary key flag '{}'", v)),
            });
        }
        segments.push(segment.to_string());
    }

    if let Some(name) = column_attr {
        if column.is_some() {
            return Err("column given both as `column` and inside `tag`".to_string());
        }
        if !is_identifier(name) {
            return Err(format!(
                "column override '{}' must be a plain SQL identifier",
                name
            ));
        }
        segments.push(format!("column:{}", name));
        column = Some(name.to_string());
    }

    if primary_key_attr {
        match primary_key {
            Some(false) => {
                return Err("`primary_key` conflicts with `primaryKey:false` in tag".to_string());
            }
            Some(true) => {}
            None => {
                segments.push("primaryKey".to_string());
                primary_key = Some(true);
            }
        }
    }

    Ok(FoldedTag {
        tag: (!segments.is_empty()).then(|| segments.join(";")),
        column,
        primary_key: primary_key.unwrap_or(false),
    })
}

/// Validate a parsed model definition, reporting every problem at once.
pub fn validate_model(model: &ModelDef) -> Result<(), Error> {
    let mut errors = Vec::new();

    if model.data_fields().next().is_none() {
        errors.push(Error::new(
            model.name.span(),
            "Model struct must have at least one non-skipped field",
        ));
    }
    validate_table_name(&model.table_name, model.name.span(), &mut errors);
    validate_no_duplicate_columns(model, &mut errors);

    for field in model.data_fields() {
        validate_type(field, &mut errors);
    }
    for field in model.fields.iter().filter(|f| f.skip && f.primary_key) {
        errors.push(Error::new(
            field.name.span(),
            "a skipped field cannot be the primary key; remove `skip` or the primary key marker",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let mut combined = errors.remove(0);
        for err in errors {
            combined.combine(err);
        }
        Err(combined)
    }
}

fn validate_table_name(table_name: &str, span: Span, errors: &mut Vec<Error>) {
    if !is_identifier(table_name) {
        errors.push(Error::new(
            span,
            format!(
                "table name '{table_name}' must start with a letter or underscore \
                 and contain only alphanumeric characters and underscores"
            ),
        ));
    }
}

/// Columns are compared case-insensitively, as SQL does.
fn validate_no_duplicate_columns(model: &ModelDef, errors: &mut Vec<Error>) {
    let mut seen: HashMap<String, &FieldDef> = HashMap::new();

    for field in model.data_fields() {
        let key = field.column_name.to_ascii_lowercase();
        if let Some(other) = seen.get(&key) {
            errors.push(Error::new(
                field.name.span(),
                format!(
                    "duplicate column name '{}'; field `{}` already maps to this column",
                    field.column_name, other.name
                ),
            ));
        } else {
            seen.insert(key, field);
        }
    }
}

fn validate_type(field: &FieldDef, errors: &mut Vec<Error>) {
    let span = field.name.span();
    match &field.ty {
        Type::Reference(_) => errors.push(Error::new(
            span,
            "reference types (&T) are not supported; use owned types instead",
        )),
        Type::Ptr(_) => errors.push(Error::new(
            span,
            "raw pointer types are not supported; use owned types instead",
        )),
        ty if is_nested_option(ty) => errors.push(Error::new(
            span,
            "nested Option<Option<T>> is ambiguous and not supported",
        )),
        _ => {}
    }
}

fn is_nested_option(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    let Some(segment) = type_path.path.segments.last() else {
        return false;
    };
    if segment.ident != "Option" {
        return false;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return false;
    };
    matches!(
        args.args.first(),
        Some(GenericArgument::Type(Type::Path(inner)))
            if inner.path.segments.last().is_some_and(|s| s.ident == "Option")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_model;
    use syn::{DeriveInput, parse_quote};

    #[test]
    fn test_fold_tag_combinations() {
        let folded = fold_tag(Some("size:64; not null"), Some("user_name"), true).unwrap();
        assert_eq!(
            folded.tag.as_deref(),
            Some("size:64;not null;column:user_name;primaryKey")
        );
        assert_eq!(folded.column.as_deref(), Some("user_name"));
        assert!(folded.primary_key);

        let plain = fold_tag(None, None, false).unwrap();
        assert_eq!(
            plain,
            FoldedTag {
                tag: None,
                column: None,
                primary_key: false
            }
        );

        let tagged = fold_tag(Some("PRIMARY_KEY:TRUE"), None, true).unwrap();
        assert_eq!(tagged.tag.as_deref(), Some("PRIMARY_KEY:TRUE"));
        assert!(tagged.primary_key);
    }

    #[test]
    fn test_fold_tag_errors() {
        assert!(fold_tag(Some("column:"), None, false).is_err());
        assert!(fold_tag(Some("column:bad name"), None, false).is_err());
        assert!(fold_tag(None, Some("9lives"), false).is_err());
        assert!(fold_tag(Some("primaryKey:false"), None, true).is_err());
        assert!(fold_tag(Some("primaryKey:sometimes"), None, false).is_err());
    }

    #[test]
    fn test_is_nested_option() {
        let ty: Type = parse_quote!(Option<Option<i32>>);
        assert!(is_nested_option(&ty));
        let ty: Type = parse_quote!(Option<i32>);
        assert!(!is_nested_option(&ty));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let input: DeriveInput = parse_quote! {
            struct User {
                id: i64,
                #[adminorm(column = "ID")]
                legacy_id: i64,
            }
        };
        let model = parse_model(&input).unwrap();
        assert!(validate_model(&model).is_err());
    }

    #[test]
    fn test_valid_model_passes() {
        let input: DeriveInput = parse_quote! {
            #[adminorm(table = "users")]
            struct User {
                #[adminorm(tag = "column:user_id;primaryKey")]
                id: i64,
                name: Option<String>,
                #[adminorm(skip)]
                scratch: &'static str,
            }
        };
        let model = parse_model(&input).unwrap();
        assert!(validate_model(&model).is_ok());
    }

    #[test]
    fn test_skipped_primary_key_rejected() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[adminorm(primary_key, skip)]
                id: i64,
                name: String,
            }
        };
        let model = parse_model(&input).unwrap();
        assert!(validate_model(&model).is_err());

        let tagged: DeriveInput = parse_quote! {
            struct User {
                #[adminorm(tag = "column:id;primaryKey", skip)]
                id: i64,
                name: String,
            }
        };
        let model = parse_model(&tagged).unwrap();
        assert!(validate_model(&model).is_err());
    }

    #[test]
    fn test_bad_table_and_reference_field() {
        let input: DeriveInput = parse_quote! {
            #[adminorm(table = "user accounts")]
            struct User {
                id: i64,
                name: &'static str,
            }
        };
        let model = parse_model(&input).unwrap();
        assert!(validate_model(&model).is_err());
    }
}
