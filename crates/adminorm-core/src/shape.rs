//! Accepted input shapes for a model value.
//!
//! Admin panels hand models around as plain references, boxed or shared
//! pointers, optional references, or fully type-erased values. Each of these
//! resolves to `&M` or fails with `InvalidModelShape`.

use std::any::Any;
use std::sync::Arc;

use crate::Result;
use crate::error::Error;
use crate::model::Model;

/// Something that may resolve to a model value of type `M`.
pub trait ModelShape<M: Model> {
    #[allow(clippy::result_large_err)]
    fn resolve_model(&self) -> Result<&M>;
}

impl<M: Model> ModelShape<M> for &M {
    fn resolve_model(&self) -> Result<&M> {
        Ok(*self)
    }
}

impl<M: Model> ModelShape<M> for &Box<M> {
    fn resolve_model(&self) -> Result<&M> {
        Ok(&***self)
    }
}

impl<M: Model> ModelShape<M> for &Arc<M> {
    fn resolve_model(&self) -> Result<&M> {
        Ok(&***self)
    }
}

impl<M: Model> ModelShape<M> for Option<&M> {
    fn resolve_model(&self) -> Result<&M> {
        self.ok_or_else(|| {
            Error::InvalidModelShape(format!("expected a {} value, got None", M::model_name()))
        })
    }
}

/// A type-erased model value.
///
/// Resolves when the erased value is an `M`, a `Box<M>` or an `Arc<M>`.
#[derive(Clone, Copy)]
pub struct AnyModel<'a>(pub &'a dyn Any);

impl<'a> AnyModel<'a> {
    pub fn new<T: Any>(value: &'a T) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for AnyModel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyModel").field(&self.0.type_id()).finish()
    }
}

impl<M: Model> ModelShape<M> for AnyModel<'_> {
    fn resolve_model(&self) -> Result<&M> {
        if let Some(model) = self.0.downcast_ref::<M>() {
            return Ok(model);
        }
        if let Some(boxed) = self.0.downcast_ref::<Box<M>>() {
            return Ok(&**boxed);
        }
        if let Some(shared) = self.0.downcast_ref::<Arc<M>>() {
            return Ok(&**shared);
        }
        Err(Error::InvalidModelShape(format!(
            "value is not a {} (nor a pointer to one)",
            M::model_name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldInfo;
    use crate::row::Row;
    use crate::value::Value;

    #[derive(Debug, PartialEq)]
    struct Note(i64);

    impl Model for Note {
        const TABLE_NAME: &'static str = "notes";
        fn fields() -> &'static [FieldInfo] {
            &[]
        }
        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![("id", Value::BigInt(self.0))]
        }
        fn from_row(row: &Row) -> Result<Self> {
            Ok(Note(row.get_or_default("id")?))
        }
    }

    fn id_of<S: ModelShape<Note>>(shape: S) -> Result<i64> {
        shape.resolve_model().map(|n| n.0)
    }

    #[test]
    fn pointers_resolve() {
        let note = Note(1);
        let boxed = Box::new(Note(2));
        let shared = Arc::new(Note(3));
        assert_eq!(id_of(&note).unwrap(), 1);
        assert_eq!(id_of(&boxed).unwrap(), 2);
        assert_eq!(id_of(&shared).unwrap(), 3);
        assert_eq!(id_of(Some(&note)).unwrap(), 1);
    }

    #[test]
    fn none_is_invalid_shape() {
        assert!(matches!(
            id_of(None::<&Note>),
            Err(Error::InvalidModelShape(_))
        ));
    }

    #[test]
    fn erased_values() {
        let note = Note(4);
        let boxed: Box<Note> = Box::new(Note(5));
        assert_eq!(id_of(AnyModel::new(&note)).unwrap(), 4);
        assert_eq!(id_of(AnyModel::new(&boxed)).unwrap(), 5);

        let not_a_model = String::from("nope");
        assert!(matches!(
            id_of(AnyModel::new(&not_a_model)),
            Err(Error::InvalidModelShape(_))
        ));
    }
}
