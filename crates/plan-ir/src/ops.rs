//! Typed views over operations.
//!
//! A dialect wraps `&Operation` in a zero-cost newtype per kind (declared
//! with [`dialect_op!`]) and adds accessors on top of the helpers here.

use crate::error::ConversionError;
use crate::ir::{Operation, Region};
use crate::symbol::{QualifiedName, Symbol};
use crate::types::{Attribute, DataType};

/// Trait for dialect operation wrappers.
pub trait DialectOp<'a>: Sized + Copy {
    const DIALECT_NAME: &'static str;
    const OP_NAME: &'static str;
    /// `dialect.name`, for diagnostics.
    const FULL_NAME: &'static str;

    /// Try to wrap an operation as this dialect op type.
    fn from_op(op: &'a Operation) -> Result<Self, ConversionError>;

    /// Get the underlying operation.
    fn as_op(&self) -> &'a Operation;

    fn kind() -> QualifiedName {
        QualifiedName::from_static(Self::DIALECT_NAME, Self::OP_NAME)
    }

    fn matches(op: &Operation) -> bool {
        op.kind() == Self::kind()
    }

    fn required_attr(&self, key: &'static str) -> Result<&'a Attribute, ConversionError> {
        self.as_op()
            .attr(Symbol::new(key))
            .ok_or(ConversionError::MissingAttribute(key))
    }

    fn str_attr(&self, key: &'static str) -> Result<&'a str, ConversionError> {
        self.required_attr(key)?
            .as_str()
            .ok_or(ConversionError::WrongAttributeType(key))
    }

    fn type_attr(&self, key: &'static str) -> Result<&'a DataType, ConversionError> {
        self.required_attr(key)?
            .as_type()
            .ok_or(ConversionError::WrongAttributeType(key))
    }

    fn region_at(&self, index: usize, name: &'static str) -> Result<&'a Region, ConversionError> {
        self.as_op()
            .region(index)
            .ok_or(ConversionError::MissingRegion(name))
    }
}

/// Check that `op` has the kind `T` wraps.
pub fn ensure_kind<'a, T: DialectOp<'a>>(op: &Operation) -> Result<(), ConversionError> {
    if T::matches(op) {
        Ok(())
    } else {
        Err(ConversionError::WrongOperation {
            expected: T::FULL_NAME,
            actual: op.kind().to_string(),
        })
    }
}

/// Declare a typed wrapper for one operation kind.
///
/// # Syntax
/// ```
/// use plan_ir::{DialectOp, dialect_op};
///
/// dialect_op! {
///     /// A column reference.
///     pub struct Column = rel_alg.column;
/// }
///
/// assert_eq!(Column::kind().to_string(), "rel_alg.column");
/// ```
#[macro_export]
macro_rules! dialect_op {
    ($($(#[$meta:meta])* $vis:vis struct $name:ident = $dialect:ident . $op:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            $vis struct $name<'a>(&'a $crate::Operation);

            impl<'a> $crate::DialectOp<'a> for $name<'a> {
                const DIALECT_NAME: &'static str = stringify!($dialect);
                const OP_NAME: &'static str = stringify!($op);
                const FULL_NAME: &'static str = concat!(stringify!($dialect), ".", stringify!($op));

                fn from_op(op: &'a $crate::Operation) -> Result<Self, $crate::ConversionError> {
                    $crate::ops::ensure_kind::<Self>(op)?;
                    Ok(Self(op))
                }

                fn as_op(&self) -> &'a $crate::Operation {
                    self.0
                }
            }

            impl std::ops::Deref for $name<'_> {
                type Target = $crate::Operation;

                fn deref(&self) -> &Self::Target {
                    self.0
                }
            }
        )*
    };
}
