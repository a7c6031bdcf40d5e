//! Data types, attributes and type schemas.
//!
//! A [`DataType`] is a tag identifying a scalar kind (`!rel_alg.int32`,
//! `!rel_alg.string<nullable: 0>`). The set of tags is open: every dialect
//! registers its own [`TypeSchema`]s in a [`crate::Context`], and a tag's
//! parameters are fixed when it is instantiated.
//!
//! [`RawParam`] is the ergonomic input side of type construction. It is
//! normalized into canonical [`Attribute`]s by [`TypeSchema::instantiate`],
//! which is the only place where loosely-shaped values are accepted.

use std::fmt;
use std::ops::RangeInclusive;

use smallvec::SmallVec;

use crate::error::{IrError, IrResult};
use crate::symbol::{QualifiedName, Symbol};

// ============================================================================
// Attribute
// ============================================================================

/// Immutable attribute value attached to an operation or a type parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Signed integer constant with an explicit bit width (`5 : !i64`).
    Integer { value: i64, width: u32 },
    String(String),
    Type(DataType),
    Array(Vec<Attribute>),
}

impl Attribute {
    /// Short description of the attribute's shape, used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Attribute::Integer { width, .. } => format!("i{width} integer"),
            Attribute::String(_) => "string".to_owned(),
            Attribute::Type(ty) => format!("type {ty}"),
            Attribute::Array(_) => "array".to_owned(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attribute::Integer { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&DataType> {
        match self {
            Attribute::Type(ty) => Some(ty),
            _ => None,
        }
    }
}

impl From<i64> for Attribute {
    fn from(value: i64) -> Self {
        Attribute::Integer { value, width: 64 }
    }
}

impl From<i32> for Attribute {
    fn from(value: i32) -> Self {
        Attribute::Integer {
            value: value.into(),
            width: 32,
        }
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Attribute::Integer {
            value: value.into(),
            width: 1,
        }
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Attribute::String(value)
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::String(value.to_owned())
    }
}

impl From<DataType> for Attribute {
    fn from(value: DataType) -> Self {
        Attribute::Type(value)
    }
}

impl From<Vec<Attribute>> for Attribute {
    fn from(value: Vec<Attribute>) -> Self {
        Attribute::Array(value)
    }
}

// ============================================================================
// DataType
// ============================================================================

/// A registered scalar type tag with its (immutable) parameters.
///
/// Only [`TypeSchema::instantiate`] creates values, so the parameter list
/// always follows the schema's declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DataType {
    name: QualifiedName,
    params: Vec<(Symbol, Attribute)>,
}

impl DataType {
    pub fn name(&self) -> QualifiedName {
        self.name
    }

    pub fn is(&self, name: QualifiedName) -> bool {
        self.name == name
    }

    pub fn params(&self) -> &[(Symbol, Attribute)] {
        &self.params
    }

    pub fn param(&self, key: impl Into<Symbol>) -> Option<&Attribute> {
        let key = key.into();
        self.params.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

// ============================================================================
// RawParam
// ============================================================================

/// A loosely-shaped type parameter value, prior to normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum RawParam {
    Bool(bool),
    Int(i64),
    Str(String),
    Attr(Attribute),
}

impl From<bool> for RawParam {
    fn from(value: bool) -> Self {
        RawParam::Bool(value)
    }
}

impl From<i64> for RawParam {
    fn from(value: i64) -> Self {
        RawParam::Int(value)
    }
}

impl From<i32> for RawParam {
    fn from(value: i32) -> Self {
        RawParam::Int(value.into())
    }
}

impl From<&str> for RawParam {
    fn from(value: &str) -> Self {
        RawParam::Str(value.to_owned())
    }
}

impl From<String> for RawParam {
    fn from(value: String) -> Self {
        RawParam::Str(value)
    }
}

impl From<Attribute> for RawParam {
    fn from(value: Attribute) -> Self {
        RawParam::Attr(value)
    }
}

impl From<DataType> for RawParam {
    fn from(value: DataType) -> Self {
        RawParam::Attr(Attribute::Type(value))
    }
}

impl fmt::Display for RawParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawParam::Bool(b) => write!(f, "bool {b}"),
            RawParam::Int(v) => write!(f, "integer {v}"),
            RawParam::Str(s) => write!(f, "string {s:?}"),
            RawParam::Attr(attr) => f.write_str(&attr.describe()),
        }
    }
}

// ============================================================================
// TypeSchema
// ============================================================================

/// Declared shape of a type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Boolean flag, stored as an `i1` integer holding 0 or 1.
    Bool,
    /// Integer of the given bit width.
    Int(u32),
    Str,
    Type,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Bool => f.write_str("boolean i1 integer"),
            ParamKind::Int(width) => write!(f, "i{width} integer"),
            ParamKind::Str => f.write_str("string"),
            ParamKind::Type => f.write_str("type"),
        }
    }
}

/// Integer widths the text form can spell, `!i1` through `!i64`.
pub(crate) const INTEGER_WIDTHS: RangeInclusive<u32> = 1..=64;

fn fits_width(value: i64, width: u32) -> bool {
    match width {
        0 => value == 0,
        // Accept both the signed and the unsigned reading of `width` bits.
        1..=64 => {
            let value = i128::from(value);
            (-(1i128 << (width - 1))..(1i128 << width)).contains(&value)
        }
        _ => true,
    }
}

/// An integer attribute with a printable width and a value that fits it.
pub(crate) fn is_valid_integer(value: i64, width: u32) -> bool {
    INTEGER_WIDTHS.contains(&width) && fits_width(value, width)
}

impl ParamKind {
    /// Normalize a raw value into the canonical attribute for this kind.
    fn normalize(self, subject: &dyn fmt::Display, raw: RawParam) -> IrResult<Attribute> {
        let mismatch = |raw: &RawParam| IrError::type_mismatch(subject, self, raw);
        match (self, raw) {
            (ParamKind::Bool, RawParam::Bool(b)) => Ok(b.into()),
            (ParamKind::Bool, RawParam::Int(v @ (0 | 1))) => Ok(Attribute::Integer {
                value: v,
                width: 1,
            }),
            (
                ParamKind::Bool,
                RawParam::Attr(attr @ Attribute::Integer {
                    value: 0 | 1,
                    width: 1,
                }),
            ) => Ok(attr),
            (ParamKind::Int(width), RawParam::Int(value)) if fits_width(value, width) => {
                Ok(Attribute::Integer { value, width })
            }
            (ParamKind::Int(w), RawParam::Attr(attr @ Attribute::Integer { value, width }))
                if width == w && fits_width(value, w) =>
            {
                Ok(attr)
            }
            (ParamKind::Str, RawParam::Str(s)) => Ok(Attribute::String(s)),
            (ParamKind::Str, RawParam::Attr(attr @ Attribute::String(_))) => Ok(attr),
            (ParamKind::Type, RawParam::Attr(attr @ Attribute::Type(_))) => Ok(attr),
            (_, raw) => Err(mismatch(&raw)),
        }
    }
}

/// Registered schema of a type tag: its name and ordered parameter slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSchema {
    name: QualifiedName,
    params: SmallVec<[(Symbol, ParamKind); 2]>,
}

impl TypeSchema {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            params: SmallVec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<Symbol>, kind: ParamKind) -> Self {
        self.params.push((key.into(), kind));
        self
    }

    pub fn name(&self) -> QualifiedName {
        self.name
    }

    pub fn params(&self) -> &[(Symbol, ParamKind)] {
        &self.params
    }

    pub fn param_kind(&self, key: Symbol) -> Option<ParamKind> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, kind)| *kind)
    }

    /// Validate raw parameters and build the canonical [`DataType`].
    pub fn instantiate<K: Into<Symbol>>(
        &self,
        raw: impl IntoIterator<Item = (K, RawParam)>,
    ) -> IrResult<DataType> {
        let owner = format!("!{}", self.name);
        let mut supplied: SmallVec<[Option<RawParam>; 2]> =
            self.params.iter().map(|_| None).collect();

        for (key, value) in raw {
            let key = key.into();
            let slot = self
                .params
                .iter()
                .position(|(k, _)| *k == key)
                .ok_or_else(|| IrError::unexpected_attribute(&owner, key))?;
            if supplied[slot].replace(value).is_some() {
                return Err(IrError::unexpected_attribute(&owner, key));
            }
        }

        let mut params = Vec::with_capacity(self.params.len());
        for ((key, kind), value) in self.params.iter().zip(supplied) {
            let value = value.ok_or_else(|| IrError::missing_attribute(&owner, key))?;
            let subject = format!("parameter `{key}` of {owner}");
            params.push((*key, kind.normalize(&subject, value)?));
        }

        Ok(DataType {
            name: self.name,
            params,
        })
    }

    /// Re-check an existing type value against this schema.
    pub fn check(&self, ty: &DataType) -> IrResult<()> {
        if ty.name != self.name {
            return Err(IrError::type_mismatch(
                "type tag",
                format!("!{}", self.name),
                ty,
            ));
        }
        let rebuilt = self.instantiate(
            ty.params
                .iter()
                .map(|(k, v)| (*k, RawParam::Attr(v.clone()))),
        )?;
        if rebuilt != *ty {
            return Err(IrError::type_mismatch("type", &rebuilt, ty));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IrErrorKind;

    fn string_schema() -> TypeSchema {
        TypeSchema::new(QualifiedName::from_static("test", "string"))
            .param("nullable", ParamKind::Bool)
    }

    #[test]
    fn bool_param_accepts_every_raw_shape() {
        let schema = string_schema();
        let expected = Attribute::Integer { value: 1, width: 1 };
        for raw in [
            RawParam::Bool(true),
            RawParam::Int(1),
            RawParam::Attr(Attribute::Integer { value: 1, width: 1 }),
        ] {
            let ty = schema.instantiate([("nullable", raw)]).unwrap();
            assert_eq!(ty.param("nullable"), Some(&expected));
        }
    }

    #[test]
    fn bool_param_rejects_other_shapes() {
        let schema = string_schema();
        for raw in [
            RawParam::Int(2),
            RawParam::Str("yes".into()),
            RawParam::Attr(Attribute::Integer { value: 1, width: 64 }),
        ] {
            let err = schema.instantiate([("nullable", raw)]).unwrap_err();
            assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }), "{err}");
        }
    }

    #[test]
    fn missing_and_unexpected_params() {
        let schema = string_schema();
        let err = schema
            .instantiate(std::iter::empty::<(Symbol, RawParam)>())
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::MissingAttribute { .. }));

        let err = schema
            .instantiate([("nullable", RawParam::Bool(false)), ("width", RawParam::Int(3))])
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::UnexpectedAttribute { .. }));

        let err = schema
            .instantiate([("nullable", RawParam::Bool(false)), ("nullable", RawParam::Bool(true))])
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::UnexpectedAttribute { .. }));
    }

    #[test]
    fn int_param_checks_width() {
        let schema = TypeSchema::new(QualifiedName::from_static("test", "decimal"))
            .param("precision", ParamKind::Int(8));
        assert!(schema.instantiate([("precision", RawParam::Int(38))]).is_ok());
        assert!(schema.instantiate([("precision", RawParam::Int(4096))]).is_err());

        let from_attr = RawParam::Attr(Attribute::Integer {
            value: 4096,
            width: 8,
        });
        let err = schema.instantiate([("precision", from_attr)]).unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }), "{err}");
    }

    #[test]
    fn width_limits_hold_at_the_top_of_the_range() {
        assert!(fits_width(i64::MIN, 64));
        assert!(fits_width(-(1i64 << 62), 63));
        assert!(fits_width(i64::MAX, 63));
        assert!(!fits_width(i64::MIN, 63));
        assert!(!fits_width(-(1i64 << 62) - 1, 63));
        assert!(!is_valid_integer(5, 0));
        assert!(!is_valid_integer(5, 128));
        assert!(!is_valid_integer(2, 1));
        assert!(is_valid_integer(-1, 1));
    }

    #[test]
    fn check_round_trips_instantiated_type() {
        let schema = string_schema();
        let ty = schema.instantiate([("nullable", RawParam::Bool(false))]).unwrap();
        assert!(schema.check(&ty).is_ok());
    }
}
