//! Scalar type tags of the `rel_alg` dialect.
//!
//! ```text
//! !rel_alg.int32
//! !rel_alg.string<nullable: 0>
//! ```

use plan_ir::{
    Attribute, Context, DataType, IrResult, ParamKind, QualifiedName, RawParam, Symbol,
    TypeSchema,
};

plan_ir::symbols! {
    PARAM_NULLABLE => "nullable",
}

/// 32-bit signed integer column type.
pub struct Int32;

impl Int32 {
    pub fn name() -> QualifiedName {
        QualifiedName::from_static("rel_alg", "int32")
    }

    pub fn schema() -> TypeSchema {
        TypeSchema::new(Self::name())
    }

    pub fn get(ctx: &Context) -> IrResult<DataType> {
        ctx.make_type(Self::name(), std::iter::empty::<(Symbol, RawParam)>())
    }

    pub fn is(ty: &DataType) -> bool {
        ty.is(Self::name())
    }
}

/// String column type, either nullable or not.
pub struct String;

impl String {
    pub fn name() -> QualifiedName {
        QualifiedName::from_static("rel_alg", "string")
    }

    pub fn schema() -> TypeSchema {
        TypeSchema::new(Self::name()).param(PARAM_NULLABLE(), ParamKind::Bool)
    }

    /// `nullable` accepts a `bool`, `0`/`1`, or an `i1` integer attribute.
    pub fn get(ctx: &Context, nullable: impl Into<RawParam>) -> IrResult<DataType> {
        ctx.make_type(Self::name(), [(PARAM_NULLABLE(), nullable.into())])
    }

    pub fn is(ty: &DataType) -> bool {
        ty.is(Self::name())
    }

    /// The `nullable` flag of a string type; `None` for any other type.
    pub fn nullable(ty: &DataType) -> Option<bool> {
        if !Self::is(ty) {
            return None;
        }
        match ty.param(PARAM_NULLABLE())? {
            Attribute::Integer { value, .. } => Some(*value != 0),
            _ => None,
        }
    }
}
