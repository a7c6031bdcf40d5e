//! Operations of the `rel_alg` dialect.
//!
//! Expressions (`literal`, `column`, `compare`) only contain expressions.
//! Operators (`select`, `pandas_table`, `schema_element`) may contain both.
//! There is no operand wiring: data flows through region nesting, so
//! `select`'s input region is the evaluation context of its predicates.

use plan_ir::{
    AttrConstraint, Attribute, ConversionError, Context, DataType, Dialect, DialectOp, IrResult,
    OpSchema, Operation, OperationState, Region, RegionSlot, Symbol, TypeConstraint, dialect_op,
};

use crate::{RelAlg, expression, operator};

// Attribute keys, shared by schemas, constructors and accessors.
const ATTR_VAL: &str = "val";
const ATTR_TYPE: &str = "type";
const ATTR_COL_NAME: &str = "col_name";
const ATTR_COMPARATOR: &str = "comparator";
const ATTR_TABLE_NAME: &str = "table_name";
const ATTR_ELT_NAME: &str = "elt_name";
const ATTR_ELT_TYPE: &str = "elt_type";

dialect_op! {
    /// A constant `val` of column type `type`.
    pub struct Literal = rel_alg.literal;
    /// A reference to the column `col_name` of the enclosing input.
    pub struct Column = rel_alg.column;
    /// `left comparator right`.
    pub struct Compare = rel_alg.compare;
    /// The tuples of `input` that satisfy `predicates`.
    pub struct Select = rel_alg.select;
    /// A named table whose schema region lists its columns in order.
    pub struct PandasTable = rel_alg.pandas_table;
    /// One column of a table schema.
    pub struct SchemaElement = rel_alg.schema_element;
}

/// Schemas of every `rel_alg` operation, in registration order.
pub fn schemas() -> Vec<OpSchema> {
    // Column types are limited to the dialect's own tags.
    let data_type = || AttrConstraint::Type(TypeConstraint::Dialect(Symbol::new(RelAlg::NAME)));
    vec![
        OpSchema::new(PandasTable::kind())
            .category(operator())
            .attr(ATTR_TABLE_NAME, AttrConstraint::String)
            .region(RegionSlot::multi("schema").ops([SchemaElement::kind()])),
        OpSchema::new(SchemaElement::kind())
            .category(operator())
            .attr(ATTR_ELT_NAME, AttrConstraint::String)
            .attr(ATTR_ELT_TYPE, data_type()),
        OpSchema::new(Select::kind())
            .category(operator())
            .region(RegionSlot::single("input").categories([operator()]))
            .region(RegionSlot::single("predicates").categories([expression()])),
        OpSchema::new(Literal::kind())
            .category(expression())
            .attr(ATTR_VAL, AttrConstraint::Any)
            .attr(ATTR_TYPE, data_type()),
        OpSchema::new(Column::kind())
            .category(expression())
            .attr(ATTR_COL_NAME, AttrConstraint::String),
        OpSchema::new(Compare::kind())
            .category(expression())
            .attr(ATTR_COMPARATOR, AttrConstraint::String)
            .region(RegionSlot::single("left").categories([expression()]))
            .region(RegionSlot::single("right").categories([expression()])),
    ]
}

// ============================================================================
// Expressions
// ============================================================================

impl<'a> Literal<'a> {
    pub fn get(ctx: &Context, val: impl Into<Attribute>, ty: DataType) -> IrResult<Operation> {
        ctx.build(
            OperationState::new(Self::kind())
                .attr(ATTR_VAL, val)
                .attr(ATTR_TYPE, ty),
        )
    }

    pub fn val(&self) -> Result<&'a Attribute, ConversionError> {
        self.required_attr(ATTR_VAL)
    }

    pub fn ty(&self) -> Result<&'a DataType, ConversionError> {
        self.type_attr(ATTR_TYPE)
    }
}

impl<'a> Column<'a> {
    pub fn get(ctx: &Context, col_name: &str) -> IrResult<Operation> {
        ctx.build(OperationState::new(Self::kind()).attr(ATTR_COL_NAME, col_name))
    }

    pub fn col_name(&self) -> Result<&'a str, ConversionError> {
        self.str_attr(ATTR_COL_NAME)
    }
}

impl<'a> Compare<'a> {
    pub fn get(
        ctx: &Context,
        comparator: &str,
        left: impl Into<Region>,
        right: impl Into<Region>,
    ) -> IrResult<Operation> {
        ctx.build(
            OperationState::new(Self::kind())
                .attr(ATTR_COMPARATOR, comparator)
                .region(left.into())
                .region(right.into()),
        )
    }

    pub fn comparator(&self) -> Result<&'a str, ConversionError> {
        self.str_attr(ATTR_COMPARATOR)
    }

    pub fn left(&self) -> Result<&'a Region, ConversionError> {
        self.region_at(0, "left")
    }

    pub fn right(&self) -> Result<&'a Region, ConversionError> {
        self.region_at(1, "right")
    }
}

// ============================================================================
// Operators
// ============================================================================

impl<'a> Select<'a> {
    pub fn get(
        ctx: &Context,
        input: impl Into<Region>,
        predicates: impl Into<Region>,
    ) -> IrResult<Operation> {
        ctx.build(
            OperationState::new(Self::kind())
                .region(input.into())
                .region(predicates.into()),
        )
    }

    pub fn input(&self) -> Result<&'a Region, ConversionError> {
        self.region_at(0, "input")
    }

    pub fn predicates(&self) -> Result<&'a Region, ConversionError> {
        self.region_at(1, "predicates")
    }
}

impl<'a> PandasTable<'a> {
    pub fn get(ctx: &Context, table_name: &str, schema: impl Into<Region>) -> IrResult<Operation> {
        ctx.build(
            OperationState::new(Self::kind())
                .attr(ATTR_TABLE_NAME, table_name)
                .region(schema.into()),
        )
    }

    pub fn table_name(&self) -> Result<&'a str, ConversionError> {
        self.str_attr(ATTR_TABLE_NAME)
    }

    pub fn schema(&self) -> Result<&'a Region, ConversionError> {
        self.region_at(0, "schema")
    }

    /// Schema elements across all blocks of the schema region, in order.
    pub fn columns(&self) -> Result<Vec<SchemaElement<'a>>, ConversionError> {
        self.schema()?.ops().map(SchemaElement::from_op).collect()
    }
}

impl<'a> SchemaElement<'a> {
    pub fn get(ctx: &Context, elt_name: &str, elt_type: DataType) -> IrResult<Operation> {
        ctx.build(
            OperationState::new(Self::kind())
                .attr(ATTR_ELT_NAME, elt_name)
                .attr(ATTR_ELT_TYPE, elt_type),
        )
    }

    pub fn elt_name(&self) -> Result<&'a str, ConversionError> {
        self.str_attr(ATTR_ELT_NAME)
    }

    pub fn elt_type(&self) -> Result<&'a DataType, ConversionError> {
        self.type_attr(ATTR_ELT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Int32, String as StringType};
    use plan_ir::{Block, IrErrorKind, QualifiedName, RawParam, TypeSchema, parse_op, print_op};

    fn ctx() -> Context {
        let mut ctx = Context::new();
        ctx.load_dialect::<RelAlg>().unwrap();
        ctx
    }

    #[test]
    fn literal_introspection() {
        let ctx = ctx();
        let int32 = Int32::get(&ctx).unwrap();
        let op = Literal::get(&ctx, 5i64, int32.clone()).unwrap();
        let lit = Literal::from_op(&op).unwrap();
        assert_eq!(lit.val().unwrap(), &Attribute::from(5i64));
        assert_eq!(lit.ty().unwrap(), &int32);
        assert!(lit.regions().is_empty());
    }

    #[test]
    fn wrong_wrapper_is_rejected() {
        let ctx = ctx();
        let op = Column::get(&ctx, "a").unwrap();
        let err = Literal::from_op(&op).unwrap_err();
        assert_eq!(
            err,
            ConversionError::WrongOperation {
                expected: "rel_alg.literal",
                actual: "rel_alg.column".to_owned(),
            }
        );
    }

    #[test]
    fn compare_regions_are_single_expressions() {
        let ctx = ctx();
        let int32 = Int32::get(&ctx).unwrap();
        let op = Compare::get(
            &ctx,
            "=",
            Column::get(&ctx, "a").unwrap(),
            Literal::get(&ctx, 5i64, int32).unwrap(),
        )
        .unwrap();
        let cmp = Compare::from_op(&op).unwrap();
        assert_eq!(cmp.comparator().unwrap(), "=");
        let left = cmp.left().unwrap().single_block().unwrap();
        assert_eq!(left.len(), 1);
        let col = Column::from_op(&left.ops()[0]).unwrap();
        assert_eq!(col.col_name().unwrap(), "a");
    }

    #[test]
    fn expression_may_not_hold_operator() {
        let ctx = ctx();
        let table = PandasTable::get(&ctx, "t", Region::empty()).unwrap();
        let err = Compare::get(&ctx, "=", table, Column::get(&ctx, "a").unwrap()).unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::StructuralViolation { .. }));
    }

    #[test]
    fn select_input_rejects_expression() {
        let ctx = ctx();
        let err = Select::get(
            &ctx,
            Column::get(&ctx, "a").unwrap(),
            Column::get(&ctx, "b").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::StructuralViolation { .. }));
    }

    #[test]
    fn pandas_table_schema_spans_blocks() {
        let ctx = ctx();
        let int32 = Int32::get(&ctx).unwrap();
        let text = StringType::get(&ctx, false).unwrap();
        let schema = Region::new([
            Block::new([SchemaElement::get(&ctx, "id", int32).unwrap()]),
            Block::new([SchemaElement::get(&ctx, "name", text).unwrap()]),
        ]);
        let op = PandasTable::get(&ctx, "people", schema).unwrap();
        let table = PandasTable::from_op(&op).unwrap();
        let names: Vec<_> = table
            .columns()
            .unwrap()
            .iter()
            .map(|c| c.elt_name().unwrap())
            .collect();
        assert_eq!(names, ["id", "name"]);

        insta::assert_snapshot!(print_op(&op), @r#"
        rel_alg.pandas_table() ["table_name" = "people"] {
          ^bb0:
            rel_alg.schema_element() ["elt_name" = "id", "elt_type" = !rel_alg.int32]

          ^bb1:
            rel_alg.schema_element() ["elt_name" = "name", "elt_type" = !rel_alg.string<nullable: 0>]
        }
        "#);
    }

    #[test]
    fn pandas_table_schema_only_holds_schema_elements() {
        let ctx = ctx();
        let inner = PandasTable::get(&ctx, "inner", Region::empty()).unwrap();
        let err = PandasTable::get(&ctx, "outer", inner).unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::StructuralViolation { .. }));
    }

    #[test]
    fn literal_value_needs_a_printable_width() {
        let ctx = ctx();
        let int32 = Int32::get(&ctx).unwrap();
        for width in [0, 65, 128] {
            let wide = Attribute::Integer { value: 5, width };
            let err = Literal::get(&ctx, wide, int32.clone()).unwrap_err();
            assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }), "{err}");
        }
        let err = Literal::get(&ctx, Attribute::Integer { value: 300, width: 8 }, int32.clone())
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }), "{err}");

        let op = Literal::get(&ctx, Attribute::Integer { value: -128, width: 8 }, int32).unwrap();
        let text = print_op(&op);
        assert_eq!(
            text,
            "rel_alg.literal() [\"val\" = -128 : !i8, \"type\" = !rel_alg.int32]\n"
        );
        assert_eq!(parse_op(&ctx, &text).unwrap(), op);
    }

    #[test]
    fn column_types_come_from_this_dialect() {
        let mut ctx = ctx();
        let foreign = QualifiedName::from_static("other", "int32");
        ctx.register_type(TypeSchema::new(foreign)).unwrap();
        let ty = ctx
            .make_type(foreign, std::iter::empty::<(Symbol, RawParam)>())
            .unwrap();

        let err = Literal::get(&ctx, 5i64, ty.clone()).unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }), "{err}");
        let err = SchemaElement::get(&ctx, "id", ty).unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }), "{err}");
    }
}
