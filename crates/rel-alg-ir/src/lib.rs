//! Relational algebra dialect (`rel_alg`).
//!
//! Represents relational queries as trees. Apart from scalar data types the
//! dialect has two structural categories: expressions, whose subtrees only
//! hold expressions, and operators, whose subtrees may hold both.
//!
//! ```
//! use plan_ir::Context;
//! use rel_alg_ir::{Column, Compare, Literal, RelAlg, types::Int32};
//!
//! let mut ctx = Context::new();
//! ctx.load_dialect::<RelAlg>()?;
//!
//! let five = Literal::get(&ctx, 5i64, Int32::get(&ctx)?)?;
//! let cmp = Compare::get(&ctx, "=", Column::get(&ctx, "a")?, five)?;
//! assert_eq!(cmp.regions().len(), 2);
//! # Ok::<(), plan_ir::IrError>(())
//! ```

pub mod ops;
pub mod types;

use plan_ir::{CategoryRule, Context, Dialect, IrResult, QualifiedName};

pub use ops::{Column, Compare, Literal, PandasTable, SchemaElement, Select};

/// Expressions may only contain expressions.
pub fn expression() -> QualifiedName {
    QualifiedName::from_static("rel_alg", "expression")
}

/// Operators may contain operators and expressions.
pub fn operator() -> QualifiedName {
    QualifiedName::from_static("rel_alg", "operator")
}

/// Registration entry point: `ctx.load_dialect::<RelAlg>()`.
pub struct RelAlg;

impl Dialect for RelAlg {
    const NAME: &'static str = "rel_alg";

    fn register(ctx: &mut Context) -> IrResult<()> {
        ctx.register_type(types::Int32::schema())?;
        ctx.register_type(types::String::schema())?;

        ctx.register_category(CategoryRule::new(expression()).may_contain([expression()]))?;
        ctx.register_category(
            CategoryRule::new(operator()).may_contain([operator(), expression()]),
        )?;

        for schema in ops::schemas() {
            ctx.register_op(schema)?;
        }
        tracing::debug!("rel_alg dialect registered");
        Ok(())
    }
}
