//! A session: one [`Context`] with the `rel_alg` dialect loaded, plus the
//! operations the CLI runs against it.

use plan_ir::{
    Context, IrResult, Operation, QualifiedName, count_ops, parse_op, print_op, verify,
};
use rel_alg_ir::types::Int32;
use rel_alg_ir::{Column, Compare, Literal, PandasTable, RelAlg, SchemaElement, Select};

/// Create a context with every dialect this tool knows about.
pub fn standard_context() -> IrResult<Context> {
    let mut ctx = Context::new();
    ctx.load_dialect::<RelAlg>()?;
    Ok(ctx)
}

/// `SELECT * FROM t WHERE id = 5` over a table `t(id: int32)`.
pub fn demo_plan(ctx: &Context) -> IrResult<Operation> {
    let int32 = Int32::get(ctx)?;
    let table = PandasTable::get(ctx, "t", SchemaElement::get(ctx, "id", int32.clone())?)?;
    let predicate = Compare::get(
        ctx,
        "=",
        Column::get(ctx, "id")?,
        Literal::get(ctx, 5i64, int32)?,
    )?;
    Select::get(ctx, table, predicate)
}

/// Parse `text` and print it back in canonical form.
pub fn reprint(ctx: &Context, text: &str) -> IrResult<String> {
    let op = parse_op(ctx, text)?;
    Ok(print_op(&op))
}

/// Summary of a verified tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub root: QualifiedName,
    pub ops: usize,
}

/// Parse `text`, re-verify the whole tree and count its operations.
pub fn check(ctx: &Context, text: &str) -> IrResult<CheckReport> {
    let op = parse_op(ctx, text)?;
    verify(ctx, &op)?;
    let report = CheckReport {
        root: op.kind(),
        ops: count_ops(&op),
    };
    tracing::debug!(root = %report.root, ops = report.ops, "checked plan");
    Ok(report)
}
